use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{PartyId, QueueEntry};

/// An ephemeral transport command relayed between clients. Delivered
/// at-most-once and never persisted; a dropped command leaves the display
/// stale until the next one arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportCommand {
    Play,
    Pause,
    /// Seek the current media back to its start.
    Rewind,
    /// Stop the current media and request deletion of the active entry.
    Skip,
    /// The controller chose the entry that should play. The payload is the
    /// literal entry.
    SetActive(QueueEntry),
}

/// A message delivered on a party's topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartyMessage {
    /// The queue table changed. The payload is deliberately empty;
    /// receivers re-fetch the authoritative order instead of trusting it.
    QueueChanged,
    Broadcast(TransportCommand),
}

/// Deterministic topic name for a party.
pub fn party_topic(party_id: PartyId) -> String {
    format!("party:{party_id}")
}

/// A live subscription to a party's topic. Dropping it unsubscribes.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<PartyMessage>,
}

impl Subscription {
    /// Pairs a new subscription with the sender half a channel
    /// implementation delivers into.
    pub fn channel() -> (mpsc::UnboundedSender<PartyMessage>, Subscription) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (sender, Subscription { receiver })
    }

    /// The next message, or `None` once the topic is gone.
    pub async fn recv(&mut self) -> Option<PartyMessage> {
        self.receiver.recv().await
    }
}

/// Per-party publish/subscribe fan-out. Exactly one topic exists per party,
/// named by [`party_topic`]. Every subscriber receives every message,
/// including the publisher itself.
pub trait EventChannel: Send + Sync + 'static {
    fn subscribe(&self, party_id: PartyId) -> Subscription;
    /// Fire-and-forget transport broadcast. Not retried.
    fn publish(&self, party_id: PartyId, command: TransportCommand);
    /// Fired by the store whenever the party's queue table mutates.
    fn notify_change(&self, party_id: PartyId);
}
