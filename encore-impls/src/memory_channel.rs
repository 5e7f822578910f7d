use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;

use encore_core::{party_topic, EventChannel, PartyId, PartyMessage, Subscription, TransportCommand};

/// An in-process pub/sub hub with one topic per party. Every subscriber on
/// a topic receives every message, including the publisher itself.
/// Subscribers that dropped their end are pruned on the next delivery.
#[derive(Default)]
pub struct MemoryChannel {
    topics: DashMap<String, Vec<UnboundedSender<PartyMessage>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribers currently attached to a party's topic.
    pub fn subscriber_count(&self, party_id: PartyId) -> usize {
        self.topics
            .get(&party_topic(party_id))
            .map(|senders| senders.len())
            .unwrap_or(0)
    }

    fn deliver(&self, party_id: PartyId, message: PartyMessage) {
        let Some(mut senders) = self.topics.get_mut(&party_topic(party_id)) else {
            return;
        };

        senders.retain(|sender| sender.send(message.clone()).is_ok());
    }
}

impl EventChannel for MemoryChannel {
    fn subscribe(&self, party_id: PartyId) -> Subscription {
        let (sender, subscription) = Subscription::channel();

        self.topics
            .entry(party_topic(party_id))
            .or_default()
            .push(sender);

        subscription
    }

    fn publish(&self, party_id: PartyId, command: TransportCommand) {
        self.deliver(party_id, PartyMessage::Broadcast(command));
    }

    fn notify_change(&self, party_id: PartyId) {
        self.deliver(party_id, PartyMessage::QueueChanged);
    }
}
