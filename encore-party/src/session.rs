use std::sync::Arc;

use log::{info, warn};
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use encore_core::{
    AlertSink, BoxedAlertSink, BoxedMediaOutput, EntryId, EventChannel, NullMedia, PartyData,
    PartyMessage, PerformerStatus, PlaybackController, PlaybackState, PositionAlert,
    PositionNotifier, QueueEntry, QueueModel, QueueStore, ReconciliationEngine, Subscription,
    Transition, TransportCommand,
};

use crate::{BoxedTitleResolver, NoembedResolver, PartyContext, SongSubmission, SubmitError};

/// Configuration for one connected client. Roles differ only in what they
/// plug in here; nothing is enforced about who may do what.
pub struct SessionConfig {
    /// The name this client submits under, enabling position tracking and
    /// nearness alerts.
    pub performer_name: Option<String>,
    /// The media surface this client drives, when it is the display.
    pub media: BoxedMediaOutput,
    /// Where nearness alerts go. Defaults into the session event stream.
    pub alerts: Option<BoxedAlertSink>,
    /// Title lookup used for submissions.
    pub resolver: BoxedTitleResolver,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            performer_name: None,
            media: Box::new(NullMedia),
            alerts: None,
            resolver: Box::new(NoembedResolver::new()),
        }
    }
}

impl SessionConfig {
    /// A controller or plain viewer.
    pub fn viewer() -> Self {
        Self::default()
    }

    /// A performer submitting under the given name.
    pub fn performer(name: impl Into<String>) -> Self {
        Self {
            performer_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// The public display, driving an actual media surface.
    pub fn display(media: BoxedMediaOutput) -> Self {
        Self {
            media,
            ..Default::default()
        }
    }
}

/// Events a session surfaces to its UI.
#[derive(Debug)]
pub enum SessionEvent {
    /// The local queue replica changed.
    QueueUpdated { entries: Vec<QueueEntry> },
    /// The transport state changed.
    PlaybackUpdated { state: PlaybackState },
    /// The local performer's standing in the queue moved.
    StatusChanged { status: PerformerStatus },
    /// The performer is about to go on.
    Alert { alert: PositionAlert },
}

pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

enum SessionAction {
    Submit {
        submission: SongSubmission,
        reply: oneshot::Sender<Result<QueueEntry, SubmitError>>,
    },
    Remove {
        entry_id: EntryId,
    },
    Reorder {
        from: usize,
        to: usize,
    },
    SetActive {
        entry_id: EntryId,
    },
    Transport {
        command: TransportCommand,
    },
    MediaEnded,
    Leave,
}

/// Forwards alerts into the session event stream when no dedicated sink
/// was configured.
struct EventAlertSink {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl AlertSink for EventAlertSink {
    fn raise(&self, alert: PositionAlert) {
        let _ = self.events.send(SessionEvent::Alert { alert });
    }
}

/// One connected client's half of the party: a single task that owns the
/// queue replica and the transport state, and serializes the effects of
/// channel deliveries and local actions. Clients on other machines are
/// peers; the only thing shared with them is the store and the topic.
pub struct PartySession<S, C> {
    context: PartyContext<S, C>,
    party: PartyData,
    model: Arc<QueueModel>,
    engine: ReconciliationEngine<S>,
    playback: PlaybackController,
    notifier: Option<PositionNotifier>,
    last_status: Option<PerformerStatus>,
    resolver: BoxedTitleResolver,
    events: mpsc::UnboundedSender<SessionEvent>,
    /// Entries this client submitted that are still pending.
    own_entries: Vec<EntryId>,
}

/// Handle to a running session. Dropping it tears the session down; use
/// [`SessionHandle::leave`] to also withdraw pending submissions.
pub struct SessionHandle {
    party: PartyData,
    model: Arc<QueueModel>,
    actions: mpsc::UnboundedSender<SessionAction>,
    task: Option<JoinHandle<()>>,
}

impl<S, C> PartySession<S, C>
where
    S: QueueStore,
    C: EventChannel,
{
    pub(crate) fn spawn(
        context: &PartyContext<S, C>,
        party: PartyData,
        config: SessionConfig,
    ) -> (SessionHandle, SessionEventReceiver) {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let (action_sender, action_receiver) = mpsc::unbounded_channel();

        let model = Arc::new(QueueModel::new());
        let engine = ReconciliationEngine::new(context.store.clone(), party.id, model.clone());

        let sink = config.alerts.unwrap_or_else(|| {
            Box::new(EventAlertSink {
                events: event_sender.clone(),
            })
        });
        let notifier = config
            .performer_name
            .map(|name| PositionNotifier::new(name, sink));

        let subscription = context.channel.subscribe(party.id);

        let session = PartySession {
            context: context.clone(),
            party: party.clone(),
            model: model.clone(),
            engine,
            playback: PlaybackController::new(config.media),
            notifier,
            last_status: None,
            resolver: config.resolver,
            events: event_sender,
            own_entries: Vec::new(),
        };

        let task = tokio::spawn(session.run(subscription, action_receiver));

        let handle = SessionHandle {
            party,
            model,
            actions: action_sender,
            task: Some(task),
        };

        (handle, event_receiver)
    }

    async fn run(
        mut self,
        mut subscription: Subscription,
        mut actions: mpsc::UnboundedReceiver<SessionAction>,
    ) {
        // Initial fetch, so the client isn't waiting for the first change
        // to see the queue.
        self.refresh().await;

        loop {
            select! {
                message = subscription.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    // The topic is gone; nothing more will arrive.
                    None => break,
                },
                action = actions.recv() => match action {
                    Some(action) => {
                        if !self.handle_action(action).await {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    }

    async fn handle_message(&mut self, message: PartyMessage) {
        match message {
            PartyMessage::QueueChanged => self.refresh().await,
            PartyMessage::Broadcast(command) => self.apply_transport(command).await,
        }
    }

    /// Returns false when the session should stop.
    async fn handle_action(&mut self, action: SessionAction) -> bool {
        match action {
            SessionAction::Submit { submission, reply } => {
                let result = self.submit(submission).await;
                let _ = reply.send(result);
            }
            SessionAction::Remove { entry_id } => {
                if let Err(e) = self.context.store.delete_entry(entry_id).await {
                    // Not applied; the next notification re-syncs the view.
                    warn!("Failed to remove entry {entry_id}: {e}");
                    return true;
                }

                self.own_entries.retain(|id| *id != entry_id);
                self.model.remove_by_id(entry_id);
                self.model_changed();
            }
            SessionAction::Reorder { from, to } => {
                if let Err(e) = self.engine.reorder(from, to).await {
                    warn!("Reorder {from} -> {to} failed: {e}");
                }
            }
            SessionAction::SetActive { entry_id } => match self.model.entry_by_id(entry_id) {
                Some(entry) => self
                    .context
                    .channel
                    .publish(self.party.id, TransportCommand::SetActive(entry)),
                None => warn!("Cannot activate unknown entry {entry_id}"),
            },
            SessionAction::Transport { command } => {
                self.context.channel.publish(self.party.id, command);
            }
            SessionAction::MediaEnded => {
                let transition = self.playback.media_ended();
                self.finish_transition(transition).await;
            }
            SessionAction::Leave => {
                self.withdraw_own_entries().await;
                info!("Client left party {}", self.party.id);
                return false;
            }
        }

        true
    }

    async fn submit(&mut self, submission: SongSubmission) -> Result<QueueEntry, SubmitError> {
        let new_entry = submission
            .prepare(self.party.id, self.resolver.as_ref())
            .await?;
        let entry = self.context.store.insert_entry(new_entry).await?;

        // Optimistic insert; the confirming notification replaces it.
        self.model.append(entry.clone());
        self.own_entries.push(entry.id);
        self.model_changed();

        info!(
            "\"{}\" queued by {} in party {}",
            entry.title, entry.submitted_by, self.party.id
        );

        Ok(entry)
    }

    async fn refresh(&mut self) {
        if let Err(e) = self.engine.refresh().await {
            // Stale view until the next notification.
            warn!("Reconciliation failed for party {}: {e}", self.party.id);
            return;
        }

        self.model_changed();
    }

    async fn apply_transport(&mut self, command: TransportCommand) {
        // The queue head is the implicit next when nothing was chosen.
        if matches!(command, TransportCommand::Play) && self.playback.active_entry().is_none() {
            if let Some(head) = self.model.head() {
                self.playback.apply(TransportCommand::SetActive(head));
            }
        }

        let transition = self.playback.apply(command);
        self.finish_transition(transition).await;
    }

    async fn finish_transition(&mut self, transition: Transition) {
        if let Some(entry_id) = transition.delete {
            // Racing with the other deletion path is expected; the delete
            // is idempotent.
            if let Err(e) = self.context.store.delete_entry(entry_id).await {
                warn!("Failed to delete played entry {entry_id}: {e}");
            }

            self.own_entries.retain(|id| *id != entry_id);
            self.model.remove_by_id(entry_id);
            self.model_changed();
        }

        if transition.changed {
            self.emit(SessionEvent::PlaybackUpdated {
                state: self.playback.state(),
            });
            self.observe_position();
        }
    }

    /// The explicit delete of the leaver's own pending submissions, the
    /// only store cleanup a departing client owes.
    async fn withdraw_own_entries(&mut self) {
        for entry_id in std::mem::take(&mut self.own_entries) {
            if let Err(e) = self.context.store.delete_entry(entry_id).await {
                warn!("Failed to withdraw entry {entry_id}: {e}");
            }
        }
    }

    fn model_changed(&mut self) {
        self.emit(SessionEvent::QueueUpdated {
            entries: self.model.entries(),
        });
        self.observe_position();
    }

    fn observe_position(&mut self) {
        let Some(notifier) = self.notifier.as_mut() else {
            return;
        };

        let status = notifier.observe(&self.model, &self.playback.state());

        if self.last_status.replace(status) != Some(status) {
            self.emit(SessionEvent::StatusChanged { status });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // The UI may have stopped listening; that's its business.
        let _ = self.events.send(event);
    }
}

impl SessionHandle {
    pub fn party(&self) -> &PartyData {
        &self.party
    }

    /// Snapshot of the local queue replica.
    pub fn queue(&self) -> Vec<QueueEntry> {
        self.model.entries()
    }

    /// Submits a song, waiting for validation and the store insert. The
    /// entry becomes visible locally right away; peers see it once the
    /// change notification lands.
    pub async fn submit(&self, submission: SongSubmission) -> Result<QueueEntry, SubmitError> {
        let (reply, response) = oneshot::channel();

        self.actions
            .send(SessionAction::Submit { submission, reply })
            .map_err(|_| SubmitError::SessionClosed)?;

        response.await.map_err(|_| SubmitError::SessionClosed)?
    }

    /// Withdraws a pending submission.
    pub fn cancel(&self, entry_id: EntryId) {
        self.send(SessionAction::Remove { entry_id });
    }

    /// Removes an entry from the queue.
    pub fn remove(&self, entry_id: EntryId) {
        self.send(SessionAction::Remove { entry_id });
    }

    /// Moves the entry at rank `from` to rank `to` by swapping the two
    /// sequence keys.
    pub fn reorder(&self, from: usize, to: usize) {
        self.send(SessionAction::Reorder { from, to });
    }

    /// Broadcasts which entry should play.
    pub fn set_active(&self, entry_id: EntryId) {
        self.send(SessionAction::SetActive { entry_id });
    }

    pub fn play(&self) {
        self.transport(TransportCommand::Play);
    }

    pub fn pause(&self) {
        self.transport(TransportCommand::Pause);
    }

    pub fn rewind(&self) {
        self.transport(TransportCommand::Rewind);
    }

    pub fn skip(&self) {
        self.transport(TransportCommand::Skip);
    }

    /// The display's own detection that the current media finished.
    pub fn media_ended(&self) {
        self.send(SessionAction::MediaEnded);
    }

    /// Leaves the party, withdrawing pending submissions before the session
    /// winds down.
    pub async fn leave(mut self) {
        let _ = self.actions.send(SessionAction::Leave);

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn transport(&self, command: TransportCommand) {
        self.send(SessionAction::Transport { command });
    }

    fn send(&self, action: SessionAction) {
        // A closed session ignores further actions.
        let _ = self.actions.send(action);
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
