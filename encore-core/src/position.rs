use serde::{Deserialize, Serialize};

use crate::{PlaybackState, PlaybackStatus, QueueModel};

/// How many songs away a performer can be before alerts start firing.
const ALERT_THRESHOLD: usize = 2;

/// How close the local performer is to the microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformerStatus {
    /// No pending submission under the local name.
    NotQueued,
    /// Queued, more than two songs away.
    InLine(usize),
    /// Within two songs of performing.
    Soon(usize),
    /// First in the queue, waiting for the performance to start.
    UpNext,
    /// The local submission is playing right now.
    OnStage,
}

/// A one-shot nearness alert. Carries the 0-based rank it fired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionAlert {
    UpNext,
    SongsAway(usize),
}

/// Where alerts are delivered. The mechanism is the embedder's business;
/// an OS notification, a toast, or a test recorder all fit.
pub trait AlertSink: Send {
    fn raise(&self, alert: PositionAlert);
}

pub type BoxedAlertSink = Box<dyn AlertSink>;

/// Watches one performer's queue position and raises an alert whenever the
/// position moves into the final stretch. Repeat observations of an
/// unchanged position are suppressed, so unrelated queue churn elsewhere
/// doesn't spam the performer.
pub struct PositionNotifier {
    name: String,
    sink: BoxedAlertSink,
    last_position: Option<usize>,
}

impl PositionNotifier {
    pub fn new(name: impl Into<String>, sink: BoxedAlertSink) -> Self {
        Self {
            name: name.into(),
            sink,
            last_position: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recomputes the performer's position after a queue or playback
    /// change, raising an alert on a threshold crossing. Returns the
    /// current status for the UI.
    pub fn observe(&mut self, model: &QueueModel, playback: &PlaybackState) -> PerformerStatus {
        let position = model.position_of(&self.name);
        let previous = std::mem::replace(&mut self.last_position, position);

        if let Some(position) = position {
            if position <= ALERT_THRESHOLD && previous != Some(position) {
                let alert = match position {
                    0 => PositionAlert::UpNext,
                    n => PositionAlert::SongsAway(n),
                };

                self.sink.raise(alert);
            }
        }

        match position {
            None => PerformerStatus::NotQueued,
            Some(0) if self.is_live(playback) => PerformerStatus::OnStage,
            Some(0) => PerformerStatus::UpNext,
            Some(n) if n <= ALERT_THRESHOLD => PerformerStatus::Soon(n),
            Some(n) => PerformerStatus::InLine(n),
        }
    }

    /// Whether the entry on the media surface is the local submission,
    /// mid-performance.
    fn is_live(&self, playback: &PlaybackState) -> bool {
        playback.status == PlaybackStatus::Playing
            && playback
                .active
                .as_ref()
                .is_some_and(|e| e.submitted_by == self.name)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::Utc;
    use parking_lot::Mutex;

    use super::*;
    use crate::{EntryId, QueueEntry};

    #[derive(Default, Clone)]
    struct RecordingSink {
        alerts: Arc<Mutex<Vec<PositionAlert>>>,
    }

    impl RecordingSink {
        fn alerts(&self) -> Vec<PositionAlert> {
            self.alerts.lock().clone()
        }
    }

    impl AlertSink for RecordingSink {
        fn raise(&self, alert: PositionAlert) {
            self.alerts.lock().push(alert);
        }
    }

    fn entry(id: EntryId, submitted_by: &str, sequence_key: i64) -> QueueEntry {
        QueueEntry {
            id,
            party_id: 1,
            title: format!("Song {id}"),
            media_reference: "dQw4w9WgXcQ".to_string(),
            submitted_by: submitted_by.to_string(),
            sequence_key,
            created_at: Utc::now(),
        }
    }

    fn notifier(name: &str) -> (PositionNotifier, RecordingSink) {
        let sink = RecordingSink::default();
        (PositionNotifier::new(name, Box::new(sink.clone())), sink)
    }

    #[test]
    fn test_no_alert_outside_threshold() {
        let (mut notifier, sink) = notifier("dave");
        let model = QueueModel::new();
        model.replace(vec![
            entry(1, "alice", 1),
            entry(2, "bob", 2),
            entry(3, "carol", 3),
            entry(4, "dave", 4),
        ]);

        let status = notifier.observe(&model, &PlaybackState::default());

        assert_eq!(status, PerformerStatus::InLine(3));
        assert!(sink.alerts().is_empty());
    }

    #[test]
    fn test_unchanged_position_is_suppressed() {
        let (mut notifier, sink) = notifier("bob");
        let model = QueueModel::new();
        model.replace(vec![entry(1, "alice", 1), entry(2, "bob", 2)]);

        notifier.observe(&model, &PlaybackState::default());
        // Unrelated churn behind bob; his position stays 1.
        model.append(entry(3, "carol", 3));
        notifier.observe(&model, &PlaybackState::default());

        assert_eq!(
            sink.alerts(),
            vec![PositionAlert::SongsAway(1)],
            "only the first crossing should alert"
        );
    }

    #[test]
    fn test_two_step_drop_fires_once_for_the_new_value() {
        let (mut notifier, sink) = notifier("dave");
        let model = QueueModel::new();
        model.replace(vec![
            entry(1, "alice", 1),
            entry(2, "bob", 2),
            entry(3, "carol", 3),
            entry(4, "dave", 4),
        ]);

        notifier.observe(&model, &PlaybackState::default());

        // Two entries ahead vanish in one reconciliation pass.
        model.replace(vec![entry(3, "carol", 3), entry(4, "dave", 4)]);
        let status = notifier.observe(&model, &PlaybackState::default());

        assert_eq!(status, PerformerStatus::Soon(1));
        assert_eq!(
            sink.alerts(),
            vec![PositionAlert::SongsAway(1)],
            "one alert, for the new value, not one per skipped rank"
        );
    }

    #[test]
    fn test_up_next_versus_on_stage() {
        let (mut notifier, sink) = notifier("alice");
        let model = QueueModel::new();
        let own = entry(1, "alice", 1);
        model.replace(vec![own.clone(), entry(2, "bob", 2)]);

        let idle = PlaybackState::default();
        assert_eq!(notifier.observe(&model, &idle), PerformerStatus::UpNext);
        assert_eq!(sink.alerts(), vec![PositionAlert::UpNext]);

        let live = PlaybackState {
            status: PlaybackStatus::Playing,
            active: Some(own),
        };
        assert_eq!(notifier.observe(&model, &live), PerformerStatus::OnStage);
        assert_eq!(
            sink.alerts().len(),
            1,
            "going live is a status change, not another alert"
        );
    }

    #[test]
    fn test_someone_elses_song_playing_keeps_up_next() {
        let (mut notifier, _) = notifier("bob");
        let model = QueueModel::new();
        model.replace(vec![entry(2, "bob", 2)]);

        let state = PlaybackState {
            status: PlaybackStatus::Playing,
            active: Some(entry(1, "alice", 1)),
        };

        assert_eq!(notifier.observe(&model, &state), PerformerStatus::UpNext);
    }

    #[test]
    fn test_not_queued() {
        let (mut notifier, sink) = notifier("eve");
        let model = QueueModel::new();

        assert_eq!(
            notifier.observe(&model, &PlaybackState::default()),
            PerformerStatus::NotQueued
        );
        assert!(sink.alerts().is_empty());
    }

    #[test]
    fn test_requeueing_after_absence_alerts_again() {
        let (mut notifier, sink) = notifier("alice");
        let model = QueueModel::new();
        model.replace(vec![entry(1, "alice", 1)]);

        notifier.observe(&model, &PlaybackState::default());

        model.replace(vec![]);
        notifier.observe(&model, &PlaybackState::default());

        model.replace(vec![entry(5, "alice", 5)]);
        notifier.observe(&model, &PlaybackState::default());

        assert_eq!(sink.alerts(), vec![PositionAlert::UpNext, PositionAlert::UpNext]);
    }
}
