use serde::{Deserialize, Serialize};

use crate::{EntryId, QueueEntry, TransportCommand};

/// Transport status of the party's media surface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing is playing. An entry may still be loaded and waiting.
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Snapshot of a client's transport state. Never persisted; each display
/// client keeps its own copy, eventually consistent via broadcasts.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// The entry currently loaded on the media surface. Tracks the queue
    /// head by convention, but the protocol does not enforce it.
    pub active: Option<QueueEntry>,
}

impl PlaybackState {
    pub fn active_entry_id(&self) -> Option<EntryId> {
        self.active.as_ref().map(|e| e.id)
    }
}

/// The media surface a display client drives.
pub trait MediaOutput: Send {
    fn load(&self, entry: &QueueEntry);
    fn play(&self);
    fn pause(&self);
    fn seek_to_start(&self);
    fn stop(&self);
}

pub type BoxedMediaOutput = Box<dyn MediaOutput>;

/// A media output for clients that don't render anything.
pub struct NullMedia;

impl MediaOutput for NullMedia {
    fn load(&self, _entry: &QueueEntry) {}
    fn play(&self) {}
    fn pause(&self) {}
    fn seek_to_start(&self) {}
    fn stop(&self) {}
}

/// What a transition asks its caller to do.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// The state snapshot changed and should be surfaced.
    pub changed: bool,
    /// The entry that should now be deleted from the store.
    pub delete: Option<EntryId>,
}

/// State machine for the current transport state, driven by inbound
/// broadcasts and the display's own media-end detection. Never advances on
/// a local timer, and never decides which entry plays next; the controller
/// role does, by broadcasting [`TransportCommand::SetActive`].
pub struct PlaybackController {
    media: BoxedMediaOutput,
    status: PlaybackStatus,
    active: Option<QueueEntry>,
}

impl PlaybackController {
    pub fn new(media: BoxedMediaOutput) -> Self {
        Self {
            media,
            status: PlaybackStatus::Idle,
            active: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn active_entry(&self) -> Option<&QueueEntry> {
        self.active.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            status: self.status,
            active: self.active.clone(),
        }
    }

    /// Applies an inbound transport broadcast.
    pub fn apply(&mut self, command: TransportCommand) -> Transition {
        match command {
            TransportCommand::SetActive(entry) => self.set_active(entry),
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::Rewind => self.rewind(),
            TransportCommand::Skip => self.skip(),
        }
    }

    /// The display noticed the media finished on its own. Only meaningful
    /// while playing a known entry.
    pub fn media_ended(&mut self) -> Transition {
        if self.status != PlaybackStatus::Playing {
            return Transition::default();
        }

        let Some(entry) = self.active.take() else {
            return Transition::default();
        };

        self.status = PlaybackStatus::Idle;

        Transition {
            changed: true,
            delete: Some(entry.id),
        }
    }

    fn set_active(&mut self, entry: QueueEntry) -> Transition {
        self.media.load(&entry);
        self.active = Some(entry);

        Transition {
            changed: true,
            delete: None,
        }
    }

    fn play(&mut self) -> Transition {
        // Playing -> Playing is a no-op.
        if self.status == PlaybackStatus::Playing {
            return Transition::default();
        }

        self.media.play();
        self.status = PlaybackStatus::Playing;

        Transition {
            changed: true,
            delete: None,
        }
    }

    fn pause(&mut self) -> Transition {
        if self.status != PlaybackStatus::Playing {
            return Transition::default();
        }

        self.media.pause();
        self.status = PlaybackStatus::Paused;

        Transition {
            changed: true,
            delete: None,
        }
    }

    fn rewind(&mut self) -> Transition {
        self.media.seek_to_start();

        // Status and active entry are unchanged.
        Transition::default()
    }

    fn skip(&mut self) -> Transition {
        self.media.stop();

        let delete = self.active.take().map(|e| e.id);
        let changed = delete.is_some() || self.status != PlaybackStatus::Idle;

        self.status = PlaybackStatus::Idle;

        Transition { changed, delete }
    }
}
