use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// The type used for store-assigned primary keys.
pub type PrimaryKey = u64;

pub type PartyId = PrimaryKey;
pub type EntryId = PrimaryKey;

/// A submitted performance, awaiting or currently playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub party_id: PartyId,
    pub title: String,
    /// Opaque reference to the media backing the performance,
    /// canonically a video id.
    pub media_reference: String,
    /// Display name of the submitter. Not a unique identity; two performers
    /// using the same name collide on position lookups.
    pub submitted_by: String,
    /// Determines total order within a party. Unique per party, no ties.
    pub sequence_key: i64,
    pub created_at: DateTime<Utc>,
}

/// A queue entry before the store has assigned its id and sequence key.
#[derive(Debug, Clone)]
pub struct NewQueueEntry {
    pub party_id: PartyId,
    pub title: String,
    pub media_reference: String,
    pub submitted_by: String,
}

/// One client's replica of a party's queue, ordered ascending by sequence
/// key. Rebuilt wholesale from the store on every reconciliation pass,
/// never diffed incrementally.
pub struct QueueModel {
    entries: Mutex<Vec<QueueEntry>>,
}

impl QueueModel {
    pub fn new() -> Self {
        Self {
            entries: Default::default(),
        }
    }

    /// Atomically swaps the whole ordered sequence.
    pub fn replace(&self, mut entries: Vec<QueueEntry>) {
        entries.sort_by_key(|e| e.sequence_key);
        *self.entries.lock() = entries;
    }

    /// Optimistic local insert, used right after a successful submission
    /// before the confirming notification arrives. Suppressed if an entry
    /// with the same id is already present.
    pub fn append(&self, entry: QueueEntry) {
        let mut entries = self.entries.lock();

        if entries.iter().any(|e| e.id == entry.id) {
            return;
        }

        let at = entries
            .iter()
            .position(|e| e.sequence_key > entry.sequence_key)
            .unwrap_or(entries.len());

        entries.insert(at, entry);
    }

    /// Optimistic local delete. Removing an absent id is a no-op.
    pub fn remove_by_id(&self, id: EntryId) {
        self.entries.lock().retain(|e| e.id != id);
    }

    /// 0-based rank of the first entry submitted under the given name.
    /// Multiple entries under one name resolve to the earliest rank.
    pub fn position_of(&self, submitted_by: &str) -> Option<usize> {
        self.entries
            .lock()
            .iter()
            .position(|e| e.submitted_by == submitted_by)
    }

    /// The entry at rank 0, the candidate "now performing" entry.
    pub fn head(&self) -> Option<QueueEntry> {
        self.entries.lock().first().cloned()
    }

    pub fn entry_by_id(&self, id: EntryId) -> Option<QueueEntry> {
        self.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Snapshot of the current order.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for QueueModel {
    fn default() -> Self {
        Self::new()
    }
}
