use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EntryId, NewQueueEntry, PartyId, QueueEntry};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An unknown or internal error happened with the store
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the store doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// One karaoke session, identified by id and join passcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyData {
    pub id: PartyId,
    /// Human-memorable join code. Stored uppercase; matching is
    /// case-insensitive.
    pub passcode: String,
}

/// Represents a type that can persist parties and their queue entries.
///
/// The store is passive: it holds rows and answers ordered queries. All
/// coordination logic lives client-side, on top of the change notifications
/// the store fires through its [`EventChannel`](crate::EventChannel) on
/// every mutation.
#[async_trait]
pub trait QueueStore: Send + Sync + 'static {
    async fn create_party(&self, passcode: &str) -> StoreResult<PartyData>;
    async fn party_by_passcode(&self, passcode: &str) -> StoreResult<PartyData>;
    /// Deletes the party and every queue entry belonging to it.
    async fn delete_party(&self, party_id: PartyId) -> StoreResult<()>;

    /// Inserts an entry, assigning its id, sequence key, and creation time.
    /// The assigned sequence key ranks the entry last in its party.
    async fn insert_entry(&self, new_entry: NewQueueEntry) -> StoreResult<QueueEntry>;
    /// Deletes an entry. Deleting an entry that no longer exists is a
    /// no-op, not an error; the skip and media-end paths race on the same
    /// row.
    async fn delete_entry(&self, entry_id: EntryId) -> StoreResult<()>;
    /// Overwrites an entry's sequence key. Last write wins.
    async fn update_entry_key(&self, entry_id: EntryId, sequence_key: i64) -> StoreResult<()>;
    /// Every entry for the party, ordered ascending by sequence key.
    async fn entries_for_party(&self, party_id: PartyId) -> StoreResult<Vec<QueueEntry>>;
}
