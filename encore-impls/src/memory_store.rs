use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use encore_core::{
    EntryId, EventChannel, NewQueueEntry, PartyData, PartyId, PrimaryKey, QueueEntry, QueueStore,
    StoreError, StoreResult,
};

#[derive(Default)]
struct Tables {
    parties: HashMap<PartyId, PartyData>,
    entries: HashMap<EntryId, QueueEntry>,
    next_id: PrimaryKey,
}

/// An in-memory store backing a single process. Fires a change notification
/// through the channel on every queue mutation, the way a hosted table
/// store would.
pub struct MemoryStore<C> {
    tables: Mutex<Tables>,
    channel: Arc<C>,
}

impl<C> MemoryStore<C>
where
    C: EventChannel,
{
    pub fn new(channel: Arc<C>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                next_id: 1,
                ..Default::default()
            }),
            channel,
        }
    }

    fn next_id(tables: &mut Tables) -> PrimaryKey {
        let id = tables.next_id;
        tables.next_id += 1;

        id
    }
}

#[async_trait]
impl<C> QueueStore for MemoryStore<C>
where
    C: EventChannel,
{
    async fn create_party(&self, passcode: &str) -> StoreResult<PartyData> {
        let mut tables = self.tables.lock();

        let collides = tables
            .parties
            .values()
            .any(|p| p.passcode.eq_ignore_ascii_case(passcode));

        if collides {
            return Err(StoreError::Conflict {
                resource: "party",
                field: "passcode",
                value: passcode.to_string(),
            });
        }

        let id = Self::next_id(&mut tables);
        let party = PartyData {
            id,
            passcode: passcode.to_uppercase(),
        };

        tables.parties.insert(id, party.clone());

        Ok(party)
    }

    async fn party_by_passcode(&self, passcode: &str) -> StoreResult<PartyData> {
        self.tables
            .lock()
            .parties
            .values()
            .find(|p| p.passcode.eq_ignore_ascii_case(passcode))
            .cloned()
            .ok_or(StoreError::NotFound {
                resource: "party",
                identifier: "passcode",
            })
    }

    async fn delete_party(&self, party_id: PartyId) -> StoreResult<()> {
        {
            let mut tables = self.tables.lock();

            tables
                .parties
                .remove(&party_id)
                .ok_or(StoreError::NotFound {
                    resource: "party",
                    identifier: "id",
                })?;

            tables.entries.retain(|_, e| e.party_id != party_id);
        }

        self.channel.notify_change(party_id);

        Ok(())
    }

    async fn insert_entry(&self, new_entry: NewQueueEntry) -> StoreResult<QueueEntry> {
        let party_id = new_entry.party_id;

        let entry = {
            let mut tables = self.tables.lock();

            if !tables.parties.contains_key(&party_id) {
                return Err(StoreError::NotFound {
                    resource: "party",
                    identifier: "id",
                });
            }

            // Rank the new entry last in its party.
            let sequence_key = tables
                .entries
                .values()
                .filter(|e| e.party_id == party_id)
                .map(|e| e.sequence_key)
                .max()
                .map(|key| key + 1)
                .unwrap_or(0);

            let id = Self::next_id(&mut tables);
            let entry = QueueEntry {
                id,
                party_id,
                title: new_entry.title,
                media_reference: new_entry.media_reference,
                submitted_by: new_entry.submitted_by,
                sequence_key,
                created_at: Utc::now(),
            };

            tables.entries.insert(id, entry.clone());

            entry
        };

        self.channel.notify_change(party_id);

        Ok(entry)
    }

    async fn delete_entry(&self, entry_id: EntryId) -> StoreResult<()> {
        // Idempotent; the skip and media-end paths race on the same row.
        let removed = self.tables.lock().entries.remove(&entry_id);

        if let Some(entry) = removed {
            self.channel.notify_change(entry.party_id);
        }

        Ok(())
    }

    async fn update_entry_key(&self, entry_id: EntryId, sequence_key: i64) -> StoreResult<()> {
        let party_id = {
            let mut tables = self.tables.lock();

            let entry = tables
                .entries
                .get_mut(&entry_id)
                .ok_or(StoreError::NotFound {
                    resource: "entry",
                    identifier: "id",
                })?;

            entry.sequence_key = sequence_key;
            entry.party_id
        };

        self.channel.notify_change(party_id);

        Ok(())
    }

    async fn entries_for_party(&self, party_id: PartyId) -> StoreResult<Vec<QueueEntry>> {
        let mut entries: Vec<_> = self
            .tables
            .lock()
            .entries
            .values()
            .filter(|e| e.party_id == party_id)
            .cloned()
            .collect();

        entries.sort_by_key(|e| e.sequence_key);

        Ok(entries)
    }
}
