use std::sync::Arc;

use crate::{QueueModel, QueueStore, StoreError, StoreResult};
use crate::PartyId;

/// Resolves the authoritative queue order from the store and merges it into
/// the local [`QueueModel`].
///
/// The strategy is fetch-everything-on-every-change: a full ordered re-read
/// per notification, which converges the replica regardless of how many
/// writers mutated the table in between.
pub struct ReconciliationEngine<S> {
    store: Arc<S>,
    party_id: PartyId,
    model: Arc<QueueModel>,
}

impl<S> ReconciliationEngine<S>
where
    S: QueueStore,
{
    pub fn new(store: Arc<S>, party_id: PartyId, model: Arc<QueueModel>) -> Self {
        Self {
            store,
            party_id,
            model,
        }
    }

    /// Re-fetches every entry for the party and swaps the model wholesale.
    /// The model is left untouched when the read fails.
    pub async fn refresh(&self) -> StoreResult<()> {
        let entries = self.store.entries_for_party(self.party_id).await?;
        self.model.replace(entries);

        Ok(())
    }

    /// Moves the entry at rank `from` to rank `to` by swapping only the two
    /// sequence keys in the store. Every other entry keeps its key, so a
    /// multi-step move is expressed as a series of adjacent swaps.
    ///
    /// The store's own change notifications drive the subsequent
    /// reconciliation; nothing is applied locally here.
    pub async fn reorder(&self, from: usize, to: usize) -> StoreResult<()> {
        if from == to {
            return Ok(());
        }

        // Recover canonical ranks from the replica.
        let mut entries = self.model.entries();
        entries.sort_by_key(|e| e.sequence_key);

        let first = entries.get(from).ok_or(StoreError::NotFound {
            resource: "entry",
            identifier: "from rank",
        })?;
        let second = entries.get(to).ok_or(StoreError::NotFound {
            resource: "entry",
            identifier: "to rank",
        })?;

        self.store
            .update_entry_key(first.id, second.sequence_key)
            .await?;
        self.store
            .update_entry_key(second.id, first.sequence_key)
            .await?;

        Ok(())
    }
}
