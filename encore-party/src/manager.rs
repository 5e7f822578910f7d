use log::info;
use thiserror::Error;

use encore_core::{EventChannel, PartyData, PartyId, QueueStore, StoreError};

use crate::{
    generate_passcode, PartyContext, PartySession, SessionConfig, SessionEventReceiver,
    SessionHandle,
};

/// Errors surfaced to a user entering or running a party.
#[derive(Debug, Error)]
pub enum PartyError {
    /// The passcode doesn't resolve to a party. Recoverable; re-prompt.
    #[error("No party with that passcode")]
    UnknownPasscode,
    #[error(transparent)]
    Store(StoreError),
}

/// Creates and looks up parties, and opens client sessions on them.
pub struct PartyManager<S, C> {
    context: PartyContext<S, C>,
}

impl<S, C> PartyManager<S, C>
where
    S: QueueStore,
    C: EventChannel,
{
    pub fn new(context: &PartyContext<S, C>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a new party under a freshly generated passcode.
    pub async fn host(&self) -> Result<PartyData, PartyError> {
        let passcode = generate_passcode();
        let party = self
            .context
            .store
            .create_party(&passcode)
            .await
            .map_err(PartyError::Store)?;

        info!("Party {} hosted with passcode {}", party.id, party.passcode);

        Ok(party)
    }

    /// Finds the party behind a join code. Matching is case-insensitive.
    pub async fn join(&self, passcode: &str) -> Result<PartyData, PartyError> {
        match self.context.store.party_by_passcode(passcode).await {
            Ok(party) => Ok(party),
            Err(StoreError::NotFound { .. }) => Err(PartyError::UnknownPasscode),
            Err(e) => Err(PartyError::Store(e)),
        }
    }

    /// Ends the party, deleting it and every queue entry with it.
    pub async fn end(&self, party_id: PartyId) -> Result<(), PartyError> {
        self.context
            .store
            .delete_party(party_id)
            .await
            .map_err(PartyError::Store)?;

        info!("Party {party_id} ended");

        Ok(())
    }

    /// Opens a client session on a party. The returned receiver carries the
    /// session's UI-facing events.
    pub fn open_session(
        &self,
        party: PartyData,
        config: SessionConfig,
    ) -> (SessionHandle, SessionEventReceiver) {
        PartySession::spawn(&self.context, party, config)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use encore_impls::{MemoryChannel, MemoryStore};

    use super::*;
    use crate::PartyHub;

    fn hub() -> PartyHub<MemoryStore<MemoryChannel>, MemoryChannel> {
        let channel = Arc::new(MemoryChannel::new());
        let store = Arc::new(MemoryStore::new(channel.clone()));

        PartyHub::new(store, channel)
    }

    #[tokio::test]
    async fn test_host_and_join() {
        let hub = hub();

        let party = hub.parties.host().await.unwrap();
        assert_eq!(party.passcode.len(), crate::PASSCODE_LENGTH);

        let joined = hub.parties.join(&party.passcode).await.unwrap();
        assert_eq!(joined, party);
    }

    #[tokio::test]
    async fn test_join_is_case_insensitive() {
        let hub = hub();
        let party = hub.parties.host().await.unwrap();

        let joined = hub.parties.join(&party.passcode.to_lowercase()).await.unwrap();

        assert_eq!(joined.id, party.id);
    }

    #[tokio::test]
    async fn test_unknown_passcode() {
        let hub = hub();

        let result = hub.parties.join("NOPE42").await;

        assert!(matches!(result, Err(PartyError::UnknownPasscode)));
    }

    #[tokio::test]
    async fn test_ending_a_party_removes_it() {
        let hub = hub();
        let party = hub.parties.host().await.unwrap();

        hub.parties.end(party.id).await.unwrap();

        assert!(matches!(
            hub.parties.join(&party.passcode).await,
            Err(PartyError::UnknownPasscode)
        ));
    }
}
