mod manager;
mod media;
mod passcode;
mod resolve;
mod session;
mod submit;

use std::sync::Arc;

use encore_core::{EventChannel, QueueStore};

pub use manager::*;
pub use media::*;
pub use passcode::*;
pub use resolve::*;
pub use session::*;
pub use submit::*;

/// The encore party system, coordinating parties, client sessions, and song
/// submissions over a shared store and channel.
pub struct PartyHub<S, C> {
    context: PartyContext<S, C>,

    pub parties: PartyManager<S, C>,
}

/// A type passed to components of the party system, to access the store and
/// the pub/sub channel.
pub struct PartyContext<S, C> {
    pub store: Arc<S>,
    pub channel: Arc<C>,
}

impl<S, C> PartyHub<S, C>
where
    S: QueueStore,
    C: EventChannel,
{
    pub fn new(store: Arc<S>, channel: Arc<C>) -> Self {
        let context = PartyContext { store, channel };
        let parties = PartyManager::new(&context);

        Self { context, parties }
    }

    pub fn context(&self) -> &PartyContext<S, C> {
        &self.context
    }
}

impl<S, C> Clone for PartyContext<S, C>
where
    S: QueueStore,
    C: EventChannel,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            channel: self.channel.clone(),
        }
    }
}
