mod channel;
mod playback;
mod position;
mod queue;
mod reconcile;
mod store;

pub use channel::*;
pub use playback::*;
pub use position::*;
pub use queue::*;
pub use reconcile::*;
pub use store::*;
