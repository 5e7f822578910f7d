mod memory_channel;
mod memory_store;

pub use memory_channel::*;
pub use memory_store::*;
