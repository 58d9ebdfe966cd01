pub mod client;
pub mod interface;
pub mod memory;

pub use client::PubSubClient;
pub use interface::MessageBroker;
pub use memory::{MemoryBroker, PublishedMessage};
