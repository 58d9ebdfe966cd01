pub mod client;
pub mod interface;
pub mod memory;

pub use client::CloudStorageClient;
pub use interface::{BlobStore, FileHandle};
pub use memory::MemoryBlobStore;
