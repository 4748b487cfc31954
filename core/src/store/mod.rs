// Store module — storage backends and the chat room store

pub mod backend;
pub mod threads;

pub use backend::{MemoryStorage, StorageBackend};
pub use threads::{StoreStats, ThreadStore, DEFAULT_SLOT};

#[cfg(not(target_arch = "wasm32"))]
pub use backend::SledStorage;
