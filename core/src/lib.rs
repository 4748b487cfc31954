// Labi Chat Core — local chat threads plus the capabilities around them
//
// The chat log lives on the device. Wallet, domain registry and blob storage
// are collaborators reached through traits so the caller decides what backs
// them.

pub mod blob;
pub mod message;
pub mod profile;
pub mod registry;
pub mod store;
pub mod wallet;

use thiserror::Error;

pub use blob::{BlobStore, BlobStoreExt, ContentHash, MemoryBlobStore};
pub use message::{Message, RecentChat, Room, RoomKey};
pub use profile::{AvatarUpload, ProfileData};
pub use registry::{DomainName, InMemoryLedger, Ledger, Profile, ProfileDirectory, TxReceipt};
pub use store::{MemoryStorage, StorageBackend, StoreStats, ThreadStore};
pub use wallet::{Chain, Connection, LocalWallet, Wallet, WalletListeners, WalletState};

#[cfg(not(target_arch = "wasm32"))]
pub use store::SledStorage;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabiError {
    #[error("Storage error")]
    StorageError,
    #[error("Chat store is corrupted")]
    CorruptedStore,
    #[error("Invalid input")]
    InvalidInput,
    #[error("Not found")]
    NotFound,
    #[error("Domain is not available")]
    DomainUnavailable,
    #[error("Insufficient registration fee")]
    InsufficientFee,
    #[error("Wallet not connected")]
    WalletNotConnected,
    #[error("Unsupported chain")]
    UnsupportedChain,
    #[error("Network error")]
    NetworkError,
    #[error("Internal error")]
    Internal,
}

impl From<anyhow::Error> for LabiError {
    fn from(_err: anyhow::Error) -> Self {
        LabiError::Internal
    }
}

/// Milliseconds since the Unix epoch, the unit used for every timestamp in
/// the chat log and the registry.
pub fn now_millis() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
