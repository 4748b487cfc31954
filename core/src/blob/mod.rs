// Blob module — content-addressed storage for avatars and profile documents
//
// Hashes follow IPFS CIDv0 so a pinning service and the in-memory store
// hand out the same address for the same bytes.

use crate::LabiError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";

/// Multihash prefix: sha2-256, 32-byte digest
const MULTIHASH_SHA2_256: [u8; 2] = [0x12, 0x20];

/// CIDv0 content hash (`Qm...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash of `bytes`
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut multihash = Vec::with_capacity(34);
        multihash.extend_from_slice(&MULTIHASH_SHA2_256);
        multihash.extend_from_slice(&digest);
        Self(bs58::encode(multihash).into_string())
    }

    /// Accept a hash handed back by a store or read from the ledger.
    pub fn parse(input: &str) -> Result<Self, LabiError> {
        let decoded = bs58::decode(input)
            .into_vec()
            .map_err(|_| LabiError::InvalidInput)?;
        if decoded.len() != 34 || decoded[..2] != MULTIHASH_SHA2_256 {
            return Err(LabiError::InvalidInput);
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-addressed blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>) -> Result<ContentHash, LabiError>;

    /// `NotFound` if nothing is stored under `hash`
    async fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, LabiError>;

    /// Public URL a browser can load the blob from
    fn gateway_url(&self, hash: &ContentHash) -> String;
}

/// JSON helpers for every [`BlobStore`]
#[async_trait]
pub trait BlobStoreExt: BlobStore {
    async fn upload_json<T: Serialize + Sync>(&self, value: &T) -> Result<ContentHash, LabiError> {
        let bytes = serde_json::to_vec(value).map_err(|_| LabiError::Internal)?;
        self.upload(bytes).await
    }

    async fn fetch_json<T: DeserializeOwned + Send>(&self, hash: &ContentHash) -> Result<T, LabiError> {
        let bytes = self.fetch(hash).await?;
        serde_json::from_slice(&bytes).map_err(|_| LabiError::InvalidInput)
    }
}

impl<S: BlobStore + ?Sized> BlobStoreExt for S {}

/// Blob store held in memory
pub struct MemoryBlobStore {
    gateway: String,
    blobs: RwLock<HashMap<ContentHash, Vec<u8>>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY)
    }
}

impl MemoryBlobStore {
    pub fn new(gateway: &str) -> Self {
        let gateway = if gateway.ends_with('/') {
            gateway.to_string()
        } else {
            format!("{}/", gateway)
        };
        Self {
            gateway,
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bytes: Vec<u8>) -> Result<ContentHash, LabiError> {
        let hash = ContentHash::of(&bytes);
        tracing::debug!("Pinned {} ({} bytes)", hash, bytes.len());
        self.blobs.write().insert(hash.clone(), bytes);
        Ok(hash)
    }

    async fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, LabiError> {
        self.blobs
            .read()
            .get(hash)
            .cloned()
            .ok_or(LabiError::NotFound)
    }

    fn gateway_url(&self, hash: &ContentHash) -> String {
        format!("{}{}", self.gateway, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_shape() {
        let hash = ContentHash::of(b"hello");
        assert!(hash.as_str().starts_with("Qm"));
        assert_eq!(hash.as_str().len(), 46);
        assert_eq!(ContentHash::parse(hash.as_str()).unwrap(), hash);
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(ContentHash::of(b"abc"), ContentHash::of(b"abc"));
        assert_ne!(ContentHash::of(b"abc"), ContentHash::of(b"abd"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(ContentHash::parse("not-base58!"), Err(LabiError::InvalidInput));
        assert_eq!(ContentHash::parse("3mJr7AoUXx2Wqd"), Err(LabiError::InvalidInput));
    }

    #[tokio::test]
    async fn test_upload_fetch() {
        let store = MemoryBlobStore::default();
        let hash = store.upload(b"avatar bytes".to_vec()).await.unwrap();

        assert_eq!(store.fetch(&hash).await.unwrap(), b"avatar bytes");
        assert_eq!(store.len(), 1);

        // Same bytes, same address
        let again = store.upload(b"avatar bytes".to_vec()).await.unwrap();
        assert_eq!(hash, again);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let store = MemoryBlobStore::default();
        let hash = ContentHash::of(b"never uploaded");
        assert_eq!(store.fetch(&hash).await, Err(LabiError::NotFound));
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryBlobStore::default();
        let hash = store
            .upload_json(&serde_json::json!({"displayName": "Alice"}))
            .await
            .unwrap();

        let value: serde_json::Value = store.fetch_json(&hash).await.unwrap();
        assert_eq!(value["displayName"], "Alice");
    }

    #[test]
    fn test_gateway_url() {
        let store = MemoryBlobStore::new("https://ipfs.example");
        let hash = ContentHash::of(b"x");
        assert_eq!(
            store.gateway_url(&hash),
            format!("https://ipfs.example/{}", hash)
        );
    }
}
