// Registry module — `.labi` domain ownership and on-chain profile pointers
//
// The chain itself is out of reach of this crate. `Ledger` is the seam a
// contract client plugs into; `InMemoryLedger` follows the same contract
// rules inside the process.

pub mod memory;

pub use memory::InMemoryLedger;

use crate::LabiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amounts in wei
pub type Wei = u128;

/// Suffix every registered name resolves under
pub const TLD: &str = "labi";

const MIN_LABEL_LEN: usize = 3;
const MAX_LABEL_LEN: usize = 20;

/// A validated domain label (without the `.labi` suffix).
///
/// 3 to 20 ASCII letters, digits or hyphens, not starting or ending with a
/// hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    pub fn parse(input: &str) -> Result<Self, LabiError> {
        let label = input.strip_suffix(".labi").unwrap_or(input);

        let valid_len = (MIN_LABEL_LEN..=MAX_LABEL_LEN).contains(&label.len());
        let valid_chars = label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
        let valid_edges = !label.starts_with('-') && !label.ends_with('-');

        if valid_len && valid_chars && valid_edges {
            Ok(Self(label.to_string()))
        } else {
            Err(LabiError::InvalidInput)
        }
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// Fully qualified form, e.g. `alice.labi`
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.0, TLD)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainName {
    type Error = LabiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DomainName> for String {
    fn from(name: DomainName) -> Self {
        name.0
    }
}

/// Profile pointer as stored on chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Content hash of the profile document in the blob store
    pub content_hash: String,
    pub display_name: String,
    /// Milliseconds since epoch of the last `set_profile`
    pub updated_at: u64,
    /// False for addresses that never set a profile
    pub exists: bool,
}

/// Column-wise listing of every profile, as the contract returns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDirectory {
    pub addresses: Vec<String>,
    pub hashes: Vec<String>,
    pub names: Vec<String>,
    pub timestamps: Vec<u64>,
}

/// One row of a [`ProfileDirectory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry<'a> {
    pub address: &'a str,
    pub content_hash: &'a str,
    pub display_name: &'a str,
    pub updated_at: u64,
}

impl ProfileDirectory {
    pub fn push(&mut self, address: &str, profile: &Profile) {
        self.addresses.push(address.to_string());
        self.hashes.push(profile.content_hash.clone());
        self.names.push(profile.display_name.clone());
        self.timestamps.push(profile.updated_at);
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Row view; stops at the shortest column if the columns disagree
    pub fn entries(&self) -> impl Iterator<Item = DirectoryEntry<'_>> {
        self.addresses
            .iter()
            .zip(&self.hashes)
            .zip(&self.names)
            .zip(&self.timestamps)
            .map(|(((address, hash), name), updated_at)| DirectoryEntry {
                address,
                content_hash: hash,
                display_name: name,
                updated_at: *updated_at,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Reverted,
}

/// Result of a state-changing ledger call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// `0x`-prefixed transaction hash
    pub hash: String,
    pub status: TxStatus,
}

/// Domain registry and profile contract surface.
///
/// Write calls take the signing address explicitly; a contract client
/// would take it from the connected wallet.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn is_available(&self, name: &DomainName) -> Result<bool, LabiError>;

    async fn registration_fee(&self) -> Result<Wei, LabiError>;

    async fn register(
        &self,
        owner: &str,
        name: &DomainName,
        fee: Wei,
    ) -> Result<TxReceipt, LabiError>;

    async fn get_domains_of(&self, address: &str) -> Result<Vec<String>, LabiError>;

    /// `None` if the address owns no domain
    async fn primary_domain(&self, address: &str) -> Result<Option<String>, LabiError>;

    /// Owner address, `None` if unregistered
    async fn resolve(&self, name: &DomainName) -> Result<Option<String>, LabiError>;

    async fn get_profile(&self, address: &str) -> Result<Profile, LabiError>;

    async fn set_profile(
        &self,
        owner: &str,
        content_hash: &str,
        display_name: &str,
    ) -> Result<TxReceipt, LabiError>;

    async fn get_all_domains(&self) -> Result<Vec<String>, LabiError>;

    async fn get_all_profiles(&self) -> Result<ProfileDirectory, LabiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_name_rules() {
        assert!(DomainName::parse("alice").is_ok());
        assert!(DomainName::parse("a-1-b").is_ok());
        assert!(DomainName::parse("abc").is_ok());
        assert!(DomainName::parse(&"x".repeat(20)).is_ok());

        assert_eq!(DomainName::parse("ab"), Err(LabiError::InvalidInput));
        assert_eq!(DomainName::parse(&"x".repeat(21)), Err(LabiError::InvalidInput));
        assert_eq!(DomainName::parse("-abc"), Err(LabiError::InvalidInput));
        assert_eq!(DomainName::parse("abc-"), Err(LabiError::InvalidInput));
        assert_eq!(DomainName::parse("ab_c"), Err(LabiError::InvalidInput));
        assert_eq!(DomainName::parse("héllo"), Err(LabiError::InvalidInput));
    }

    #[test]
    fn test_domain_name_accepts_fqdn() {
        let name = DomainName::parse("alice.labi").unwrap();
        assert_eq!(name.label(), "alice");
        assert_eq!(name.fqdn(), "alice.labi");
        assert_eq!(name.to_string(), "alice");
    }

    #[test]
    fn test_domain_name_serde_validates() {
        let name: DomainName = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(name.label(), "bob");
        assert!(serde_json::from_str::<DomainName>("\"-x\"").is_err());
    }

    #[test]
    fn test_directory_entries() {
        let mut dir = ProfileDirectory::default();
        let profile = Profile {
            content_hash: "QmHash".into(),
            display_name: "Alice".into(),
            updated_at: 42,
            exists: true,
        };
        dir.push("0xA", &profile);

        assert_eq!(dir.len(), 1);
        let entry = dir.entries().next().unwrap();
        assert_eq!(entry.address, "0xA");
        assert_eq!(entry.display_name, "Alice");
        assert_eq!(entry.updated_at, 42);
    }
}
