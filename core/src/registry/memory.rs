// In-process ledger following the registry and profile contract rules

use super::{DomainName, Ledger, Profile, ProfileDirectory, TxReceipt, TxStatus, Wei};
use crate::LabiError;
use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// 0.01 ETH
pub const DEFAULT_REGISTRATION_FEE: Wei = 10_000_000_000_000_000;

#[derive(Debug, Default)]
struct LedgerState {
    /// label -> owner, in registration order
    domains: Vec<(String, String)>,
    /// owner -> primary label (first registered)
    primary: HashMap<String, String>,
    /// address -> profile, in first-set order
    profiles: Vec<(String, Profile)>,
    nonce: u64,
}

impl LedgerState {
    fn owner_of(&self, label: &str) -> Option<&str> {
        self.domains
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, owner)| owner.as_str())
    }

    /// Derive a receipt hash from the call and a running nonce
    fn receipt(&mut self, op: &str, owner: &str, payload: &str) -> TxReceipt {
        self.nonce += 1;
        let mut hasher = Sha256::new();
        hasher.update(op.as_bytes());
        hasher.update(owner.as_bytes());
        hasher.update(payload.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        TxReceipt {
            hash: format!("0x{}", hex::encode(hasher.finalize())),
            status: TxStatus::Success,
        }
    }
}

/// Ledger held in memory.
///
/// Labels are unique case-sensitively, as the contract compares raw strings.
pub struct InMemoryLedger {
    fee: Wei,
    state: RwLock<LedgerState>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRATION_FEE)
    }
}

impl InMemoryLedger {
    pub fn new(fee: Wei) -> Self {
        Self {
            fee,
            state: RwLock::new(LedgerState::default()),
        }
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn is_available(&self, name: &DomainName) -> Result<bool, LabiError> {
        Ok(self.state.read().owner_of(name.label()).is_none())
    }

    async fn registration_fee(&self) -> Result<Wei, LabiError> {
        Ok(self.fee)
    }

    async fn register(
        &self,
        owner: &str,
        name: &DomainName,
        fee: Wei,
    ) -> Result<TxReceipt, LabiError> {
        if owner.is_empty() {
            return Err(LabiError::InvalidInput);
        }
        if fee < self.fee {
            return Err(LabiError::InsufficientFee);
        }

        let mut state = self.state.write();
        if state.owner_of(name.label()).is_some() {
            return Err(LabiError::DomainUnavailable);
        }

        state
            .domains
            .push((name.label().to_string(), owner.to_string()));
        state
            .primary
            .entry(owner.to_string())
            .or_insert_with(|| name.label().to_string());

        tracing::info!("Registered {} to {}", name.fqdn(), owner);
        Ok(state.receipt("register", owner, name.label()))
    }

    async fn get_domains_of(&self, address: &str) -> Result<Vec<String>, LabiError> {
        Ok(self
            .state
            .read()
            .domains
            .iter()
            .filter(|(_, owner)| owner == address)
            .map(|(label, _)| label.clone())
            .collect())
    }

    async fn primary_domain(&self, address: &str) -> Result<Option<String>, LabiError> {
        Ok(self.state.read().primary.get(address).cloned())
    }

    async fn resolve(&self, name: &DomainName) -> Result<Option<String>, LabiError> {
        Ok(self.state.read().owner_of(name.label()).map(str::to_string))
    }

    async fn get_profile(&self, address: &str) -> Result<Profile, LabiError> {
        Ok(self
            .state
            .read()
            .profiles
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, p)| p.clone())
            .unwrap_or_default())
    }

    async fn set_profile(
        &self,
        owner: &str,
        content_hash: &str,
        display_name: &str,
    ) -> Result<TxReceipt, LabiError> {
        if owner.is_empty() || content_hash.is_empty() {
            return Err(LabiError::InvalidInput);
        }

        let profile = Profile {
            content_hash: content_hash.to_string(),
            display_name: display_name.to_string(),
            updated_at: crate::now_millis(),
            exists: true,
        };

        let mut state = self.state.write();
        match state.profiles.iter_mut().find(|(a, _)| a == owner) {
            Some((_, existing)) => *existing = profile,
            None => state.profiles.push((owner.to_string(), profile)),
        }

        tracing::info!("Profile of {} now points at {}", owner, content_hash);
        Ok(state.receipt("setProfile", owner, content_hash))
    }

    async fn get_all_domains(&self) -> Result<Vec<String>, LabiError> {
        Ok(self
            .state
            .read()
            .domains
            .iter()
            .map(|(label, _)| label.clone())
            .collect())
    }

    async fn get_all_profiles(&self) -> Result<ProfileDirectory, LabiError> {
        let state = self.state.read();
        let mut directory = ProfileDirectory::default();
        for (address, profile) in &state.profiles {
            directory.push(address, profile);
        }
        Ok(directory)
    }
}
