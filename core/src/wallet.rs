// Wallet capability — account connection, chain selection, change events

use crate::LabiError;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

/// A network the client knows how to add to a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    pub id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
}

pub const SEPOLIA: Chain = Chain {
    id: 11_155_111,
    name: "Sepolia Testnet",
    rpc_url: "https://sepolia.infura.io/v3/",
    explorer_url: "https://sepolia.etherscan.io/",
};

pub const LISK_SEPOLIA: Chain = Chain {
    id: 4202,
    name: "Lisk Sepolia",
    rpc_url: "https://rpc.sepolia-api.lisk.com",
    explorer_url: "https://sepolia-blockscout.lisk.com",
};

pub const KNOWN_CHAINS: [Chain; 2] = [SEPOLIA, LISK_SEPOLIA];

impl Chain {
    pub fn by_id(id: u64) -> Option<Chain> {
        KNOWN_CHAINS.iter().copied().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub is_connected: bool,
    pub address: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub address: String,
    pub chain_id: u64,
}

pub type Listener = Box<dyn Fn(&WalletState) + Send + Sync>;

type ListenerSlots = Mutex<Vec<(u64, Arc<Listener>)>>;

#[derive(Default)]
struct ListenerTable {
    next_id: Mutex<u64>,
    slots: ListenerSlots,
}

/// Subscriber list for wallet state changes
#[derive(Clone, Default)]
pub struct WalletListeners {
    table: Arc<ListenerTable>,
}

/// Handle returned by [`WalletListeners::subscribe`]. Dropping it keeps the
/// listener registered.
#[must_use = "call unsubscribe() to remove the listener"]
pub struct Unsubscribe {
    id: u64,
    table: Weak<ListenerTable>,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        if let Some(table) = self.table.upgrade() {
            table.slots.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl WalletListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> Unsubscribe {
        let id = {
            let mut next = self.table.next_id.lock();
            *next += 1;
            *next
        };
        self.table.slots.lock().push((id, Arc::new(listener)));
        Unsubscribe {
            id,
            table: Arc::downgrade(&self.table),
        }
    }

    /// Call every listener with `state`. Listeners run outside the lock, so
    /// they may subscribe or unsubscribe.
    pub fn notify(&self, state: &WalletState) {
        let listeners: Vec<Arc<Listener>> = self
            .table
            .slots
            .lock()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(state);
        }
    }

    pub fn len(&self) -> usize {
        self.table.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wallet provider surface
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn connect(&self) -> Result<Connection, LabiError>;

    async fn current_state(&self) -> WalletState;

    /// Forget the connection locally. Providers cannot be forced to revoke
    /// access, so this only resets state and notifies listeners.
    async fn disconnect(&self) -> WalletState;

    fn on_change(&self, listener: Listener) -> Unsubscribe;

    async fn switch_network(&self, chain_id: u64) -> Result<(), LabiError>;
}

/// Wallet over a fixed account list, for tests and local sessions
pub struct LocalWallet {
    accounts: Vec<String>,
    chain_id: RwLock<u64>,
    added_chains: RwLock<Vec<u64>>,
    connected: RwLock<bool>,
    listeners: WalletListeners,
}

impl LocalWallet {
    pub fn new(accounts: Vec<String>, chain_id: u64) -> Self {
        Self {
            accounts,
            chain_id: RwLock::new(chain_id),
            added_chains: RwLock::new(vec![chain_id]),
            connected: RwLock::new(false),
            listeners: WalletListeners::new(),
        }
    }

    fn state(&self) -> WalletState {
        if *self.connected.read() {
            WalletState {
                is_connected: true,
                address: self.accounts.first().cloned(),
                chain_id: Some(*self.chain_id.read()),
            }
        } else {
            WalletState::default()
        }
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    async fn connect(&self) -> Result<Connection, LabiError> {
        let address = self
            .accounts
            .first()
            .cloned()
            .ok_or(LabiError::WalletNotConnected)?;

        *self.connected.write() = true;
        let chain_id = *self.chain_id.read();
        self.listeners.notify(&self.state());

        tracing::info!("Wallet connected: {} on chain {}", address, chain_id);
        Ok(Connection { address, chain_id })
    }

    async fn current_state(&self) -> WalletState {
        self.state()
    }

    async fn disconnect(&self) -> WalletState {
        *self.connected.write() = false;
        let state = self.state();
        self.listeners.notify(&state);
        state
    }

    fn on_change(&self, listener: Listener) -> Unsubscribe {
        self.listeners.subscribe(listener)
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), LabiError> {
        {
            let mut added = self.added_chains.write();
            if !added.contains(&chain_id) {
                let chain = Chain::by_id(chain_id).ok_or(LabiError::UnsupportedChain)?;
                tracing::info!("Adding chain {} ({})", chain.name, chain.id);
                added.push(chain_id);
            }
        }

        *self.chain_id.write() = chain_id;
        self.listeners.notify(&self.state());
        Ok(())
    }
}
