//! In-process stand-in for a chain hosting token deployments.
//!
//! Mirrors the trust surface of the deployed contract: owner-gated
//! `setTrustedRemote`, one stored path per chain id, empty lookup for chains
//! never configured. A reverted call leaves the ledger untouched.

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{chain::ChainIdentifier, error::TrustError, trust::TrustedRemoteApp};

const NOT_OWNER: &str = "Ownable: caller is not the owner";

#[derive(Debug, Clone)]
pub struct MemoryChain {
    id: ChainIdentifier,
    ledger: Arc<Mutex<Ledger>>,
}

#[derive(Debug, Default)]
struct Ledger {
    nonces: HashMap<Address, u64>,
    apps: HashMap<Address, App>,
    events: Vec<TrustEvent>,
    txs: u64,
}

#[derive(Debug)]
struct App {
    owner: Address,
    decimals: u8,
    endpoint: Address,
    trusted: HashMap<ChainIdentifier, Bytes>,
}

/// A `SetTrustedRemote` emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustEvent {
    pub contract: Address,
    pub chain: ChainIdentifier,
    pub path: Bytes,
}

impl Ledger {
    /// Every transaction consumes a nonce of its sender.
    fn next_tx(&mut self, from: Address) -> TxHash {
        *self.nonces.entry(from).or_default() += 1;
        self.txs += 1;
        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&self.txs.to_be_bytes());
        keccak256(preimage)
    }
}

impl MemoryChain {
    pub fn new(id: ChainIdentifier) -> Self {
        Self {
            id,
            ledger: Arc::default(),
        }
    }

    pub fn id(&self) -> ChainIdentifier {
        self.id
    }

    /// Deploys a token owned by `deployer` at its next CREATE address.
    pub async fn deploy(&self, deployer: Address, decimals: u8, endpoint: Address) -> MemoryApp {
        let mut ledger = self.ledger.lock().await;
        let nonce = ledger.nonces.get(&deployer).copied().unwrap_or_default();
        let address = deployer.create(nonce);
        ledger.next_tx(deployer);

        ledger.apps.insert(
            address,
            App {
                owner: deployer,
                decimals,
                endpoint,
                trusted: HashMap::new(),
            },
        );
        debug!(chain = %self.id, %address, %deployer, "deployed token");

        self.at(address)
    }

    /// Handle to `address`, whether or not anything is deployed there.
    pub fn at(&self, address: Address) -> MemoryApp {
        MemoryApp {
            address,
            ledger: self.ledger.clone(),
        }
    }

    pub async fn events(&self) -> Vec<TrustEvent> {
        self.ledger.lock().await.events.clone()
    }
}

#[derive(Debug, Clone)]
pub struct MemoryApp {
    address: Address,
    ledger: Arc<Mutex<Ledger>>,
}

impl MemoryApp {
    pub async fn decimals(&self) -> Result<u8, TrustError> {
        let ledger = self.ledger.lock().await;
        let app = ledger
            .apps
            .get(&self.address)
            .ok_or(TrustError::NotDeployed(self.address))?;
        Ok(app.decimals)
    }

    pub async fn endpoint(&self) -> Result<Address, TrustError> {
        let ledger = self.ledger.lock().await;
        let app = ledger
            .apps
            .get(&self.address)
            .ok_or(TrustError::NotDeployed(self.address))?;
        Ok(app.endpoint)
    }
}

impl TrustedRemoteApp for MemoryApp {
    fn address(&self) -> Address {
        self.address
    }

    async fn owner(&self) -> Result<Address, TrustError> {
        let ledger = self.ledger.lock().await;
        let app = ledger
            .apps
            .get(&self.address)
            .ok_or(TrustError::NotDeployed(self.address))?;
        Ok(app.owner)
    }

    async fn set_trusted_remote(
        &self,
        caller: Address,
        chain: ChainIdentifier,
        path: Bytes,
    ) -> Result<TxHash, TrustError> {
        let mut ledger = self.ledger.lock().await;
        let app = ledger
            .apps
            .get_mut(&self.address)
            .ok_or(TrustError::NotDeployed(self.address))?;
        if app.owner != caller {
            return Err(TrustError::Reverted(NOT_OWNER.into()));
        }
        app.trusted.insert(chain, path.clone());

        ledger.events.push(TrustEvent {
            contract: self.address,
            chain,
            path,
        });
        Ok(ledger.next_tx(caller))
    }

    async fn trusted_remote_lookup(&self, chain: ChainIdentifier) -> Result<Bytes, TrustError> {
        let ledger = self.ledger.lock().await;
        let app = ledger
            .apps
            .get(&self.address)
            .ok_or(TrustError::NotDeployed(self.address))?;
        Ok(app.trusted.get(&chain).cloned().unwrap_or_default())
    }
}
