use alloy::primitives::Address;

use crate::chain::ChainIdentifier;

#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("caller {caller} is not the owner ({owner}) of {contract}")]
    Unauthorized {
        contract: Address,
        caller: Address,
        owner: Address,
    },

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("trusted path for chain {chain} is {len} bytes, expected 40")]
    MalformedPath { chain: ChainIdentifier, len: usize },

    #[error("{contract} does not trust {peer} on chain {chain}")]
    MirrorMismatch {
        contract: Address,
        chain: ChainIdentifier,
        peer: Address,
    },

    #[error("deployment failed: {0}")]
    Deployment(String),

    #[error("no contract deployed at {0}")]
    NotDeployed(Address),

    #[error("artifact: {0}")]
    Artifact(String),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Abi(#[from] alloy::sol_types::Error),

    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    Pending(#[from] alloy::providers::PendingTransactionError),
}
