pub mod bindings;
pub mod chain;
pub mod error;
pub mod logger;
pub mod memory;
pub mod onchain;
pub mod trust;

pub use chain::ChainIdentifier;
pub use error::TrustError;
pub use trust::{
    configure_trusted_remote, is_trusted_remote, pair, query_trusted_path, query_trusted_remote,
    TrustedPath, TrustedRemoteApp,
};
