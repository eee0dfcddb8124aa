use std::{fmt, fs, num::ParseIntError, path, str::FromStr};

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// LayerZero endpoint on Arbitrum One.
pub const ARBITRUM_LZ_ENDPOINT: Address = address!("3c2269811836af69497E5F486A85D7316753cf62");

/// LayerZero endpoint on Ethereum mainnet.
pub const ETHEREUM_LZ_ENDPOINT: Address = address!("66A71Dcef29A0fFBDBE3c6a460a3B5BC225Cd675");

/// PeUSD already live on Ethereum mainnet.
pub const ETHEREUM_PEUSD: Address = address!("D585aaafA2B58b1CD75092B51ade9Fa4Ce52F247");

pub const ETHEREUM_LZ_CHAIN_ID: ChainIdentifier = ChainIdentifier(101);
pub const ARBITRUM_LZ_CHAIN_ID: ChainIdentifier = ChainIdentifier(110);

pub const PEUSD_DECIMALS: u8 = 8;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_ARTIFACT: &str = "artifacts/contracts/PeUSD.sol/PeUSD.json";

/// Chain id assigned by the messaging layer. Not the native EVM chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainIdentifier(u16);

impl ChainIdentifier {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ChainIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ChainIdentifier {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<ChainIdentifier> for u16 {
    fn from(id: ChainIdentifier) -> Self {
        id.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: path::PathBuf,
        source: toml::de::Error,
    },

    #[error("remote chain id {0} is the local chain id")]
    SelfPeer(ChainIdentifier),
}

/// Deployment profile, usually kept in `Deployment.toml` next to the hardhat project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub chain: Chain,
    pub token: Token,
    pub remote: Remote,
}

/// The chain the token is deployed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Chain {
    pub name: String,
    pub rpc_url: String,
    pub lz_chain_id: ChainIdentifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Token {
    pub artifact: path::PathBuf,
    pub decimals: u8,
    pub endpoint: Address,
}

/// The already deployed peer the new token will trust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Remote {
    pub chain_id: ChainIdentifier,
    pub address: Address,
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            name: "arbitrum".into(),
            rpc_url: DEFAULT_RPC_URL.into(),
            lz_chain_id: ARBITRUM_LZ_CHAIN_ID,
        }
    }
}

impl Default for Token {
    fn default() -> Self {
        Self {
            artifact: DEFAULT_ARTIFACT.into(),
            decimals: PEUSD_DECIMALS,
            endpoint: ARBITRUM_LZ_ENDPOINT,
        }
    }
}

impl Default for Remote {
    fn default() -> Self {
        Self {
            chain_id: ETHEREUM_LZ_CHAIN_ID,
            address: ETHEREUM_PEUSD,
        }
    }
}

impl Config {
    pub fn from_toml(path: &path::Path, contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the profile at `path`; a missing file yields the defaults.
    pub fn load(path: &path::Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no deployment profile, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.chain_id == self.chain.lz_chain_id {
            return Err(ConfigError::SelfPeer(self.remote.chain_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_arbitrum_rollout() {
        let config = Config::default();
        assert_eq!(config.token.decimals, 8);
        assert_eq!(config.token.endpoint, ARBITRUM_LZ_ENDPOINT);
        assert_eq!(config.remote.chain_id, ChainIdentifier::new(101));
        assert_eq!(config.remote.address, ETHEREUM_PEUSD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_profile_keeps_defaults() {
        let toml = r#"
            [chain]
            rpc_url = "https://arb1.arbitrum.io/rpc"

            [remote]
            chain_id = 109
            address = "0x1111111111111111111111111111111111111111"
        "#;
        let config = Config::from_toml(path::Path::new("Deployment.toml"), toml).unwrap();
        assert_eq!(config.chain.rpc_url, "https://arb1.arbitrum.io/rpc");
        assert_eq!(config.chain.lz_chain_id, ARBITRUM_LZ_CHAIN_ID);
        assert_eq!(config.remote.chain_id, ChainIdentifier::new(109));
        assert_eq!(
            config.remote.address,
            address!("1111111111111111111111111111111111111111")
        );
        assert_eq!(config.token, Token::default());
    }

    #[test]
    fn rejects_unknown_keys() {
        let toml = r#"
            [token]
            decimal = 6
        "#;
        assert!(matches!(
            Config::from_toml(path::Path::new("Deployment.toml"), toml),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_peer_on_own_chain() {
        let toml = r#"
            [remote]
            chain_id = 110
        "#;
        assert!(matches!(
            Config::from_toml(path::Path::new("Deployment.toml"), toml),
            Err(ConfigError::SelfPeer(id)) if id == ARBITRUM_LZ_CHAIN_ID
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("Deployment.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Deployment.toml");
        fs::write(&path, "[token]\ndecimals = 18\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.token.decimals, 18);
    }

    #[test]
    fn parses_chain_identifier() {
        assert_eq!(" 101 ".parse::<ChainIdentifier>().unwrap().get(), 101);
        assert!("70000".parse::<ChainIdentifier>().is_err());
    }
}
