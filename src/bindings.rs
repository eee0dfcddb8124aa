use alloy::{primitives::Bytes, sol};
use serde::Deserialize;

use crate::{chain::ChainIdentifier, error::TrustError, trust::TrustedPath};

// Trust surface of the LayerZero v1 application the token inherits from.
sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract PeUSD {
        event SetTrustedRemote(uint16 _remoteChainId, bytes _path);

        function owner() external view returns (address);
        function decimals() external view returns (uint8);
        function setTrustedRemote(uint16 _remoteChainId, bytes calldata _path) external;
        function trustedRemoteLookup(uint16 _remoteChainId) external view returns (bytes memory);
        function getTrustedRemoteAddress(uint16 _remoteChainId) external view returns (bytes memory);
        function isTrustedRemote(uint16 _srcChainId, bytes calldata _srcAddress) external view returns (bool);
    }
);

/// Compiled contract as written by `hardhat compile`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: Option<String>,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn from_json(json: &str) -> Result<Self, TrustError> {
        let artifact: Self = serde_json::from_str(json)?;
        if artifact.bytecode.is_empty() {
            return Err(TrustError::Artifact(
                "artifact has no creation bytecode (abstract contract or interface?)".into(),
            ));
        }
        Ok(artifact)
    }

    pub fn read(path: &std::path::Path) -> Result<Self, TrustError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| TrustError::Artifact(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

impl PeUSD::SetTrustedRemote {
    pub fn binding(&self) -> Result<(ChainIdentifier, TrustedPath), TrustError> {
        let chain = ChainIdentifier::new(self._remoteChainId);
        let path = TrustedPath::decode(&self._path).ok_or(TrustError::MalformedPath {
            chain,
            len: self._path.len(),
        })?;
        Ok((chain, path))
    }
}
