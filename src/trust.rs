//! Trusted remote pairing between two instances of the token on different chains.
//!
//! A contract accepts relayed messages from chain `c` only when the path stored
//! for `c` equals `remote || local`, both as raw 20-byte addresses. The peer
//! contract must register the mirrored path (`local || remote` from our point of
//! view) for the link to work in both directions.

use alloy::{
    primitives::{Address, Bytes, TxHash},
    sol_types::SolValue,
};
use tracing::{debug, info};

use crate::{chain::ChainIdentifier, error::TrustError};

/// Byte length of a packed `remote || local` path.
pub const PATH_LEN: usize = 40;

/// Trust configuration surface of a deployed token.
///
/// Every state-changing call takes the acting account explicitly.
#[allow(async_fn_in_trait)]
pub trait TrustedRemoteApp {
    /// Address the contract is deployed at.
    fn address(&self) -> Address;

    async fn owner(&self) -> Result<Address, TrustError>;

    async fn set_trusted_remote(
        &self,
        caller: Address,
        chain: ChainIdentifier,
        path: Bytes,
    ) -> Result<TxHash, TrustError>;

    /// Raw stored path; empty when nothing was configured for `chain`.
    async fn trusted_remote_lookup(&self, chain: ChainIdentifier) -> Result<Bytes, TrustError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustedPath {
    pub remote: Address,
    pub local: Address,
}

impl TrustedPath {
    pub fn new(remote: Address, local: Address) -> Self {
        Self { remote, local }
    }

    /// `abi.encodePacked(remote, local)`
    pub fn pack(&self) -> Bytes {
        (self.remote, self.local).abi_encode_packed().into()
    }

    pub fn decode(path: &[u8]) -> Option<Self> {
        if path.len() != PATH_LEN {
            return None;
        }
        let (remote, local) = path.split_at(PATH_LEN / 2);
        Some(Self {
            remote: Address::from_slice(remote),
            local: Address::from_slice(local),
        })
    }

    /// Path the peer has to register to trust us back.
    pub fn mirrored(&self) -> Self {
        Self {
            remote: self.local,
            local: self.remote,
        }
    }
}

/// Result of a successful `setTrustedRemote` submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub chain: ChainIdentifier,
    pub path: TrustedPath,
    pub tx_hash: TxHash,
}

/// Both halves of a bidirectional link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub forward: Binding,
    pub backward: Binding,
}

pub async fn configure_trusted_remote<A: TrustedRemoteApp>(
    app: &A,
    caller: Address,
    chain: ChainIdentifier,
    remote: Address,
) -> Result<Binding, TrustError> {
    let contract = app.address();
    let owner = app.owner().await?;
    if owner != caller {
        return Err(TrustError::Unauthorized {
            contract,
            caller,
            owner,
        });
    }

    let path = TrustedPath::new(remote, contract);
    let packed = path.pack();
    debug!(%contract, %chain, path = %packed, "submitting trusted remote");

    let tx_hash = app.set_trusted_remote(caller, chain, packed).await?;
    info!(%contract, %chain, %remote, %tx_hash, "trusted remote configured");

    Ok(Binding {
        chain,
        path,
        tx_hash,
    })
}

/// Stored path for `chain`, or `None` if the chain was never configured.
pub async fn query_trusted_path<A: TrustedRemoteApp>(
    app: &A,
    chain: ChainIdentifier,
) -> Result<Option<TrustedPath>, TrustError> {
    let raw = app.trusted_remote_lookup(chain).await?;
    if raw.is_empty() {
        return Ok(None);
    }
    TrustedPath::decode(&raw)
        .map(Some)
        .ok_or(TrustError::MalformedPath {
            chain,
            len: raw.len(),
        })
}

/// Trusted remote address for `chain`, the first 20 bytes of the stored path.
pub async fn query_trusted_remote<A: TrustedRemoteApp>(
    app: &A,
    chain: ChainIdentifier,
) -> Result<Option<Address>, TrustError> {
    Ok(query_trusted_path(app, chain).await?.map(|path| path.remote))
}

/// Whether `app` currently accepts messages from `remote` on `chain`.
pub async fn is_trusted_remote<A: TrustedRemoteApp>(
    app: &A,
    chain: ChainIdentifier,
    remote: Address,
) -> Result<bool, TrustError> {
    let raw = app.trusted_remote_lookup(chain).await?;
    Ok(raw == TrustedPath::new(remote, app.address()).pack())
}

/// Registers `a` and `b` as each other's trusted remote and checks both sides.
pub async fn pair<A, B>(
    (a, caller_a, chain_a): (&A, Address, ChainIdentifier),
    (b, caller_b, chain_b): (&B, Address, ChainIdentifier),
) -> Result<Link, TrustError>
where
    A: TrustedRemoteApp,
    B: TrustedRemoteApp,
{
    let forward = configure_trusted_remote(a, caller_a, chain_b, b.address()).await?;
    let backward = configure_trusted_remote(b, caller_b, chain_a, a.address()).await?;

    if !is_trusted_remote(a, chain_b, b.address()).await? {
        return Err(TrustError::MirrorMismatch {
            contract: a.address(),
            chain: chain_b,
            peer: b.address(),
        });
    }
    if !is_trusted_remote(b, chain_a, a.address()).await? {
        return Err(TrustError::MirrorMismatch {
            contract: b.address(),
            chain: chain_a,
            peer: a.address(),
        });
    }

    info!(a = %a.address(), b = %b.address(), %chain_a, %chain_b, "link established");
    Ok(Link { forward, backward })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryChain;
    use alloy::primitives::{address, bytes};

    const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const MALLORY: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const ENDPOINT: Address = address!("3c2269811836af69497E5F486A85D7316753cf62");
    const REMOTE: ChainIdentifier = ChainIdentifier::new(101);

    #[test]
    fn packs_remote_then_local() {
        let remote = Address::repeat_byte(0xaa);
        let local = Address::repeat_byte(0xbb);
        let packed = TrustedPath::new(remote, local).pack();
        assert_eq!(packed.len(), PATH_LEN);
        assert_eq!(
            packed,
            bytes!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaabbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb")
        );
    }

    #[test]
    fn decode_rejects_bare_address() {
        assert!(TrustedPath::decode(Address::repeat_byte(0xaa).as_slice()).is_none());
    }

    #[test]
    fn mirrored_swaps_roles() {
        let path = TrustedPath::new(Address::repeat_byte(1), Address::repeat_byte(2));
        let mirror = path.mirrored();
        assert_eq!(mirror.remote, path.local);
        assert_eq!(mirror.local, path.remote);
        assert_eq!(mirror.mirrored(), path);
    }

    #[tokio::test]
    async fn configure_then_query_round_trips() {
        let chain = MemoryChain::new(ChainIdentifier::new(110));
        let app = chain.deploy(OWNER, 8, ENDPOINT).await;
        let peer = Address::repeat_byte(0xaa);

        let binding = configure_trusted_remote(&app, OWNER, REMOTE, peer)
            .await
            .unwrap();
        assert_eq!(binding.path, TrustedPath::new(peer, app.address()));

        assert_eq!(query_trusted_remote(&app, REMOTE).await.unwrap(), Some(peer));
        assert_eq!(
            app.trusted_remote_lookup(REMOTE).await.unwrap(),
            binding.path.pack()
        );
    }

    #[tokio::test]
    async fn reconfigure_overwrites() {
        let chain = MemoryChain::new(ChainIdentifier::new(110));
        let app = chain.deploy(OWNER, 8, ENDPOINT).await;
        let first = Address::repeat_byte(0x01);
        let second = Address::repeat_byte(0x02);

        configure_trusted_remote(&app, OWNER, REMOTE, first)
            .await
            .unwrap();
        configure_trusted_remote(&app, OWNER, REMOTE, second)
            .await
            .unwrap();

        assert_eq!(query_trusted_remote(&app, REMOTE).await.unwrap(), Some(second));
        assert!(!is_trusted_remote(&app, REMOTE, first).await.unwrap());
        assert!(is_trusted_remote(&app, REMOTE, second).await.unwrap());
    }

    #[tokio::test]
    async fn unauthorized_caller_leaves_state_untouched() {
        let chain = MemoryChain::new(ChainIdentifier::new(110));
        let app = chain.deploy(OWNER, 8, ENDPOINT).await;
        let peer = Address::repeat_byte(0xaa);
        configure_trusted_remote(&app, OWNER, REMOTE, peer)
            .await
            .unwrap();
        let before = query_trusted_remote(&app, REMOTE).await.unwrap();

        let err = configure_trusted_remote(&app, MALLORY, REMOTE, Address::repeat_byte(0xcc))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Unauthorized { caller, owner, .. } if caller == MALLORY && owner == OWNER
        ));

        assert_eq!(query_trusted_remote(&app, REMOTE).await.unwrap(), before);
    }

    #[tokio::test]
    async fn unknown_chain_is_none() {
        let chain = MemoryChain::new(ChainIdentifier::new(110));
        let app = chain.deploy(OWNER, 8, ENDPOINT).await;
        configure_trusted_remote(&app, OWNER, REMOTE, Address::repeat_byte(0xaa))
            .await
            .unwrap();

        let other = ChainIdentifier::new(102);
        assert_eq!(query_trusted_remote(&app, other).await.unwrap(), None);
        assert_eq!(query_trusted_path(&app, other).await.unwrap(), None);
        assert!(!is_trusted_remote(&app, other, Address::repeat_byte(0xaa))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn malformed_path_is_an_error() {
        let chain = MemoryChain::new(ChainIdentifier::new(110));
        let app = chain.deploy(OWNER, 8, ENDPOINT).await;
        // a bare address, as newer endpoints accept through setTrustedRemoteAddress
        app.set_trusted_remote(OWNER, REMOTE, Address::repeat_byte(0xaa).to_vec().into())
            .await
            .unwrap();

        assert!(matches!(
            query_trusted_remote(&app, REMOTE).await,
            Err(TrustError::MalformedPath { len: 20, .. })
        ));
    }

    #[tokio::test]
    async fn swapped_order_is_not_trusted() {
        let chain = MemoryChain::new(ChainIdentifier::new(110));
        let app = chain.deploy(OWNER, 8, ENDPOINT).await;
        let peer = Address::repeat_byte(0xaa);
        let swapped = TrustedPath::new(app.address(), peer);
        app.set_trusted_remote(OWNER, REMOTE, swapped.pack())
            .await
            .unwrap();

        assert!(!is_trusted_remote(&app, REMOTE, peer).await.unwrap());
    }
}
