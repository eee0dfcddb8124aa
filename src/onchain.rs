use std::marker::PhantomData;

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, FixedBytes, LogData, TxHash},
    providers::Provider,
    rpc::types::TransactionRequest,
    sol_types::{sol_data, SolEvent, SolType},
    transports::Transport,
};
use tracing::{debug, info};

use crate::{
    bindings::{Artifact, PeUSD},
    chain::ChainIdentifier,
    error::TrustError,
    trust::TrustedRemoteApp,
};

const SET_TRUSTED_REMOTE_TOPIC: Option<&FixedBytes<32>> =
    Some(&PeUSD::SetTrustedRemote::SIGNATURE_HASH);

/// A token deployed on a live chain, reached through `provider`.
pub struct OnchainApp<P, T> {
    provider: P,
    address: Address,
    _phantom: PhantomData<T>,
}

impl<P, T> OnchainApp<P, T>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    pub fn new(provider: P, address: Address) -> Self {
        Self {
            provider,
            address,
            _phantom: PhantomData,
        }
    }

    /// Fails with [`TrustError::NotDeployed`] if there is no code at `address`.
    pub async fn connect(provider: P, address: Address) -> Result<Self, TrustError> {
        let code = provider.get_code_at(address).await?;
        if code.is_empty() {
            return Err(TrustError::NotDeployed(address));
        }
        Ok(Self::new(provider, address))
    }

    pub async fn decimals(&self) -> Result<u8, TrustError> {
        let token = PeUSD::new(self.address, &self.provider);
        Ok(token.decimals().call().await?._0)
    }
}

impl<P, T> TrustedRemoteApp for OnchainApp<P, T>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    fn address(&self) -> Address {
        self.address
    }

    async fn owner(&self) -> Result<Address, TrustError> {
        let token = PeUSD::new(self.address, &self.provider);
        Ok(token.owner().call().await?._0)
    }

    async fn set_trusted_remote(
        &self,
        caller: Address,
        chain: ChainIdentifier,
        path: Bytes,
    ) -> Result<TxHash, TrustError> {
        let token = PeUSD::new(self.address, &self.provider);
        let receipt = token
            .setTrustedRemote(chain.get(), path)
            .from(caller)
            .send()
            .await?
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(TrustError::Reverted(format!(
                "setTrustedRemote in tx {}",
                receipt.transaction_hash
            )));
        }

        let event = receipt
            .inner
            .logs()
            .iter()
            .find(|log| log.topic0() == SET_TRUSTED_REMOTE_TOPIC);
        if let Some(log) = event {
            log_trust_event(&log.inner.data);
        }

        Ok(receipt.transaction_hash)
    }

    async fn trusted_remote_lookup(&self, chain: ChainIdentifier) -> Result<Bytes, TrustError> {
        let token = PeUSD::new(self.address, &self.provider);
        Ok(token.trustedRemoteLookup(chain.get()).call().await?._0)
    }
}

/// Reports an emitted `SetTrustedRemote`. The write has already landed, so
/// nothing here can fail the call.
fn log_trust_event(data: &LogData) -> Option<PeUSD::SetTrustedRemote> {
    let event = match PeUSD::SetTrustedRemote::decode_log_data(data, true) {
        Ok(event) => event,
        Err(e) => {
            debug!(%e, "undecodable SetTrustedRemote");
            return None;
        }
    };
    match event.binding() {
        Ok((chain, path)) => {
            debug!(%chain, remote = %path.remote, local = %path.local, "SetTrustedRemote emitted")
        }
        Err(e) => debug!(
            chain = event._remoteChainId,
            path = %event._path,
            %e,
            "SetTrustedRemote emitted"
        ),
    }
    Some(event)
}

/// Creation bytecode followed by the abi-encoded constructor arguments.
pub fn creation_code(artifact: &Artifact, decimals: u8, endpoint: Address) -> Bytes {
    let mut code = artifact.bytecode.to_vec();
    code.extend(<(sol_data::Uint<8>, sol_data::Address)>::abi_encode_params(&(decimals, endpoint)));
    code.into()
}

/// Deploys `artifact` with constructor `(uint8 decimals, address lzEndpoint)`.
pub async fn deploy_token<P, T>(
    provider: P,
    deployer: Address,
    artifact: &Artifact,
    decimals: u8,
    endpoint: Address,
) -> Result<Address, TrustError>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_deploy_code(creation_code(artifact, decimals, endpoint));
    debug!(%deployer, decimals, %endpoint, "sending creation tx");

    let receipt = provider.send_transaction(tx).await?.get_receipt().await?;

    if !receipt.status() {
        return Err(TrustError::Deployment(format!(
            "creation tx {} reverted",
            receipt.transaction_hash
        )));
    }
    let address = receipt.contract_address.ok_or_else(|| {
        TrustError::Deployment(format!(
            "receipt for {} has no contract address",
            receipt.transaction_hash
        ))
    })?;

    info!(%address, tx_hash = %receipt.transaction_hash, "token deployed");
    Ok(address)
}
