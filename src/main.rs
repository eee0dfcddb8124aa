use std::path::PathBuf;

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::{http::reqwest::Url, Transport},
};
use clap::{Args, Parser, Subcommand};
use eyre::OptionExt;
use tracing::info;

use deployer::{
    bindings::Artifact,
    chain::{self, ChainIdentifier, Config},
    logger,
    memory::{MemoryApp, MemoryChain},
    onchain::{deploy_token, OnchainApp},
    trust::{configure_trusted_remote, pair, query_trusted_remote, TrustedPath, TrustedRemoteApp},
};

#[derive(Debug, Parser)]
#[command(version, about = "Deploy PeUSD and wire its LayerZero trusted remote")]
struct Cli {
    /// Deployment profile; defaults apply when the file does not exist.
    #[arg(long, short, global = true, default_value = "Deployment.toml")]
    config: PathBuf,

    #[arg(long, global = true, env = "RPC_URL")]
    rpc_url: Option<String>,

    #[arg(long, global = true, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy the token, trust the remote peer and read the binding back.
    Deploy {
        #[arg(long)]
        artifact: Option<PathBuf>,
        #[arg(long)]
        decimals: Option<u8>,
        /// LayerZero endpoint on the target chain.
        #[arg(long)]
        endpoint: Option<Address>,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Trust the remote peer from an already deployed token.
    Trust {
        #[arg(long)]
        contract: Address,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Print the trusted remote a token holds for a chain.
    Query {
        #[arg(long)]
        contract: Address,
        #[arg(long)]
        chain_id: Option<ChainIdentifier>,
    },
    /// Print the packed `remote || local` path.
    Pack {
        #[arg(long)]
        remote: Address,
        #[arg(long)]
        local: Address,
    },
    /// Pair two fresh deployments on in-memory chains.
    Simulate,
}

#[derive(Debug, Args)]
struct RemoteArgs {
    #[arg(long = "remote-chain-id")]
    chain_id: Option<ChainIdentifier>,
    #[arg(long = "remote")]
    address: Option<Address>,
}

impl RemoteArgs {
    fn apply(self, remote: &mut chain::Remote) {
        if let Some(chain_id) = self.chain_id {
            remote.chain_id = chain_id;
        }
        if let Some(address) = self.address {
            remote.address = address;
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    logger::init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(rpc_url) = cli.rpc_url {
        config.chain.rpc_url = rpc_url;
    }

    match cli.command {
        Command::Deploy {
            artifact,
            decimals,
            endpoint,
            remote,
        } => {
            if let Some(artifact) = artifact {
                config.token.artifact = artifact;
            }
            if let Some(decimals) = decimals {
                config.token.decimals = decimals;
            }
            if let Some(endpoint) = endpoint {
                config.token.endpoint = endpoint;
            }
            remote.apply(&mut config.remote);
            config.validate()?;

            let signer = signer(cli.private_key.as_deref())?;
            let caller = signer.address();
            let provider = ProviderBuilder::new()
                .with_recommended_fillers()
                .wallet(EthereumWallet::from(signer))
                .on_http(rpc_url(&config)?);

            deploy(&provider, caller, &config).await?;
        }
        Command::Trust { contract, remote } => {
            remote.apply(&mut config.remote);
            config.validate()?;

            let signer = signer(cli.private_key.as_deref())?;
            let caller = signer.address();
            let provider = ProviderBuilder::new()
                .with_recommended_fillers()
                .wallet(EthereumWallet::from(signer))
                .on_http(rpc_url(&config)?);

            let token = OnchainApp::connect(&provider, contract).await?;
            let binding = configure_trusted_remote(
                &token,
                caller,
                config.remote.chain_id,
                config.remote.address,
            )
            .await?;
            println!("set trusted remote in tx {}", binding.tx_hash);
        }
        Command::Query { contract, chain_id } => {
            let chain_id = chain_id.unwrap_or(config.remote.chain_id);
            let provider = ProviderBuilder::new().on_http(rpc_url(&config)?);

            let token = OnchainApp::connect(&provider, contract).await?;
            let remote = query_trusted_remote(&token, chain_id).await?;
            println!("trusted remote for chain {chain_id}: {}", show(remote));
        }
        Command::Pack { remote, local } => {
            println!("{}", TrustedPath::new(remote, local).pack());
        }
        Command::Simulate => {
            simulate(&config).await?;
        }
    }

    Ok(())
}

async fn deploy<P, T>(provider: P, caller: Address, config: &Config) -> eyre::Result<()>
where
    P: Provider<T, Ethereum>,
    T: Transport + Clone,
{
    let chain_id = provider.get_chain_id().await?;
    info!(chain = %config.chain.name, chain_id, %caller, "deploying");

    let artifact = Artifact::read(&config.token.artifact)?;
    let address = deploy_token(
        &provider,
        caller,
        &artifact,
        config.token.decimals,
        config.token.endpoint,
    )
    .await?;
    println!("peusd {}: {}", config.chain.name, address);

    let token = OnchainApp::new(&provider, address);
    configure_trusted_remote(
        &token,
        caller,
        config.remote.chain_id,
        config.remote.address,
    )
    .await?;

    let remote = query_trusted_remote(&token, config.remote.chain_id).await?;
    println!(
        "trusted remote for chain {}: {}",
        config.remote.chain_id,
        show(remote)
    );

    Ok(())
}

/// The ledger stores the endpoint but never calls it, so both sides reuse the
/// profile's endpoint.
async fn simulate(config: &Config) -> eyre::Result<(MemoryApp, MemoryApp)> {
    let deployer = Address::repeat_byte(0x01);
    let local = MemoryChain::new(config.chain.lz_chain_id);
    let remote = MemoryChain::new(config.remote.chain_id);

    let a = local
        .deploy(deployer, config.token.decimals, config.token.endpoint)
        .await;
    let b = remote
        .deploy(deployer, config.token.decimals, config.token.endpoint)
        .await;

    pair((&a, deployer, local.id()), (&b, deployer, remote.id())).await?;

    let a_trusts = query_trusted_remote(&a, remote.id()).await?;
    let b_trusts = query_trusted_remote(&b, local.id()).await?;
    println!("chain {} token {} trusts {}", local.id(), a.address(), show(a_trusts));
    println!("chain {} token {} trusts {}", remote.id(), b.address(), show(b_trusts));

    Ok((a, b))
}

fn signer(private_key: Option<&str>) -> eyre::Result<PrivateKeySigner> {
    let key = private_key.ok_or_eyre("no signer, pass --private-key or set PRIVATE_KEY")?;
    Ok(key.parse()?)
}

fn rpc_url(config: &Config) -> eyre::Result<Url> {
    Ok(config.chain.rpc_url.parse()?)
}

fn show(remote: Option<Address>) -> String {
    remote.map_or_else(|| "none".into(), |address| address.to_string())
}
