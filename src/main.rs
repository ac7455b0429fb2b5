//! # rpc-probe
//!
//! Probes an Ethereum JSON-RPC provider: balances, ERC-20 reads, a simulated
//! token transfer and `eth_createAccessList`, optionally sending the transfer.

use anyhow::Context;
use clap::Parser;
use rpc_probe::application::services::{Probe, TransferPlan};
use rpc_probe::config::{AppConfig, LogConfig, LogFormat};
use rpc_probe::infrastructure::blockchain::EthereumClient;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network name or chain id
    #[arg(long, short = 'n')]
    network: Option<String>,

    /// RPC endpoint, overriding the network's public endpoint
    #[arg(long = "rpc-url")]
    rpc_url: Option<String>,

    /// Sign and submit the transfer (requires MNEMONIC)
    #[arg(long)]
    send: bool,

    /// Transfer amount in token units
    #[arg(long)]
    amount: Option<Decimal>,

    /// Transfer recipient (defaults to the sender)
    #[arg(long)]
    recipient: Option<String>,

    /// Gas limit sent with eth_createAccessList
    #[arg(long = "gas-limit")]
    gas_limit: Option<u64>,

    /// Read-only address, used when no mnemonic is configured
    #[arg(long)]
    address: Option<String>,

    /// Configuration file
    #[arg(long, short = 'c', env = "RPC_PROBE_CONFIG_FILE")]
    config: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(network) = self.network {
            config.network.name = network;
        }
        if let Some(url) = self.rpc_url {
            config.network.rpc_url = Some(url);
        }
        if self.send {
            config.transfer.send = true;
        }
        if let Some(amount) = self.amount {
            config.transfer.amount = amount;
        }
        if let Some(recipient) = self.recipient {
            config.transfer.recipient = Some(recipient);
        }
        if let Some(gas) = self.gas_limit {
            config.transfer.access_list_gas_limit = Some(gas);
        }
        if let Some(address) = self.address {
            config.account.address = Some(address);
        }
    }
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn load_config(args: Args) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = AppConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            config
        }
        None => AppConfig::load()?,
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; existing variables win over it.
    let dotenv = dotenvy::dotenv();

    let config = load_config(Args::parse())?;
    init_tracing(&config.log);
    if let Err(e) = dotenv
        && !e.not_found()
    {
        warn!(error = %e, "failed to read .env");
    }

    let network = config.network()?;
    let rpc_url = config.rpc_url()?;
    let account = config.account()?.context("no account configured")?;
    let holder = account.address();
    let token = config.token_address()?;
    let recipient = config.recipient()?.unwrap_or(holder);
    info!(
        network = %network,
        chain_id = network.chain_id(),
        rpc_url = %rpc_url,
        account = %account,
        signer = account.can_sign(),
        "starting probe"
    );

    let client = EthereumClient::with_timeout(
        network.into(),
        &rpc_url,
        Some(account),
        config.rpc.request_timeout_ms,
    )?
    .with_gas_buffer(config.rpc.gas_buffer_percent)
    .with_misestimation_policy(config.misestimation_policy());
    let block = client.health_check().await.context("health check failed")?;
    info!(block, "endpoint reachable");

    let probe = Probe::new(client);
    let snapshot = probe.snapshot(holder, token).await?;
    println!("{snapshot}");
    println!();

    let mut plan = TransferPlan::new(token, holder, config.transfer.amount)
        .with_recipient(recipient)
        .with_access_list_gas_limit(config.transfer.access_list_gas_limit);
    if config.transfer.send {
        plan = plan.sending(config.rpc.poll_interval_ms, config.rpc.receipt_timeout_ms);
    }
    let report = probe.run_transfer(&plan).await?;
    println!("{report}");

    Ok(())
}
