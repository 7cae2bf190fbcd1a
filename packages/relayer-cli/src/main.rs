use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relayer_core::{
    chain_adapter::{HttpHubClient, HttpSourceClient},
    relayer::{ChainMonitor, MonitorConfig, RelayerState},
    Config,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config file and the key material it points to
    ValidateConfig {
        /// Config file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
    /// Start relaying source chain events to the hub
    Start {
        /// Config file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ValidateConfig { config } => {
            info!("Validating config file: {:?}", config);
            let config = Config::load(&config).context("loading config")?;
            let state = RelayerState::from_config(&config).context("loading key material")?;

            println!("Config is valid.");
            println!("- Source chain {} at {}", config.source.chain_id, config.source.rpc_url);
            println!("  - confirmations: {}", config.source.confirmations);
            println!("- Hub at {}", config.hub.rpc_url);
            println!("  - signer: {}", state.hub_account.to_hex());
            println!("  - height key: {}", hex::encode(config.height_storage_key()));
            println!("- Relayer:");
            println!("  - poll interval: {}s", config.relayer.poll_interval);
            println!("  - max attempts per block: {}", config.relayer.max_retries);
            println!("  - signing keys: {}", state.endorser.key_count());
            for (i, chain) in state.trust_chain.chains.iter().enumerate() {
                println!("  - trust chain #{}: {} certificates", i, chain.certs.len());
            }
            Ok(())
        }
        Commands::Start { config } => {
            info!("Starting relayer with config file: {:?}", config);

            let config = Config::load(&config).context("loading config")?;
            let state = RelayerState::from_config(&config).context("loading key material")?;

            let source = Arc::new(
                HttpSourceClient::new(&config.source.rpc_url)
                    .with_retry_delay(Duration::from_secs(config.relayer.retry_delay)),
            );
            let hub = Arc::new(HttpHubClient::new(&config.hub.rpc_url));
            let mut monitor = ChainMonitor::new(state, source, hub, MonitorConfig::from(&config));
            monitor.init().await;

            let cancel = CancellationToken::new();
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for ctrl-c: {}", e);
                    return;
                }
                info!("Shutdown requested, finishing current tick");
                shutdown.cancel();
            });

            monitor.run(cancel).await;
            info!("Relayer stopped at source height {}", monitor.current_height());
            Ok(())
        }
    }
}
