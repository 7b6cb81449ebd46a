//! Telemint NFT inspector - prints token name and auction data for items

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing::{error, info};

use telemint_chain::{ClientConfig, ClientFactory};
use telemint_nft::TelemintNft;
use telemint_tlb::InternalAddress;

/// CLI arguments
#[derive(Parser)]
#[command(name = "telemint-nft")]
#[command(about = "Inspect telemint NFT items and their auctions")]
struct Args {
    /// Toncenter API endpoint (overrides TONCENTER_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Toncenter API key (overrides TONCENTER_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Request timeout in milliseconds (overrides TONCENTER_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load one or more items
    Inspect {
        /// Item addresses, raw or user-friendly
        #[arg(required = true)]
        addresses: Vec<InternalAddress>,

        /// Print snapshots as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(api_key) = args.api_key.filter(|key| !key.is_empty()) {
        config.api_key = Some(api_key);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    info!("Using toncenter at {}", config.endpoint);
    let client = ClientFactory::create_client(config)?;

    match args.command {
        Command::Inspect { addresses, json } => {
            let items: Vec<TelemintNft> = addresses
                .iter()
                .map(|addr| TelemintNft::new(addr.to_bounceable()))
                .collect();
            let results = join_all(items.iter().map(|item| item.load(&client))).await;

            let mut failures = 0;
            for (item, result) in items.iter().zip(results) {
                match result {
                    Ok(snapshot) if json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                    Ok(snapshot) => println!("{snapshot}\n"),
                    Err(e) => {
                        failures += 1;
                        error!("{}: {e}", item.address());
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!("{failures} of {} items failed to load", items.len());
            }
        }
    }

    Ok(())
}
