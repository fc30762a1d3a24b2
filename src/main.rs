//! fundweb main entry point

use anyhow::Context;
use clap::Parser;
use fundweb_api::start_server;
use fundweb_config::Config;
use fundweb_core::FundStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::RwLock;

#[derive(Parser, Debug)]
#[command(name = "fundweb")]
#[command(author = "fundweb Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Fund initiatives with a validated transaction editor", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = Config::load(&args.config).map_err(|e| anyhow::anyhow!("{}", e.to_details()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level)).init();
    log::info!("Config loaded from {}", args.config.display());

    let rt = Runtime::new().context("failed to start the async runtime")?;

    rt.block_on(async {
        let mut store = FundStore::new(&config);

        let seed_path = config.seed_path();
        if seed_path.exists() {
            store
                .load(seed_path.clone())
                .await
                .with_context(|| format!("failed to load seed file {}", seed_path.display()))?;
        } else {
            log::warn!("Seed file not found: {}, starting empty", seed_path.display());
        }

        let store = Arc::new(RwLock::new(store));
        start_server(config, store).await.context("server error")
    })
}
