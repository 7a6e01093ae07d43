//! vaultweb main entry point

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use vaultweb_api::start_server;
use vaultweb_config::Config;
use vaultweb_core::{HttpTransport, Store, VaultController, VaultSession};

#[derive(Parser, Debug)]
#[command(name = "vaultweb")]
#[command(version = "0.1.0")]
#[command(about = "A small HTMX front end for a password vault store", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_details());
            return Err(e.into());
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    log::info!(
        "Config loaded: listen={}, store={}, store timeout={}s",
        config.bind_address(),
        config.store.base_url,
        config.store.timeout_secs
    );

    let transport = HttpTransport::from_config(&config.store)?;
    let vault = VaultSession::new(VaultController::new(), Store::new(Arc::new(transport)));

    let rt = Runtime::new()?;
    rt.block_on(start_server(config, vault))?;

    Ok(())
}
