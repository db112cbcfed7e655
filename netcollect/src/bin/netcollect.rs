//! Collect state from every device in an inventory file.
//!
//! ```bash
//! NET_USER=admin NET_PASSWORD=secret netcollect --config config.yaml
//! ```

use std::path::PathBuf;

use clap::Parser;
use log::info;

use netcollect::{Collector, Credentials, Inventory};

#[derive(Parser)]
#[command(name = "netcollect", version, about)]
struct Args {
    /// Inventory file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Login user for every device
    #[arg(short, long, env = "NET_USER")]
    username: String,

    /// Login password for every device
    #[arg(short, long, env = "NET_PASSWORD", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let inventory = Inventory::load(&args.config)?;
    info!(
        "loaded {} device(s) from {}",
        inventory.len(),
        args.config.display()
    );

    let credentials = Credentials::new(args.username, args.password);
    let collector = Collector::new(credentials, inventory.settings.clone());
    collector.run(&inventory).await;

    Ok(())
}
