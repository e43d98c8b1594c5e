//! Binary entry point for the `aegis` CLI.

use clap::Parser;
use tracing::debug;

use aegis_cli::cli::{self, Cli};
use aegis_cli::config::{init_tracing, LogConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(&LogConfig {
        filter: cli.log_level.clone(),
        json: cli.log_json,
    });
    debug!("aegis {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = cli::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
