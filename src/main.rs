// ABOUTME: CLI entrypoint for the bsm command
// ABOUTME: Sets up logging, runs the command and maps errors to exit codes

use bsm_client::{cli::Cli, commands, Result};
use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_filter(), cli.verbose > 0);

    if let Err(e) = run(cli).await {
        let line = format!("bsm: [E{}] {}", e.exit_code(), e);
        eprintln!("{}", line.red());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    commands::run(cli).await
}

fn init_logging(default_filter: &str, force: bool) {
    // RUST_LOG wins unless -v was given explicitly
    let filter = if force {
        EnvFilter::new(default_filter)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
