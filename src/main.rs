//! mcpmux CLI binary entry point.

use clap::Parser;
use mcpmux::cli::{Cli, Commands};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mcpmux=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = match cli.command {
        Commands::List(args) => mcpmux::cli::tools::handle_list(&args, cancel).await,
        Commands::Call(args) => mcpmux::cli::tools::handle_call(&args, cancel).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
