use clap::Parser;
use tracing_subscriber::EnvFilter;

use coderev_web::{run_main, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run_main(cli)
        .await
        .inspect_err(|e| tracing::error!("coderev exited: {e:#}"))
}
