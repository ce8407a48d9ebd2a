pub mod handler;
pub mod page;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;

use coderev_core::{AzureSettings, CriteriaRegistry};
use coderev_suggest::{CompletionClient, LlmClient};

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_POST_CALL_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Parser)]
#[command(name = "coderev", about = "Send code to Azure OpenAI for review from a web form")]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "CODEREV_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Pause after every completion call, in milliseconds. 0 disables it.
    #[arg(long, env = "CODEREV_POST_CALL_DELAY_MS", default_value_t = DEFAULT_POST_CALL_DELAY_MS)]
    pub post_call_delay_ms: u64,

    /// JSON criteria profile to use instead of the builtin one.
    #[arg(long, env = "CODEREV_CRITERIA_FILE")]
    pub criteria_file: Option<PathBuf>,
}

/// Everything a request needs, built once at startup and shared read-only.
pub struct AppState {
    pub settings: AzureSettings,
    pub registry: CriteriaRegistry,
    pub client: Arc<dyn CompletionClient>,
    pub post_call_delay: Duration,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handler::index).post(handler::submit))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .await
        .context("HTTP server error")
}

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let settings = AzureSettings::from_env();
    let missing = settings.missing_vars();
    if !missing.is_empty() {
        tracing::warn!(
            "missing {}; review requests will fail until they are set",
            missing.join(", ")
        );
    } else if let Err(e) = coderev_suggest::engine::parse_endpoint(&settings.endpoint) {
        tracing::warn!("{e}; review requests will fail until it is fixed");
    }

    let registry = match &cli.criteria_file {
        Some(path) => CriteriaRegistry::load(path)
            .with_context(|| format!("loading criteria profile {}", path.display()))?,
        None => CriteriaRegistry::builtin(),
    };

    let state = Arc::new(AppState {
        client: Arc::new(LlmClient::new(settings.clone())),
        settings,
        registry,
        post_call_delay: Duration::from_millis(cli.post_call_delay_ms),
    });

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    tracing::info!(
        profile = state.registry.name(),
        criteria = state.registry.criteria().len(),
        "listening on http://{}",
        cli.bind
    );

    serve(listener, state).await
}
