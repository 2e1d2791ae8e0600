//! user-insights: in-memory user analytics service
//!
//! Serves the upload, analytics and self-evaluation endpoints over HTTP.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use user_insights::api::{create_router, AppState};
use user_insights::{ingest_slice, Config};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser)]
#[command(name = "user-insights")]
#[command(about = "In-memory user analytics service")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "INSIGHTS_CONFIG", default_value = "user-insights.toml")]
    config: PathBuf,

    /// HTTP port (overrides config file)
    #[arg(short, long, env = "INSIGHTS_PORT")]
    port: Option<u16>,

    /// Bind address (overrides config file)
    #[arg(long, env = "INSIGHTS_BIND")]
    bind: Option<IpAddr>,

    /// Log output format
    #[arg(long, env = "INSIGHTS_LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// JSON array of user records to load before serving
    #[arg(long, env = "INSIGHTS_PRELOAD")]
    preload: Option<PathBuf>,
}

const DEFAULT_LOG_FILTER: &str = "user_insights=info";

/// `RUST_LOG` directives when set, the service default otherwise
fn log_filter(directives: Option<String>) -> Result<EnvFilter, ParseError> {
    match directives {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(DEFAULT_LOG_FILTER),
    }
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    info!("Starting user-insights");
    info!("Config file: {}", cli.config.display());

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.server.http_port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    config.validate()?;

    let state = Arc::new(AppState::new(&config)?);
    info!(
        base_url = %config.evaluation_base_url(),
        timeout_ms = config.evaluation.timeout_ms,
        targets = state.harness.targets().len(),
        "Evaluation harness ready"
    );

    if let Some(path) = cli.preload {
        let bytes = tokio::fs::read(&path).await?;
        match ingest_slice(&state.store, bytes).await {
            Ok(report) => info!(
                file = %path.display(),
                record_count = report.record_count,
                "Preloaded user records"
            ),
            Err(e) => warn!(file = %path.display(), error = %e, "Preload failed"),
        }
    }

    let app = create_router(state);

    let addr = config.listen_addr();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
