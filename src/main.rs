use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motorista_admin::cli::{self, Cli};
use motorista_admin::config::Config;
use motorista_admin::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(api_url) = &args.api_url {
        config.api.base_url = api_url.clone();
    }

    // Initialize logging
    let log_level = args
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("motorista-admin v{}", env!("CARGO_PKG_VERSION"));

    let ctx = AppContext::new(config)?;

    // Read the persisted session before any guard decision is made.
    ctx.session.restore();
    ctx.on_activity();

    cli::run_command(&args, &ctx).await
}
