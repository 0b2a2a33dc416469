use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tollgate_server::{cli::Cli, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tollgate_server=info,tollgate_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Refusing to start: {}", e);
            return Err(e.into());
        }
    };

    info!(?config, "Starting Tollgate");
    if config.api_key.is_none() {
        warn!("API_KEY is not set: protected routes and MCP discovery will reject every call");
    }

    let state = AppState::new(&config)?;

    if let Err(e) = tollgate_server::serve(cli.listen, state).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
