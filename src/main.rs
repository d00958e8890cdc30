use std::sync::Arc;

use foresight::config::Config;
use foresight::services::{PredictionService, ServiceSettings};
use foresight::sources::provider_from_config;
use foresight::AppState;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foresight=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    info!("Starting Foresight server on {}:{}", config.host, config.port);

    if config.live_mode {
        info!(
            "Live mode: {:?} provider, {} days of {} bars",
            config.data_provider, config.lookback_days, config.bar_interval
        );
    } else {
        warn!("ALPHA_VANTAGE_API_KEY missing or placeholder, serving demo forecasts");
    }

    let provider = provider_from_config(&config)?;
    let prediction_service =
        PredictionService::new(provider, ServiceSettings::from_config(&config));

    let state = AppState {
        config: config.clone(),
        prediction_service,
    };

    let app = foresight::app(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Foresight server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
