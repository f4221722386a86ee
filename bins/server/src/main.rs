//! SplitLedger API Server
//!
//! Main entry point for the expense splitting and settlement service.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use splitledger_api::{AppState, create_router};
use splitledger_db::connect;
use splitledger_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let reminder_timezone = config
        .reminders
        .tz()
        .map_err(anyhow::Error::msg)
        .context("Invalid reminder timezone")?;

    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(&config.jwt);

    let state = AppState::new(db, jwt_service, reminder_timezone);

    if config.reminders.enabled {
        let runner = state.reminders.clone();
        let interval = Duration::from_secs(config.reminders.scan_interval_secs.max(1));
        info!(
            interval_secs = interval.as_secs(),
            timezone = %reminder_timezone,
            "Reminder scan enabled"
        );
        tokio::spawn(async move { runner.run(interval).await });
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
