use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use market_analyzer::api::routes::{router, ApiState};
use market_analyzer::api::Dispatcher;
use market_analyzer::config::Config;
use market_analyzer::db::store::migrate;
use market_analyzer::error::Result;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    match cfg.database_url.as_deref() {
        Some(url) if cfg.auto_migrate => migrate(url).await?,
        Some(_) => info!("AUTO_MIGRATE disabled, assuming the schema is in place"),
        None => warn!("DATABASE_URL not set: data requests will answer 500 until it is configured"),
    }

    // --- HTTP API server ---
    let api_state = ApiState {
        dispatcher: Arc::new(Dispatcher::new(&cfg)),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
