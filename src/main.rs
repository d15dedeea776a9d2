use envision::config::Config;
use envision::logger::{self, log_startup_info, LoggerConfig};
use envision::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    logger::init_with_config(LoggerConfig::development())?;

    let config = Config::from_env();
    let port = config.port.unwrap_or(8787);

    match config.gemini.as_ref().and_then(|g| g.api_key.as_ref()) {
        Some(key) => {
            log::info!("✅ API key found in environment");
            log::debug!("API key length: {}", key.len());
        }
        None => {
            log::error!("❌ No API key in environment; generation requests will fail with 500");
            log::warn!("💡 Set API_KEY (or GEMINI_API_KEY) to enable generation");
        }
    }

    let state = AppState::from_config(&config);
    log_startup_info("envision", env!("CARGO_PKG_VERSION"), port);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("🌐 Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;

    Ok(())
}
