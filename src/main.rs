use clap::Parser;

use storefront::logging::setup_logging;
use storefront::{AppConfig, AppState, WebConfig, WebServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::parse();

    // Dropping the handle stops the logger.
    let _logger = setup_logging(config.log_dir.as_deref())?;
    log::info!("Starting {} v{}", storefront::NAME, storefront::VERSION);
    log::debug!("{:?}", config);

    let state = AppState::build(&config)?;
    let origins = config.cors_origins();
    log::info!("CORS origins: {}", origins.join(", "));

    WebServer::new(WebConfig::from(&config), state, &origins)
        .start()
        .await
}
