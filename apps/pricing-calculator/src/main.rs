use core_config::tracing::{init_tracing, install_color_eyre};
use domain_pricing::{handlers, CleverCloudCatalog, InMemoryEstimationRepository, PricingService};
use tracing::info;

mod config;
mod health;
mod server;
mod shutdown;
mod spa;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(
        api_url = %config.catalog.api_url,
        timeout = ?config.catalog.timeout,
        default_zone = %config.catalog.default_zone,
        "Using Clever Cloud pricing catalog"
    );

    let catalog = CleverCloudCatalog::new(&config.catalog.api_url, config.catalog.timeout)?
        .with_default_zone(&config.catalog.default_zone);

    // Estimations live for the lifetime of the process
    let service = PricingService::new(catalog, InMemoryEstimationRepository::new())
        .with_default_zone(&config.catalog.default_zone);

    let app = server::create_router(handlers::router(service), &config);

    info!(
        name = config.app.name,
        version = config.app.version,
        environment = %config.environment,
        web_dir = %config.web_dir.display(),
        "Starting pricing calculator (30s graceful shutdown)"
    );

    server::serve(app, &config.server, server::SHUTDOWN_TIMEOUT)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Pricing calculator shutdown complete");
    Ok(())
}
