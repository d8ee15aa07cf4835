//! AppDynamics data source server.
//!
//! Serves metric queries, health checks and name discovery to a
//! visualization host.

use appd_datasource::config::{DataSourceConfig, ServerConfig};
use appd_datasource::datasource::{DataSource, DataSourceApi};
use appd_datasource::timeexpr::DateMath;
use appd_datasource::transport::HttpTransport;
use appd_datasource::web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("appd_datasource=info".parse()?))
        .init();

    // Load configuration
    let server_cfg = ServerConfig::load();
    let ds_cfg = DataSourceConfig::load()?;
    tracing::info!("Starting data source on port {}...", server_cfg.http_port);
    tracing::info!("Using controller at {}", ds_cfg.base_url());
    if !ds_cfg.hosts().is_empty() {
        tracing::info!("Known hosts: {}", ds_cfg.hosts().join(", "));
    }

    let transport = Arc::new(HttpTransport::new(&ds_cfg)?);
    let datasource = Arc::new(DataSource::new(ds_cfg, transport, Arc::new(DateMath::new())));

    let health = datasource.check_health().await;
    tracing::info!("Initial health check: {}", health.message);

    // Start web server
    let server = Server::new(server_cfg, datasource);
    server.start().await?;

    Ok(())
}
