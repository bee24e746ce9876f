//! Waitline Clova - Main entry point.

use anyhow::Result;
use waitline_clova::start_server;
use waitline_common::config::Config;
use waitline_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load_and_validate()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Waitline Clova v{}", env!("CARGO_PKG_VERSION"));

    start_server(&config).await
}
