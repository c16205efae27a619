//! Tutor Relay - Main entry point.

use anyhow::Result;
use tutor_common::config::Config;
use tutor_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_and_validate()?;

    init_logging(&config.observability.log_level, &config.observability.log_format);

    tracing::info!("Tutor Relay v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = tutor_relay::start_server(&config).await {
        tracing::error!(error = %e, "Tutor relay stopped");
        return Err(e);
    }

    Ok(())
}
