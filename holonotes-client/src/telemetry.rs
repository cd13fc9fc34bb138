//! Logging initialization.

use crate::error::ClientError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "holonotes_client=info,holonotes_store=info,warn";

/// Install the global subscriber. `RUST_LOG` wins over `filter`.
///
/// Logs go to stderr so they never interleave with command output.
pub fn init_logging(filter: Option<&str>) -> Result<(), ClientError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .map_err(|e| ClientError::Telemetry(format!("invalid log filter: {e}")))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| ClientError::Telemetry(format!("failed to init subscriber: {e}")))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        filter = filter.unwrap_or(DEFAULT_FILTER),
        "logging initialized"
    );
    Ok(())
}
