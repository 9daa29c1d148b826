use std::io;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, DEFAULT_LOG_LEVEL};

/// Installs the JSON log subscriber. Safe to call more than once; later calls
/// keep the first subscriber.
pub fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let installed = json_subscriber(filter, io::stdout).try_init().is_ok();

    if installed {
        tracing::debug!(
            service = %config.service_name,
            stage = %config.stage,
            environment = %config.environment,
            "logging initialized"
        );
    }
}

// One JSON object per line, each stamped with its time and level.
fn json_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .with_target(false)
        .with_writer(writer)
        .finish()
}
