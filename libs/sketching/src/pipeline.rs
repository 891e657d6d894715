use std::str::FromStr;

use tracing::Subscriber;
use tracing_subscriber::{filter::Directive, prelude::*, EnvFilter, Registry};

/// Build the subscriber a long running process logs through. The caller decides
/// whether to install it globally.
pub fn start_logging_pipeline(
    log_filter: crate::LogLevel,
) -> Result<Box<dyn Subscriber + Send + Sync>, String> {
    // The cache is extremely chatty at trace, so it only gets there when asked for by name.
    let cache_directive = Directive::from_str("dirprovd_lib::cache=debug")
        .map_err(|err| format!("Invalid directive during log setup: {}", err))?;

    let mut logging_filter = EnvFilter::builder()
        .with_default_directive(log_filter.into())
        .parse("")
        .map_err(|err| format!("Failed to create logging filter: {}", err))?;

    if log_filter != crate::LogLevel::Trace {
        logging_filter = logging_filter.add_directive(cache_directive);
    }

    eprintln!(
        "Logging filter initialized: {:?}",
        logging_filter.to_string()
    );

    let forest_layer = tracing_forest::ForestLayer::default().with_filter(logging_filter);
    Ok(Box::new(Registry::default().with(forest_layer)))
}
