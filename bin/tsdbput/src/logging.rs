use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter, Layer as _};
use tsdbput_error::GenericError;

/// Initializes logging to standard error.
///
/// Filtering directives are read from `TSDBPUT_LOG_LEVEL`, defaulting to `info`. Setting `TSDBPUT_LOG_FORMAT_JSON` to
/// `true` or `1` switches to JSON output.
pub fn initialize_logging() -> Result<(), GenericError> {
    let is_json = std::env::var("TSDBPUT_LOG_FORMAT_JSON")
        .map(|s| s.trim().to_lowercase())
        .map(|s| s == "true" || s == "1")
        .unwrap_or(false);

    let level_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("TSDBPUT_LOG_LEVEL")
        .from_env_lossy();

    let fmt_layer = tracing_subscriber::fmt::Layer::new().with_writer(std::io::stderr);
    if is_json {
        tracing_subscriber::registry()
            .with(
                fmt_layer
                    .json()
                    .flatten_event(true)
                    .with_target(true)
                    .with_filter(level_filter),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer.with_filter(level_filter))
            .try_init()?;
    }

    Ok(())
}
