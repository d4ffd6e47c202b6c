use std::env;

use burgeria_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. Calling twice is a no-op.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter);

    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn init_from_env() {
    let level = env::var("BURGERIA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init(&LoggingConfig { level, format: LogFormat::Compact });
}
