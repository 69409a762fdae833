use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize plain console logging.
///
/// - **Log Level**: `LOG_LEVEL` environment variable (default: "info")
/// - **Filtering**: `RUST_LOG` wins when set; sqlx is kept at warn
/// - **Format**: Compact, with file and line numbers, written to stderr
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "escolar={level},escolar_identity={level},escolar_session={level},escolar_db={level},sqlx=warn",
            level = log_level
        ))
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
