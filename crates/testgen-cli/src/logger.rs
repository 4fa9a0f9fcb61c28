use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging.
///
/// The level is read from `RUST_LOG` and defaults to `info`. Records emitted through
/// the `log` facade by testgen-core are forwarded to the same subscriber.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
