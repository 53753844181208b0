//! Logging initialization.
//!
//! Logs go to stderr so stdout stays clean for reports. `RUST_LOG` overrides
//! everything; otherwise the level comes from `--verbose` or the `[logging]`
//! section of the config.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Filter directive for our own crates at `level`; dependencies stay at warn.
fn directive(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    let level = if LEVELS.contains(&level.as_str()) {
        level
    } else {
        "info".to_string()
    };
    format!("warn,pagelint={level},pagelint_core={level}")
}

/// Initialize the logging subsystem.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the config, with CLI overrides.
pub fn init_from_config(config: &pagelint_core::Config, verbose: bool, json_logs: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let json_format = json_logs || config.logging.format == "json";
    init(level, json_format);
}
