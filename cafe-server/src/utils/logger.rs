//! Logging Infrastructure
//!
//! `RUST_LOG` wins over the configured level. Production writes JSON lines;
//! a daily rolling JSON file is added when the log directory exists.

use std::path::Path;

use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logger (console only, info level)
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional JSON console output and file output
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);
    layers.push(if json {
        console.json().boxed()
    } else {
        console.boxed()
    });

    if let Some(dir) = log_dir.filter(|dir| Path::new(dir).exists()) {
        let file_appender = tracing_appender::rolling::daily(dir, "cafe-server");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(file_appender)
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();
}
