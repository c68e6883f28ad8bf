//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output (development)
    #[default]
    Pretty,
    /// JSON structured output (production)
    Json,
}

impl LogFormat {
    /// Parse log format from string, "text" is accepted as an alias of pretty
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize the global tracing subscriber
///
/// `verbose` raises the default level to debug for this crate.
pub fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        format!("{},tripfuel=debug", config.level)
    } else {
        config.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::parse(&config.format) {
        LogFormat::Pretty => {
            registry.with(fmt::layer().with_target(false)).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false);

            registry.with(json_layer).init();
        }
    }
}
