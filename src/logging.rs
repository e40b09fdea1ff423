//! Diagnostic logging setup.
//!
//! Everything goes to stderr: stdout carries the device's console text.

use crate::bridge::PACKET_TARGET;
use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Build the event filter: `RUST_LOG` wins, then the configured directive.
///
/// The configured directive always lets frame reports through unless it names
/// the `mcumgr` target itself. `RUST_LOG` is taken as is.
/// An unparsable directive falls back to `info` rather than silencing output.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| configured_filter(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn configured_filter(level: &str) -> Result<EnvFilter, ParseError> {
    let filter = EnvFilter::try_new(level)?;
    if level.contains(PACKET_TARGET) {
        return Ok(filter);
    }
    Ok(filter.add_directive(format!("{PACKET_TARGET}=info").parse()?))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(config));

    match config.format {
        LogFormat::Pretty => {
            let _ = builder.pretty().try_init();
        }
        LogFormat::Compact => {
            let _ = builder.compact().try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
