// SPDX-License-Identifier: MIT OR Apache-2.0
//! `tracing` subscriber setup for hosts embedding the browser.

use crate::config::DEFAULT_LOG_FILTER;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Error when installing the subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A filter directive did not parse
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// A global subscriber is already installed
    #[error("Tracing already initialised: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Build a filter from `directives`, with `RUST_LOG` directives taking
/// precedence.
pub fn build_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    let mut filter = EnvFilter::try_new(directives)?;
    if let Ok(overrides) = std::env::var(EnvFilter::DEFAULT_ENV) {
        for directive in overrides.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(err) => eprintln!("Ignoring RUST_LOG directive '{directive}': {err}"),
            }
        }
    }
    Ok(filter)
}

/// Install a global fmt subscriber
pub fn try_init_tracing(directives: &str) -> Result<(), LoggingError> {
    tracing_subscriber::registry()
        .with(build_filter(directives)?)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    tracing::info!("Starting x3d_browser v{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Install a global fmt subscriber, falling back to the default filter if
/// `directives` is invalid. Does nothing if a subscriber is already set.
pub fn init_tracing(directives: &str) {
    match try_init_tracing(directives) {
        Ok(()) | Err(LoggingError::AlreadyInitialized(_)) => {}
        Err(LoggingError::Filter(err)) => {
            eprintln!("Invalid log filter '{directives}' ({err}); using defaults");
            if let Err(err) = try_init_tracing(DEFAULT_LOG_FILTER) {
                eprintln!("Failed to initialise tracing with the default filter: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parsing() {
        assert!(build_filter(DEFAULT_LOG_FILTER).is_ok());
        assert!(matches!(build_filter("x3d_scene=loud"), Err(LoggingError::Filter(_))));
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        init_tracing("x3d_scene=loud");
        assert!(matches!(
            try_init_tracing(DEFAULT_LOG_FILTER),
            Err(LoggingError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_second_init_reports_error() {
        init_tracing("x3d_browser=debug");
        assert!(matches!(
            try_init_tracing(DEFAULT_LOG_FILTER),
            Err(LoggingError::AlreadyInitialized(_))
        ));
    }
}
