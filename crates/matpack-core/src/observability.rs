//! Observability infrastructure for Matpack.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors used across all Matpack
//! components.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `matpack_data=debug`)
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for run-registry operations with standard fields.
#[must_use]
pub fn registry_span(operation: &str, composition: &str) -> Span {
    tracing::info_span!(
        "registry",
        op = operation,
        composition = composition,
    )
}

/// Creates a span for archive-production operations.
#[must_use]
pub fn archive_span(operation: &str, composition: &str, run_id: &str, sub_run: &str) -> Span {
    tracing::info_span!(
        "archive",
        op = operation,
        composition = composition,
        run_id = run_id,
        sub_run = sub_run,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_succeeds() {
        // Should not panic (uses Once internally)
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Pretty); // Second call should be no-op
    }

    #[test]
    fn test_registry_span_creates_span() {
        let span = registry_span("schedule", "ZrCuAl");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }

    #[test]
    fn test_archive_span_creates_span() {
        let span = archive_span("produce", "ZrCuAl", "1", "0");
        let _guard = span.enter();
        tracing::info!("archive message");
    }
}
