//! Structured Logging Configuration
//!
//! Provides configurable logging with:
//! - JSON output for automation (LOG_FORMAT=json)
//! - Human-readable output for interactive use (default)
//!
//! # Usage
//!
//! ```rust,ignore
//! use aad_common::logging::init_logging;
//!
//! fn main() {
//!     init_logging("aad-users");
//!     tracing::info!(tenant_id = %tenant, "Reading users");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: Set to "json" for JSON output, anything else for text (default: text)
//! - `RUST_LOG`: Standard log level filter (default: info)
//!   Examples: `RUST_LOG=debug`, `RUST_LOG=aad_users=trace,aad_graph=debug`
//!
//! Log output goes to stderr so the JSON result printed on stdout stays clean.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging for the given service.
///
/// Reads LOG_FORMAT to choose JSON or text output and RUST_LOG for
/// filtering (defaults to INFO). Calling it twice is a no-op.
pub fn init_logging(service_name: &str) {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let json = log_format.eq_ignore_ascii_case("json");

    let initialized = if json {
        init_json_logging(default_filter())
    } else {
        init_text_logging(default_filter())
    };

    if initialized {
        tracing::debug!(service = %service_name, json, "Logging initialized");
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_json_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()
        .is_ok()
}

fn init_text_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging("first");
        init_logging("second");
    }
}
