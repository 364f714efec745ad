use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default directive when `RUST_LOG` is absent.
const DEFAULT_FILTER: &str = "info,service=info,sqlx=warn";

/// Initialize tracing subscriber with compact human-readable output.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info` for the service crates and `warn` for sqlx
/// - Writes to stdout
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set
/// - Emits one JSON object per event, span fields included
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(true)
        .json()
        .with_current_span(true)
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize logging by format name (`"json"` or anything else for compact).
///
/// A configured `level` is used only when `RUST_LOG` is unset.
pub fn init_logging(format: &str, level: Option<&str>) {
    let fallback = level.unwrap_or(DEFAULT_FILTER);
    let filter = env_filter(fallback);
    let _ = if format.eq_ignore_ascii_case("json") {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .with_writer(io::stdout)
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .with_writer(io::stdout)
            .try_init()
    };
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}
