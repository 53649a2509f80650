//! Opt-in tracing subscriber for hosts and tests.
//!
//! The resolver crates only emit `tracing` events and spans. A host that wants
//! to see them calls [`init_tracing`], which reads two environment variables:
//!
//! - `DRES_LOG` (falling back to `RUST_LOG`): an `EnvFilter` directive such as
//!   `debug` or `dres_resolver::incremental=trace`
//! - `DRES_LOG_FORMAT`: `text` (default), `tree` or `json`
//!
//! ```bash
//! DRES_LOG=debug DRES_LOG_FORMAT=tree cargo test -p dres-resolver
//! ```
//!
//! Without either filter variable nothing is installed.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const FILTER_VAR: &str = "DRES_LOG";
const FORMAT_VAR: &str = "DRES_LOG_FORMAT";

/// How events are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One flat `fmt` line per event.
    #[default]
    Text,
    /// Indented span tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Parse a format name; unknown names select `Text`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tree" => LogFormat::Tree,
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// The filter directive requested through the environment, if any.
pub fn requested_filter() -> Option<String> {
    std::env::var(FILTER_VAR)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
}

/// Install a global subscriber when `DRES_LOG` or `RUST_LOG` is set.
///
/// Returns `true` if a subscriber was installed by this call. A second call,
/// or a call after another subscriber was set, returns `false`.
pub fn init_tracing() -> bool {
    let Some(directive) = requested_filter() else {
        return false;
    };
    let format = std::env::var(FORMAT_VAR)
        .map(|name| LogFormat::parse(&name))
        .unwrap_or_default();
    install(format, &directive)
}

/// Install a subscriber with an explicit format and filter directive.
pub fn install(format: LogFormat, directive: &str) -> bool {
    let filter = EnvFilter::builder().parse_lossy(directive);
    match format {
        LogFormat::Tree => {
            let layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_targets(true);
            Registry::default().with(filter).with(layer).try_init().is_ok()
        }
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(layer).try_init().is_ok()
        }
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("bogus"), LogFormat::Text);
    }
}
