//! Tracing subscriber setup.
//!
//! Each `-v` lowers the threshold one step below `info`: exchanges and
//! subscriber transitions log at debug, per-packet dispatch at trace.
//! Refused route registrations and undecodable replies stay visible under
//! `--quiet`, which logs warnings only.

use tracing_subscriber::EnvFilter;

/// HTTP stack used by hub discovery; only its warnings are of interest.
const QUIET_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Filter directive for `-v`/`-q` counts.
///
/// `--quiet` wins over any number of `-v`.
pub fn directive(verbose: u8, quiet: bool) -> String {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    QUIET_DEPENDENCIES.iter().fold(level.to_owned(), |mut directive, crate_name| {
        directive.push(',');
        directive.push_str(crate_name);
        directive.push_str("=warn");
        directive
    })
}

/// Log to stderr, keeping stdout for command output.
///
/// A set `RUST_LOG` overrides `fallback` entirely.
pub fn init(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
