//! Tracing subscriber setup for the CLI.
//!
//! The library only emits events; installing a subscriber is the binary's
//! job, so embedding applications keep full control of their own logging.

use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// * `verbose` - 0 = info, 1 = debug, 2+ = trace
/// * `quiet` - only errors
///
/// `RUST_LOG` overrides the verbosity flags when set.
pub fn init_logging(verbose: u8, quiet: bool) {
    let default_directive = if quiet {
        "adaptive_images=error"
    } else {
        match verbose {
            0 => "adaptive_images=info",
            1 => "adaptive_images=debug",
            _ => "adaptive_images=trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can only be installed once per process, so unit
    // tests only cover the filter directives themselves.

    #[test]
    fn filter_directives_parse() {
        for directive in [
            "adaptive_images=error",
            "adaptive_images=info",
            "adaptive_images=debug",
            "adaptive_images=trace",
        ] {
            assert!(EnvFilter::try_new(directive).is_ok());
        }
    }
}
