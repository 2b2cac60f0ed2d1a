//! Log output for the CLI.
//!
//! The library emits `tracing` events; only the binary installs a
//! subscriber. `RUST_LOG` takes precedence over the verbosity flag.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity level (`-v` count)
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "semantic_manifest=warn",
        1 => "semantic_manifest=info",
        2 => "semantic_manifest=debug",
        _ => "semantic_manifest=trace",
    }
}

/// Install a stderr subscriber. Safe to call more than once.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(0), "semantic_manifest=warn");
        assert_eq!(default_directive(2), "semantic_manifest=debug");
        assert_eq!(default_directive(9), "semantic_manifest=trace");
    }
}
