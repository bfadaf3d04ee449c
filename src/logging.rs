//! Logging setup for the binary
//!
//! Diagnostics go to stderr; stdout is reserved for dump and listing data.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "SHAREWALK_LOG";

/// Filter used when `SHAREWALK_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "sharewalk=debug,warn"
    } else {
        "sharewalk=info,warn"
    }
}

/// Install the global fmt subscriber. Calling it twice is harmless.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(default_filter(false), "sharewalk=info,warn");
        assert_eq!(default_filter(true), "sharewalk=debug,warn");
    }

    #[test]
    fn test_init_twice() {
        init_logging(false);
        init_logging(true);
    }
}
