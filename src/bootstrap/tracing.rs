//! Setup for the application tracing.
//!
//! It redirects tracing output to stdout at the verbosity configured in
//! `[core] log_level`. Called once; later calls are no-ops.
use std::sync::Once;

use kraken_configuration::Configuration;
use tracing::debug;
use tracing::level_filters::LevelFilter;

static INIT: Once = Once::new();

/// Initializes the global tracing subscriber from `cfg.core.log_level`.
///
/// # Panics
///
/// Panics if `log_level` is not one of `off`, `error`, `warn`, `info`, `debug`, `trace`.
pub fn setup(cfg: &Configuration) {
    let filter = level_filter(&cfg.core.log_level);

    if filter == LevelFilter::OFF {
        return;
    }

    INIT.call_once(|| {
        tracing_subscriber::fmt().with_max_level(filter).init();
        debug!("tracing initialized at {filter}");
    });
}

fn level_filter(log_level: &str) -> LevelFilter {
    log_level
        .parse()
        .unwrap_or_else(|_| panic!("unrecognized log_level \"{log_level}\", expected one of: off, error, warn, info, debug, trace"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_known_levels() {
        assert_eq!(level_filter("info"), LevelFilter::INFO);
        assert_eq!(level_filter("off"), LevelFilter::OFF);
    }

    #[test]
    #[should_panic(expected = "unrecognized log_level")]
    fn it_panics_on_an_unknown_level() {
        level_filter("not-a-level");
    }
}
