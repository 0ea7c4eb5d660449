//! tracing subscriber setup

use gtest_config::Config;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install the fmt subscriber once per process.
///
/// `RUST_LOG` wins over the configured filter. If another global
/// subscriber is already installed this does nothing.
pub fn init_logging(config: &Config) {
    let filter = config.log_filter();
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter));

        if fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_err()
        {
            tracing::debug!("global subscriber already installed, keeping it");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = Config::default();
        init_logging(&config);
        init_logging(&config);
        tracing::info!("still logging");
    }
}
