//! Logging setup
//!
//! Installs a `tracing-subscriber` with an `EnvFilter` read from `RUST_LOG` and
//! either human-readable or JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "coinboard=debug,tower_http=info,info";

/// Initializes the global tracing subscriber
///
/// # Returns
/// * `Ok(())` on success
/// * `Err` if a global subscriber is already installed
pub fn init_tracing(json: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}
