use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Installe le subscriber tracing (RUST_LOG prioritaire sur APP_LOG_LEVEL)
pub fn init(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
