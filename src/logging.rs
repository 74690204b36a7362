use crate::config::{LogFormat, ENV_LOG_JSON};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber. `WALLET_BRIDGE_LOG_JSON=1` forces JSON.
/// A second call is a no-op.
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = format == LogFormat::Json
        || std::env::var(ENV_LOG_JSON)
            .map(|value| value == "1")
            .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
    tracing::debug!(format = format.as_str(), "logging initialized");
}
