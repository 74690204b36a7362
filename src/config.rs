//! Bridge configuration - passed from the host glue

use serde_json::Value;

pub const ENV_BASE_URL: &str = "WALLET_BRIDGE_BASE_URL";
pub const ENV_LOG_JSON: &str = "WALLET_BRIDGE_LOG_JSON";
pub const ENV_MIN_SPENDING_LIMIT: &str = "WALLET_BRIDGE_MIN_SPENDING_LIMIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "0" => Some(LogFormat::Pretty),
            "json" | "1" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Bridge configuration. The host glue constructs this.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub app: String,
    /// Engine endpoint; the engine is initialized only when set
    pub base_url: Option<String>,
    pub engine_config: Value,
    /// Default for `options.wait_for_finalization` on transactions
    pub wait_for_finalization: bool,
    pub min_spending_limit: String,
    pub log_format: LogFormat,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app: String::new(),
            base_url: None,
            engine_config: Value::Object(Default::default()),
            wait_for_finalization: true,
            min_spending_limit: "0".into(),
            log_format: LogFormat::default(),
        }
    }
}

impl BridgeConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self { self.base_url = Some(url.into()); self }
    pub fn with_engine_config(mut self, config: Value) -> Self { self.engine_config = config; self }
    pub fn with_wait_for_finalization(mut self, wait: bool) -> Self { self.wait_for_finalization = wait; self }
    pub fn with_min_spending_limit(mut self, limit: impl Into<String>) -> Self { self.min_spending_limit = limit.into(); self }
    pub fn with_log_format(mut self, format: LogFormat) -> Self { self.log_format = format; self }

    /// Defaults overridden by `WALLET_BRIDGE_*` variables. Blank values are ignored.
    pub fn from_env(app: impl Into<String>) -> Self {
        let mut config = Self::new(app);
        if let Some(url) = env_value(ENV_BASE_URL) {
            config.base_url = Some(url);
        }
        if let Some(limit) = env_value(ENV_MIN_SPENDING_LIMIT) {
            config.min_spending_limit = limit;
        }
        if let Some(format) = env_value(ENV_LOG_JSON).and_then(|v| LogFormat::from_str(&v)) {
            config.log_format = format;
        }
        config
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::new("wallet");
        assert_eq!(config.app, "wallet");
        assert!(config.base_url.is_none());
        assert!(config.wait_for_finalization);
        assert_eq!(config.min_spending_limit, "0");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.engine_config.as_object().map(|m| m.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_builder() {
        let config = BridgeConfig::new("wallet")
            .with_base_url("https://api.example.test")
            .with_wait_for_finalization(false)
            .with_min_spending_limit("10")
            .with_log_format(LogFormat::Json)
            .with_engine_config(serde_json::json!({"timeout": 30}));
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.test"));
        assert!(!config.wait_for_finalization);
        assert_eq!(config.min_spending_limit, "10");
        assert_eq!(config.engine_config["timeout"], 30);
    }

    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_BASE_URL, " https://env.example.test ");
        std::env::set_var(ENV_LOG_JSON, "1");
        std::env::set_var(ENV_MIN_SPENDING_LIMIT, "");
        let config = BridgeConfig::from_env("wallet");
        std::env::remove_var(ENV_BASE_URL);
        std::env::remove_var(ENV_LOG_JSON);
        std::env::remove_var(ENV_MIN_SPENDING_LIMIT);

        assert_eq!(config.base_url.as_deref(), Some("https://env.example.test"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.min_spending_limit, "0");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::from_str(" JSON "), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_str("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::from_str("xml"), None);
    }
}
