use serde::Deserialize;

/// SDK configuration. Loaded from environment variables with the prefix
/// `FLAGKIT__`, or constructed directly by the host at init time.
#[derive(Debug, Clone, Deserialize)]
pub struct SdkConfig {
    #[serde(default)]
    pub env_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default)]
    pub decision_mode: DecisionMode,
    #[serde(default = "default_polling_interval_secs")]
    pub polling_interval_secs: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_enable_logs")]
    pub enable_logs: bool,
}

/// Where targeting and allocation decisions are made.
///
/// `Server`: the decision service applies targeting and allocation and the
/// catalog arrives pre-resolved. `Client`: the catalog carries rule trees and
/// allocation weights and this engine decides locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    #[default]
    Server,
    Client,
}

fn default_api_endpoint() -> String {
    "https://decision.flagkit.io/v2".to_string()
}
fn default_polling_interval_secs() -> u64 {
    60
}
fn default_request_timeout_ms() -> u64 {
    2000
}
fn default_enable_logs() -> bool {
    true
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            env_id: String::new(),
            api_key: String::new(),
            api_endpoint: default_api_endpoint(),
            decision_mode: DecisionMode::default(),
            polling_interval_secs: default_polling_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            enable_logs: default_enable_logs(),
        }
    }
}

impl SdkConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("FLAGKIT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SdkConfig::default();
        assert_eq!(cfg.decision_mode, DecisionMode::Server);
        assert_eq!(cfg.polling_interval_secs, 60);
        assert_eq!(cfg.request_timeout_ms, 2000);
        assert!(cfg.enable_logs);
    }

    #[test]
    fn test_decision_mode_wire_names() {
        let m: DecisionMode = serde_json::from_str("\"client\"").unwrap();
        assert_eq!(m, DecisionMode::Client);
        let m: DecisionMode = serde_json::from_str("\"server\"").unwrap();
        assert_eq!(m, DecisionMode::Server);
    }
}
