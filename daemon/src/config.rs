//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tokengate_types::EngineParams;

/// Configuration for the TokenGate daemon.
///
/// Can be loaded from a TOML file via [`DaemonConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). CLI flags and environment
/// variables override file values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Port for the HTTP API.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Data directory for persistent storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Run with in-memory stores only (nothing survives a restart).
    #[serde(default)]
    pub ephemeral: bool,

    /// Seconds between reverification sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Challenge lifetime in seconds.
    #[serde(default = "default_nonce_ttl")]
    pub nonce_ttl_secs: u64,

    /// Upper bound on simultaneously-live challenges.
    #[serde(default = "default_nonce_capacity")]
    pub nonce_capacity: usize,

    /// Signing domain name for ticket digests.
    #[serde(default = "default_domain_name")]
    pub domain_name: String,

    /// Signing domain version; bump to invalidate outstanding tickets.
    #[serde(default = "default_domain_version")]
    pub domain_version: String,

    /// Chain the claimed addresses live on.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Optional time-box for grants, seconds from verification.
    #[serde(default)]
    pub assignment_ttl_secs: Option<u64>,

    /// Base URL of the marketplace data API.
    #[serde(default = "default_asset_url")]
    pub asset_provider_url: String,

    /// API key for the marketplace, if it requires one.
    #[serde(default)]
    pub asset_api_key: Option<String>,

    /// Base URL of the platform role API.
    #[serde(default = "default_platform_url")]
    pub platform_api_url: String,

    /// Bearer token for the platform role API.
    #[serde(default)]
    pub platform_token: String,

    /// Webhook for outcome notifications. Unset logs outcomes instead.
    #[serde(default)]
    pub notify_webhook_url: Option<String>,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_port() -> u16 {
    7410
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tokengate_data")
}

fn default_sweep_interval() -> u64 {
    900
}

fn default_nonce_ttl() -> u64 {
    300
}

fn default_nonce_capacity() -> usize {
    10_000
}

fn default_domain_name() -> String {
    "TokenGate Verification".to_string()
}

fn default_domain_version() -> String {
    "1".to_string()
}

fn default_chain_id() -> u64 {
    1
}

fn default_asset_url() -> String {
    "https://assets.example/v1".to_string()
}

fn default_platform_url() -> String {
    "https://platform.example/api".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("DaemonConfig is always serializable to TOML")
    }

    /// The engine parameter slice of this config.
    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            nonce_ttl_secs: self.nonce_ttl_secs,
            nonce_capacity: self.nonce_capacity,
            domain_name: self.domain_name.clone(),
            domain_version: self.domain_version.clone(),
            chain_id: self.chain_id,
            assignment_ttl_secs: self.assignment_ttl_secs,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_port: default_rpc_port(),
            data_dir: default_data_dir(),
            ephemeral: false,
            sweep_interval_secs: default_sweep_interval(),
            nonce_ttl_secs: default_nonce_ttl(),
            nonce_capacity: default_nonce_capacity(),
            domain_name: default_domain_name(),
            domain_version: default_domain_version(),
            chain_id: default_chain_id(),
            assignment_ttl_secs: None,
            asset_provider_url: default_asset_url(),
            asset_api_key: None,
            platform_api_url: default_platform_url(),
            platform_token: String::new(),
            notify_webhook_url: None,
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = DaemonConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_port, config.rpc_port);
        assert_eq!(parsed.sweep_interval_secs, config.sweep_interval_secs);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 7410);
        assert_eq!(config.nonce_ttl_secs, 300);
        assert!(!config.ephemeral);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_port = 9999
            sweep_interval_secs = 60
            notify_webhook_url = "https://hooks.example/outcomes"
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.rpc_port, 9999);
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(
            config.notify_webhook_url.as_deref(),
            Some("https://hooks.example/outcomes")
        );
        assert_eq!(config.nonce_ttl_secs, 300); // default
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = DaemonConfig::from_toml_file(std::path::Path::new("/nonexistent/tg.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn engine_params_mirror_the_config() {
        let mut config = DaemonConfig::default();
        config.nonce_ttl_secs = 120;
        config.chain_id = 5;
        let params = config.engine_params();
        assert_eq!(params.nonce_ttl_secs, 120);
        assert_eq!(params.chain_id, 5);
    }
}
