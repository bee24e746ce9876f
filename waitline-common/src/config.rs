//! Configuration management for Waitline services.
//!
//! All services share one configuration file at `~/.waitline/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (WAITLINE_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `WAITLINE_CONFIG` → path of the config file itself
//! - `WAITLINE_BIND_ADDRESS` → network.bind
//! - `WAITLINE_CLOVA_PORT` → services.clova.port
//! - `WAITLINE_LOG_LEVEL` → observability.log_level
//! - `WAITLINE_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default port of the Clova webhook service.
pub const DEFAULT_CLOVA_PORT: u16 = 4440;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".waitline"),
        |dirs| dirs.home_dir().join(".waitline"),
    )
}

/// Get the configuration file path.
///
/// `WAITLINE_CONFIG` takes precedence over the default location.
pub fn config_path() -> PathBuf {
    std::env::var("WAITLINE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| config_dir().join("config.json"))
}

// ============================================================================
// Network Configuration
// ============================================================================

/// Global network configuration.
///
/// Default bind address is `127.0.0.1` (local only). Set to `0.0.0.0` when the
/// webhook must be reachable from the Clova platform directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Public URL registered as the extension endpoint (optional).
    /// Used when the service is behind a reverse proxy or tunnel.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            public_url: None,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

// ============================================================================
// Services Port Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicesConfig {
    /// Clova webhook service
    #[serde(default)]
    pub clova: ServicePortConfig,
}

/// Individual service port configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicePortConfig {
    #[serde(default)]
    pub port: Option<u16>,
}

// ============================================================================
// Clova Configuration
// ============================================================================

/// Liveness route.
pub const HEALTH_PATH: &str = "/health";
/// Readiness route.
pub const READY_PATH: &str = "/ready";
/// Read-only waiting snapshot route.
pub const WAITING_PATH: &str = "/api/v1/waiting";

/// Routes served next to the webhook; `webhook_path` must not reuse them.
pub const RESERVED_PATHS: &[&str] = &[HEALTH_PATH, READY_PATH, WAITING_PATH];

/// Clova extension settings: endpoint shape, stores and spoken responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClovaConfig {
    /// Path the extension endpoint is mounted on
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Stores that can be listed to the user, in announcement order
    #[serde(default = "default_stores")]
    pub stores: Vec<String>,

    /// Spoken response templates
    #[serde(default)]
    pub responses: ResponsesConfig,
}

impl Default for ClovaConfig {
    fn default() -> Self {
        Self {
            webhook_path: default_webhook_path(),
            body_limit_bytes: default_body_limit_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            stores: default_stores(),
            responses: ResponsesConfig::default(),
        }
    }
}

fn default_webhook_path() -> String {
    "/clova".into()
}

fn default_body_limit_bytes() -> usize {
    64 * 1024
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_stores() -> Vec<String> {
    vec!["강남점".into(), "홍대점".into(), "잠실점".into()]
}

/// Response text templates spoken back to the user.
///
/// Waiting counts are spoken as `waiting_prefix + count + waiting_suffix`, and
/// the store list as `stores_prefix + "A, B, " + stores_suffix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsesConfig {
    /// Usage guide, spoken on launch and for unrecognized intents
    pub guide: String,
    /// The user asked about waiting without naming a store
    pub no_store: String,
    /// The named store has no registered waiting list
    pub unknown_store: String,
    pub waiting_prefix: String,
    pub waiting_suffix: String,
    pub stores_prefix: String,
    pub stores_suffix: String,
    /// Spoken when the session ends
    pub end: String,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            guide: "대기 인원이 궁금한 매장 이름을 말씀해 주세요. 매장 목록을 알려달라고 하시면 등록된 매장을 알려드립니다.".into(),
            no_store: "매장 이름을 함께 말씀해 주세요.".into(),
            unknown_store: "대기 정보가 없는 매장입니다.".into(),
            waiting_prefix: "현재 대기 인원은 ".into(),
            waiting_suffix: "명입니다.".into(),
            stores_prefix: "등록된 매장은 ".into(),
            stores_suffix: "입니다.".into(),
            end: "이용해 주셔서 감사합니다.".into(),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure for Waitline services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub services: ServicesConfig,

    /// Clova extension configuration
    #[serde(default)]
    pub clova: ClovaConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `WAITLINE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    ///
    /// Unparseable port values are ignored and leave the current value intact.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("WAITLINE_BIND_ADDRESS") {
            self.network.bind = bind;
        }

        if let Some(port) = lookup("WAITLINE_CLOVA_PORT") {
            match port.parse() {
                Ok(p) => self.services.clova.port = Some(p),
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid WAITLINE_CLOVA_PORT"),
            }
        }

        if let Some(level) = lookup("WAITLINE_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Some(format) = lookup("WAITLINE_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create config directory {}", dir.display())
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    // =========================================================================
    // Endpoint convenience methods
    // =========================================================================

    pub fn bind_address(&self) -> &str {
        &self.network.bind
    }

    pub fn clova_port(&self) -> u16 {
        self.services.clova.port.unwrap_or(DEFAULT_CLOVA_PORT)
    }

    /// Local endpoint of the Clova webhook.
    pub fn clova_endpoint(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.bind_address(),
            self.clova_port(),
            self.clova.webhook_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.clova_port(), DEFAULT_CLOVA_PORT);
        assert_eq!(config.bind_address(), "127.0.0.1");
        assert_eq!(config.clova.webhook_path, "/clova");
        assert_eq!(config.clova.stores.len(), 3);
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "clova": {
                "stores": ["A", "B"],
                "responses": { "guide": "help" }
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.clova.stores, vec!["A", "B"]);
        assert_eq!(config.clova.responses.guide, "help");
        // Untouched templates keep their defaults
        assert_eq!(
            config.clova.responses.end,
            ResponsesConfig::default().end
        );
        assert_eq!(config.clova.body_limit_bytes, 64 * 1024);
    }

    #[test]
    fn test_observability_aliases() {
        let json = r#"{ "observability": { "level": "debug", "format": "json" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("WAITLINE_BIND_ADDRESS", "0.0.0.0"),
            ("WAITLINE_CLOVA_PORT", "8080"),
            ("WAITLINE_LOG_LEVEL", "debug"),
        ]);

        let mut config = Config::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind_address(), "0.0.0.0");
        assert_eq!(config.clova_port(), 8080);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_invalid_port_override_ignored() {
        let mut config = Config::default();
        config.services.clova.port = Some(9000);
        config.apply_overrides_from(|key| {
            (key == "WAITLINE_CLOVA_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.clova_port(), 9000);
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.clova.stores = vec!["본점".into()];
        config.services.clova.port = Some(5000);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.clova.stores, vec!["본점"]);
        assert_eq!(loaded.clova_port(), 5000);
    }

    #[test]
    fn test_load_from_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_clova_endpoint() {
        let mut config = Config::default();
        config.services.clova.port = Some(4000);
        assert_eq!(config.clova_endpoint(), "http://127.0.0.1:4000/clova");
    }
}
