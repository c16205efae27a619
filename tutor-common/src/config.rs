//! Configuration management for the tutor services.
//!
//! The relay reads a single JSON file at `~/.hcm-tutor/config.json`
//! (or the path in `TUTOR_CONFIG`). Every field has a default, so a
//! missing file is not an error.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `TUTOR_CONFIG` → path of the config file
//! - `PORT` → network.port
//! - `TUTOR_BIND_ADDRESS` → network.bind
//! - `TUTOR_LOG_LEVEL` → observability.log_level
//! - `TUTOR_LOG_FORMAT` → observability.log_format
//! - `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) → secrets.gemini_api_key
//! - `GEMINI_MODEL` → llm.model

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Environment variable holding an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "TUTOR_CONFIG";

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".hcm-tutor"),
        |dirs| dirs.home_dir().join(".hcm-tutor"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| config_dir().join("config.json"), PathBuf::from)
}

// ============================================================================
// Network Configuration
// ============================================================================

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Bind address. Default: "127.0.0.1" (local only)
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Listening port. Default: 5000
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    5000
}

// ============================================================================
// Secrets
// ============================================================================

/// Credentials. Never serialized back out by `Debug` consumers in logs.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    /// Gemini API key, sent as the `key` query parameter.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

// ============================================================================
// LLM Configuration
// ============================================================================

/// Upstream generative API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name, without the `models/` prefix.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (overridable for tests and proxies).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: i64,

    /// Upper bound on a single upstream call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_max_output_tokens() -> i64 {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// ============================================================================
// Relay Configuration
// ============================================================================

/// Conversation relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Retention ceiling: maximum turns kept per session, priming turn included.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Number of recent turns written to the debug log before each upstream call.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Sessions untouched for this long are evicted by the sweep.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Interval between idle-eviction sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Maximum accepted request body size.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            context_window: default_context_window(),
            session_idle_secs: default_session_idle_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_max_turns() -> usize {
    10
}

fn default_context_window() -> usize {
    4
}

fn default_session_idle_secs() -> u64 {
    1800
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
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
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
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

    /// Load configuration with environment variable overrides applied.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            if let Ok(p) = port.trim().parse() {
                self.network.port = p;
            }
        }

        if let Some(bind) = lookup("TUTOR_BIND_ADDRESS") {
            self.network.bind = bind;
        }

        if let Some(level) = lookup("TUTOR_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Some(format) = lookup("TUTOR_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.secrets.gemini_api_key = Some(key);
        }

        if let Some(model) = lookup("GEMINI_MODEL") {
            self.llm.model = model;
        }
    }

    /// The Gemini API key, or a configuration error if it is absent or blank.
    pub fn require_api_key(&self) -> crate::Result<&str> {
        self.secrets
            .gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Missing Gemini API key. Set GEMINI_API_KEY in the environment.".into(),
                )
            })
    }

    /// Socket address string for the listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.network.bind, self.network.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.port, 5000);
        assert_eq!(config.network.bind, "127.0.0.1");
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert!((config.llm.temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.llm.max_output_tokens, 2000);
        assert_eq!(config.relay.max_turns, 10);
        assert_eq!(config.relay.context_window, 4);
        assert!(config.secrets.gemini_api_key.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"network": {"port": 8080}, "relay": {"max_turns": 6}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.network.port, 8080);
        assert_eq!(config.network.bind, "127.0.0.1");
        assert_eq!(config.relay.max_turns, 6);
        assert_eq!(config.relay.session_idle_secs, 1800);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("PORT", "7000"),
            ("TUTOR_BIND_ADDRESS", "0.0.0.0"),
            ("TUTOR_LOG_LEVEL", "debug"),
            ("GEMINI_API_KEY", "abc"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
        ]));

        assert_eq!(config.network.port, 7000);
        assert_eq!(config.network.bind, "0.0.0.0");
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.secrets.gemini_api_key.as_deref(), Some("abc"));
        assert_eq!(config.llm.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_google_key_fallback_and_bad_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("PORT", "not-a-port"), ("GOOGLE_API_KEY", "g-key")]));

        assert_eq!(config.network.port, 5000);
        assert_eq!(config.secrets.gemini_api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn test_require_api_key() {
        let mut config = Config::default();
        assert!(matches!(config.require_api_key(), Err(Error::Config(_))));

        config.secrets.gemini_api_key = Some("   ".into());
        assert!(config.require_api_key().is_err());

        config.secrets.gemini_api_key = Some("secret".into());
        assert_eq!(config.require_api_key().unwrap(), "secret");
    }

    #[test]
    fn test_secrets_debug_is_redacted() {
        let secrets = SecretsConfig {
            gemini_api_key: Some("very-secret".into()),
        };
        let rendered = format!("{secrets:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("***"));
    }
}
