//! 客户端配置：默认值、YAML 文件与环境变量覆盖。
//!
//! Client configuration.
//!
//! Precedence, lowest to highest: built-in defaults, YAML file, environment.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VOICEGUARD_BACKEND_URL` | `base_url` |
//! | `VOICEGUARD_ANALYZE_PATH` | `analyze_path` |
//! | `VOICEGUARD_API_KEY` | `api_key` |
//! | `VOICEGUARD_TIMEOUT_MS` | `timeout_ms` |
//! | `VOICEGUARD_MAX_ATTEMPTS` | `max_attempts` |

use crate::client::policy::DEFAULT_MAX_ATTEMPTS;
use crate::client::validation::{
    ValidatorConfig, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_MIN_PAYLOAD_BYTES,
};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_ANALYZE_PATH: &str = "/v1/voice/analyze";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub analyze_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub auto_retry: bool,
    pub max_payload_bytes: usize,
    pub min_payload_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            analyze_path: DEFAULT_ANALYZE_PATH.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            auto_retry: true,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            min_payload_bytes: DEFAULT_MIN_PAYLOAD_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment, in production).
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("VOICEGUARD_BACKEND_URL") {
            self.base_url = v;
        }
        if let Some(v) = get("VOICEGUARD_ANALYZE_PATH") {
            self.analyze_path = v;
        }
        if let Some(v) = get("VOICEGUARD_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("VOICEGUARD_TIMEOUT_MS") {
            self.timeout_ms = parse_var("VOICEGUARD_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("VOICEGUARD_MAX_ATTEMPTS") {
            self.max_attempts = parse_var("VOICEGUARD_MAX_ATTEMPTS", &v)?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Payload limits for [`crate::client::AudioValidator`].
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            max_bytes: self.max_payload_bytes,
            min_bytes: self.min_payload_bytes,
        }
    }

    /// Full analysis URL, e.g. `http://127.0.0.1:8000/v1/voice/analyze`.
    pub fn endpoint(&self) -> Result<String> {
        let base = Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base url: {}", e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported scheme '{}'", base.scheme()),
                ErrorContext::new().with_field_path("config.base_url"),
            ));
        }
        let path = self.analyze_path.trim();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Ok(format!("{}{}", self.base_url.trim_end_matches('/'), path))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        Error::configuration_with_context(
            format!("invalid value '{}'", value),
            ErrorContext::new()
                .with_field_path(key)
                .with_source("client_config"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.endpoint().unwrap(), "http://127.0.0.1:8000/v1/voice/analyze");
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.max_attempts, 4);
        assert!(cfg.auto_retry);
    }

    #[test]
    fn test_yaml_partial_override() {
        let cfg = ClientConfig::from_yaml_str(
            "base_url: https://guard.example.com/\nanalyze_path: analyze\ntimeout_ms: 5000\n",
        )
        .unwrap();
        assert_eq!(cfg.endpoint().unwrap(), "https://guard.example.com/analyze");
        assert_eq!(cfg.timeout_ms, 5000);
        assert_eq!(cfg.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VOICEGUARD_BACKEND_URL", "http://10.0.0.5:9000"),
            ("VOICEGUARD_API_KEY", "secret"),
            ("VOICEGUARD_MAX_ATTEMPTS", "2"),
            ("VOICEGUARD_ANALYZE_PATH", "  "),
        ]
        .into_iter()
        .collect();
        let cfg = ClientConfig::default()
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.base_url, "http://10.0.0.5:9000");
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.max_attempts, 2);
        assert_eq!(cfg.analyze_path, DEFAULT_ANALYZE_PATH);
    }

    #[test]
    fn test_bad_env_value() {
        let err = ClientConfig::default()
            .apply_vars(|k| (k == "VOICEGUARD_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("VOICEGUARD_TIMEOUT_MS")
        );
    }

    #[test]
    fn test_validator_config_ignores_endpoint() {
        let cfg = ClientConfig {
            base_url: "not a url".into(),
            max_payload_bytes: 4096,
            ..Default::default()
        };
        let limits = cfg.validator_config();
        assert_eq!(limits.max_bytes, 4096);
        assert_eq!(limits.min_bytes, DEFAULT_MIN_PAYLOAD_BYTES);
    }

    #[test]
    fn test_bad_base_url() {
        let cfg = ClientConfig {
            base_url: "ftp://example.com".into(),
            ..Default::default()
        };
        assert!(cfg.endpoint().is_err());
        let cfg = ClientConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(cfg.endpoint().is_err());
    }
}
