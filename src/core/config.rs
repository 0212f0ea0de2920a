//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Backend URL value shipped in unconfigured deployments; treated as unset
pub const PLACEHOLDER_BACKEND_URL: &str = "YOUR_GOOGLE_APPS_SCRIPT_WEB_APP_URL_HERE";

/// Webhook URL value shipped in unconfigured deployments; treated as unset
pub const PLACEHOLDER_WEBHOOK_URL: &str = "YOUR_WEBHOOK_URL_HERE";

/// Local config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "idf.yaml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DEMO_LATENCY_MS: (u64, u64) = (300, 700);

/// Valid configuration keys
pub const KEYS: &[(&str, &str)] = &[
    (
        "backend_url",
        "Web app endpoint of the backend (unset = demo mode)",
    ),
    ("webhook_url", "Automation webhook endpoint"),
    ("timeout_secs", "HTTP request timeout in seconds"),
    (
        "demo_latency_ms",
        "Simulated demo latency range in ms, as min,max",
    ),
    ("default_format", "Default output format (table, json, csv, ...)"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Could not determine global config directory")]
    NoConfigDir,
}

/// idf configuration with layered hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend endpoint; empty or placeholder selects demo mode
    pub backend_url: Option<String>,

    /// Automation webhook endpoint
    pub webhook_url: Option<String>,

    /// HTTP request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Demo latency range `[min, max]` in milliseconds
    pub demo_latency_ms: Option<Vec<u64>>,

    /// Default output format
    pub default_format: Option<String>,

    /// Set by `--demo`; wins over any configured backend
    #[serde(skip)]
    pub force_demo: bool,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in accessor fallbacks)

        // 2. Global user config (~/.config/idf/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Local config (./idf.yaml)
        if let Some(local) = Self::read_file(&Self::local_config_path()) {
            config.merge(local);
        }

        // 4. Environment variables
        config.apply_env(|name| std::env::var(name).ok());

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "idf")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Path to the local config file in the working directory
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(LOCAL_CONFIG_FILE)
    }

    /// Apply `IDF_*` environment variables through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("IDF_BACKEND_URL") {
            self.backend_url = Some(url);
        }
        if let Some(url) = lookup("IDF_WEBHOOK_URL") {
            self.webhook_url = Some(url);
        }
        if let Some(raw) = lookup("IDF_TIMEOUT_SECS") {
            match raw.trim().parse() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid IDF_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = lookup("IDF_DEMO_LATENCY_MS") {
            match parse_latency(&raw) {
                Ok(range) => self.demo_latency_ms = Some(range),
                Err(reason) => {
                    tracing::warn!(value = %raw, %reason, "ignoring invalid IDF_DEMO_LATENCY_MS")
                }
            }
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.backend_url.is_some() {
            self.backend_url = other.backend_url;
        }
        if other.webhook_url.is_some() {
            self.webhook_url = other.webhook_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.demo_latency_ms.is_some() {
            self.demo_latency_ms = other.demo_latency_ms;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        self.force_demo |= other.force_demo;
    }

    /// Apply command-line overrides, the last layer
    pub fn with_overrides(mut self, backend_url: Option<String>, demo: bool) -> Self {
        if let Some(url) = backend_url {
            self.backend_url = Some(url);
        }
        self.force_demo |= demo;
        self
    }

    /// Configured backend endpoint, if any
    pub fn backend_url(&self) -> Option<&str> {
        if self.force_demo {
            return None;
        }
        self.backend_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != PLACEHOLDER_BACKEND_URL)
    }

    /// Whether the in-process demo backend should be used
    pub fn is_demo(&self) -> bool {
        self.backend_url().is_none()
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != PLACEHOLDER_WEBHOOK_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Demo latency as an ordered `(min, max)` pair in milliseconds
    pub fn demo_latency(&self) -> (u64, u64) {
        let (min, max) = match self.demo_latency_ms.as_deref() {
            Some([single]) => (*single, *single),
            Some([min, max, ..]) => (*min, *max),
            _ => DEFAULT_DEMO_LATENCY_MS,
        };
        (min.min(max), min.max(max))
    }

    /// Value of a key as shown by `idf config show <key>`
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "backend_url" => self.backend_url.clone(),
            "webhook_url" => self.webhook_url.clone(),
            "timeout_secs" => self.timeout_secs.map(|s| s.to_string()),
            "demo_latency_ms" => self.demo_latency_ms.as_ref().map(|range| {
                range
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            }),
            "default_format" => self.default_format.clone(),
            _ => None,
        }
    }

    /// Validate a raw value for `key` and convert it to its YAML form
    pub fn yaml_value(key: &str, raw: &str) -> Result<serde_yml::Value, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason,
        };
        match key {
            "backend_url" | "webhook_url" | "default_format" => {
                Ok(serde_yml::Value::String(raw.trim().to_string()))
            }
            "timeout_secs" => raw
                .trim()
                .parse::<u64>()
                .map(|secs| serde_yml::Value::Number(secs.into()))
                .map_err(|e| invalid(e.to_string())),
            "demo_latency_ms" => parse_latency(raw)
                .map(|range| {
                    serde_yml::Value::Sequence(
                        range
                            .into_iter()
                            .map(|v| serde_yml::Value::Number(v.into()))
                            .collect(),
                    )
                })
                .map_err(invalid),
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }
}

/// Parse `min,max` or a single value into a latency range
pub fn parse_latency(raw: &str) -> Result<Vec<u64>, String> {
    let values: Result<Vec<u64>, _> = raw
        .split(|c| c == ',' || c == '-' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(str::parse::<u64>)
        .collect();
    match values {
        Ok(values) if (1..=2).contains(&values.len()) => Ok(values),
        Ok(_) => Err("expected one or two numbers".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_demo() {
        let config = Config::default();
        assert!(config.is_demo());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.demo_latency(), (300, 700));
    }

    #[test]
    fn test_placeholder_url_selects_demo() {
        let config = Config {
            backend_url: Some(PLACEHOLDER_BACKEND_URL.to_string()),
            ..Default::default()
        };
        assert!(config.is_demo());

        let config = Config {
            backend_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.is_demo());
    }

    #[test]
    fn test_merge_later_layer_wins() {
        let mut config = Config {
            backend_url: Some("https://global.example/exec".to_string()),
            timeout_secs: Some(10),
            ..Default::default()
        };
        config.merge(Config {
            backend_url: Some("https://local.example/exec".to_string()),
            ..Default::default()
        });
        assert_eq!(config.backend_url(), Some("https://local.example/exec"));
        assert_eq!(config.timeout_secs, Some(10));
    }

    #[test]
    fn test_env_layer() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            "IDF_BACKEND_URL" => Some("https://env.example/exec".to_string()),
            "IDF_DEMO_LATENCY_MS" => Some("0".to_string()),
            "IDF_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.backend_url(), Some("https://env.example/exec"));
        assert_eq!(config.demo_latency(), (0, 0));
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_demo_flag_overrides_backend() {
        let config = Config {
            backend_url: Some("https://backend.example/exec".to_string()),
            ..Default::default()
        }
        .with_overrides(None, true);
        assert!(config.is_demo());
    }

    #[test]
    fn test_latency_is_ordered() {
        let config = Config {
            demo_latency_ms: Some(vec![700, 300]),
            ..Default::default()
        };
        assert_eq!(config.demo_latency(), (300, 700));
    }

    #[test]
    fn test_yaml_value_validation() {
        assert_eq!(
            Config::yaml_value("timeout_secs", "12").unwrap(),
            serde_yml::Value::Number(12.into())
        );
        assert!(Config::yaml_value("timeout_secs", "twelve").is_err());
        assert!(matches!(
            Config::yaml_value("colour", "red"),
            Err(ConfigError::UnknownKey(_))
        ));
        let latency = Config::yaml_value("demo_latency_ms", "100,200").unwrap();
        assert!(latency.is_sequence());
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let yaml = "backend_url: https://x.example/exec\ndemo_latency_ms: [0, 0]\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.backend_url(), Some("https://x.example/exec"));
        assert_eq!(config.demo_latency(), (0, 0));
        assert_eq!(config.get("demo_latency_ms").as_deref(), Some("0,0"));
    }
}
