use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Collector origin. `/health` is served directly under it.
    pub api_base: String,
    /// Prefix for the tracking and ingest endpoints.
    pub api_prefix: String,
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
    pub reconcile_interval_ms: u64,
    pub health_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub signal_buffer: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            api_prefix: DEFAULT_API_PREFIX.into(),
            debounce_ms: 2_000,
            poll_interval_ms: 1_000,
            reconcile_interval_ms: 30_000,
            health_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            signal_buffer: 256,
        }
    }
}

impl CaptureConfig {
    /// Loads settings from a JSON file. A missing file yields defaults; a
    /// corrupt one is logged and also yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read capture config from {}", path.display()))?;

        match serde_json::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!(
                    "Ignoring malformed capture config at {}: {err}",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write capture config to {}", path.display()))
    }

    /// Applies `TABTRAIL_*` environment overrides on top of the current values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup("TABTRAIL_API_BASE").filter(|v| !v.trim().is_empty()) {
            self.api_base = base.trim().trim_end_matches('/').to_string();
        }

        let millis = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<u64>() {
                Ok(value) if value > 0 => Some(value),
                _ => {
                    warn!("Ignoring invalid {key}={raw:?}");
                    None
                }
            }
        };

        if let Some(value) = millis("TABTRAIL_DEBOUNCE_MS") {
            self.debounce_ms = value;
        }
        if let Some(value) = millis("TABTRAIL_POLL_INTERVAL_MS") {
            self.poll_interval_ms = value;
        }
        if let Some(value) = millis("TABTRAIL_RECONCILE_INTERVAL_MS") {
            self.reconcile_interval_ms = value;
        }

        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms.max(1))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Full URL for an endpoint under the API prefix, e.g. `/tracking/status`.
    pub fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}{}",
            self.api_base.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/'),
            endpoint
        )
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.api_base.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, CaptureConfig::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.json");
        fs::write(&path, "{ not json").unwrap();

        let config = CaptureConfig::load(&path).unwrap();
        assert_eq!(config, CaptureConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.json");
        fs::write(&path, r#"{"api_base":"http://localhost:9999","debounce_ms":500}"#).unwrap();

        let config = CaptureConfig::load(&path).unwrap();
        assert_eq!(config.api_base, "http://localhost:9999");
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.reconcile_interval_ms, 30_000);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.json");
        let config = CaptureConfig {
            poll_interval_ms: 250,
            ..CaptureConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(CaptureConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn env_overrides_apply_and_skip_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TABTRAIL_API_BASE", "http://10.0.0.2:8080/"),
            ("TABTRAIL_DEBOUNCE_MS", "750"),
            ("TABTRAIL_POLL_INTERVAL_MS", "soon"),
        ]);

        let config = CaptureConfig::default()
            .with_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.api_base, "http://10.0.0.2:8080");
        assert_eq!(config.debounce_ms, 750);
        assert_eq!(config.poll_interval_ms, 1_000);
    }

    #[test]
    fn endpoint_urls() {
        let config = CaptureConfig::default();
        assert_eq!(config.health_url(), "http://127.0.0.1:8080/health");
        assert_eq!(
            config.api_url("/events/ingest"),
            "http://127.0.0.1:8080/api/v1/events/ingest"
        );
    }
}
