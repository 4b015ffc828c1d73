use std::path::PathBuf;
use std::time::Duration;

use canary_types::{CanaryError, Result};

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Runtime settings
    pub runtime: String,
    pub container_prefix: String,
    pub startup_timeout: u64,
    pub poll_interval_ms: u64,

    // Probe settings
    pub probe_host: String,
    pub tcp_connect_timeout_ms: u64,

    // Logging
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            container_prefix: "canary-runner-".to_string(),
            startup_timeout: 10,
            poll_interval_ms: 1000,
            probe_host: "localhost".to_string(),
            tcp_connect_timeout_ms: 1000,
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (with dotenvy).
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors, the file may not exist)
        let _ = dotenvy::dotenv();

        let defaults = Config::default();
        let config = Config {
            runtime: env_or("CANARY_RUNTIME", || defaults.runtime.clone()),
            container_prefix: env_or("CANARY_CONTAINER_PREFIX", || {
                defaults.container_prefix.clone()
            }),
            startup_timeout: env_u64("CANARY_STARTUP_TIMEOUT", defaults.startup_timeout),
            poll_interval_ms: env_u64("CANARY_POLL_INTERVAL_MS", defaults.poll_interval_ms),

            probe_host: env_or("CANARY_PROBE_HOST", || defaults.probe_host.clone()),
            tcp_connect_timeout_ms: env_u64(
                "CANARY_TCP_CONNECT_TIMEOUT_MS",
                defaults.tcp_connect_timeout_ms,
            ),

            log_level: env_or("CANARY_LOG_LEVEL", || defaults.log_level.clone()),
            log_format: env_or("CANARY_LOG_FORMAT", || defaults.log_format.clone()),
            log_file: env_opt("CANARY_LOG_FILE").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the runner misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.runtime.trim().is_empty() {
            return Err(CanaryError::Config(
                "container runtime must not be empty".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(CanaryError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err(CanaryError::Config(format!(
                "unknown log format '{}', expected 'pretty' or 'json'",
                self.log_format
            )));
        }
        Ok(())
    }

    pub fn structured_logs(&self) -> bool {
        self.log_format == "json"
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn tcp_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.tcp_connect_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Env helpers
// ---------------------------------------------------------------------------

fn env_or(key: &str, default: impl FnOnce() -> String) -> String {
    env_opt(key).unwrap_or_else(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
