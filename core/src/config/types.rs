use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub tasks: TasksConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Delay between status queries for one active task.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// How long a finished task stays listed.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_sweep_interval_secs() -> u64 {
    15 * 60
}

fn default_retention_secs() -> u64 {
    60 * 60
}

/// Lower bounds applied when a zero interval slips past validation.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const MIN_SWEEP_INTERVAL_SECS: u64 = 1;

/// Ten years; anything longer is treated as "keep forever" anyway.
pub const MAX_RETENTION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl TasksConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(MIN_SWEEP_INTERVAL_SECS))
    }

    pub fn retention(&self) -> chrono::Duration {
        let secs = self.retention_secs.min(MAX_RETENTION_SECS);
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::days(10 * 365))
    }

    /// Rejects values that would stall polling or the retention sweep.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            anyhow::bail!(
                "tasks.poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}, got {}",
                self.poll_interval_ms
            );
        }
        if self.sweep_interval_secs < MIN_SWEEP_INTERVAL_SECS {
            anyhow::bail!(
                "tasks.sweep_interval_secs must be at least {MIN_SWEEP_INTERVAL_SECS}, got {}",
                self.sweep_interval_secs
            );
        }
        if self.retention_secs > MAX_RETENTION_SECS {
            anyhow::bail!(
                "tasks.retention_secs must be at most {MAX_RETENTION_SECS}, got {}",
                self.retention_secs
            );
        }
        Ok(())
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
            retention_secs: default_retention_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_overlap")]
    pub overlap: u32,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_overlap() -> u32 {
    50
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overlap: default_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

fn default_search_limit() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "codelib_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}
