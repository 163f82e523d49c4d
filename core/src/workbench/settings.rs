use std::time::Duration;

use crate::config::AppConfig;
use crate::task::{DEFAULT_POLL_INTERVAL, DEFAULT_RETENTION_SECS, DEFAULT_SWEEP_INTERVAL};

#[derive(Debug, Clone)]
pub struct WorkbenchSettings {
    pub poll_interval: Duration,
    pub sweep_interval: Duration,
    pub retention: chrono::Duration,
    pub search_limit: u32,
    pub max_tokens: u32,
    pub overlap: u32,
}

impl Default for WorkbenchSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            retention: chrono::Duration::seconds(DEFAULT_RETENTION_SECS),
            search_limit: 10,
            max_tokens: 1000,
            overlap: 50,
        }
    }
}

impl From<&AppConfig> for WorkbenchSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            poll_interval: cfg.tasks.poll_interval(),
            sweep_interval: cfg.tasks.sweep_interval(),
            retention: cfg.tasks.retention(),
            search_limit: cfg.search.limit,
            max_tokens: cfg.ingest.max_tokens,
            overlap: cfg.ingest.overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_follows_task_section() {
        let mut cfg = AppConfig::default();
        cfg.tasks.poll_interval_ms = 250;
        cfg.tasks.retention_secs = 60;
        let settings = WorkbenchSettings::from(&cfg);
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.retention, chrono::Duration::seconds(60));
        assert_eq!(settings.sweep_interval, Duration::from_secs(900));
        assert_eq!(settings.search_limit, 10);
    }
}
