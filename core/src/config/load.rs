use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default codelib data directory: ~/.codelib
pub fn get_codelib_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".codelib"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_codelib_data_dir()?;
    let mut cfg = load_from(&data_dir, Path::new("."))?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// `<data_dir>/config.toml` wins over `<cwd>/config.toml`; defaults otherwise.
pub fn load_from(data_dir: &Path, cwd: &Path) -> anyhow::Result<AppConfig> {
    let user_config = data_dir.join("config.toml");
    let local_config = cwd.join("config.toml");

    let path = if user_config.exists() {
        user_config
    } else if local_config.exists() {
        local_config
    } else {
        return Ok(AppConfig::default());
    };

    let s = std::fs::read_to_string(&path)?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    cfg.tasks
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    tracing::debug!(target: "codelib.config", path = %path.display(), "loaded config");
    Ok(cfg)
}

pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("CODELIB_BACKEND_URL") {
        if !v.trim().is_empty() {
            cfg.backend.base_url = v.trim().to_string();
        }
    }
    if let Some(v) = lookup("CODELIB_TIMEOUT_MS") {
        if let Ok(ms) = v.trim().parse::<u64>() {
            cfg.backend.timeout_ms = ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_files() {
        let data = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        let cfg = load_from(data.path(), cwd.path()).unwrap();
        assert_eq!(cfg.backend.base_url, "http://localhost:8000");
        assert_eq!(cfg.tasks.poll_interval_ms, 2_000);
        assert_eq!(cfg.tasks.sweep_interval_secs, 900);
        assert_eq!(cfg.tasks.retention_secs, 3_600);
        assert_eq!(cfg.ingest.max_tokens, 1000);
        assert_eq!(cfg.ingest.overlap, 50);
    }

    #[test]
    fn test_user_config_wins_over_local() {
        let data = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(
            data.path().join("config.toml"),
            "[backend]\nbase_url = \"http://indexer:9000\"\n",
        )
        .unwrap();
        std::fs::write(
            cwd.path().join("config.toml"),
            "[backend]\nbase_url = \"http://local:1\"\n",
        )
        .unwrap();

        let cfg = load_from(data.path(), cwd.path()).unwrap();
        assert_eq!(cfg.backend.base_url, "http://indexer:9000");
        assert_eq!(cfg.backend.timeout_ms, 30_000);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let data = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(
            cwd.path().join("config.toml"),
            "[tasks]\npoll_interval_ms = 500\n",
        )
        .unwrap();
        let cfg = load_from(data.path(), cwd.path()).unwrap();
        assert_eq!(cfg.tasks.poll_interval_ms, 500);
        assert_eq!(cfg.tasks.retention_secs, 3_600);
    }

    #[test]
    fn test_invalid_config_names_file() {
        let data = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(data.path().join("config.toml"), "[backend\n").unwrap();
        let err = load_from(data.path(), cwd.path()).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        let data = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();

        std::fs::write(
            cwd.path().join("config.toml"),
            "[tasks]\nsweep_interval_secs = 0\n",
        )
        .unwrap();
        let err = load_from(data.path(), cwd.path()).unwrap_err();
        assert!(err.to_string().contains("sweep_interval_secs"));

        std::fs::write(
            cwd.path().join("config.toml"),
            "[tasks]\npoll_interval_ms = 0\n",
        )
        .unwrap();
        let err = load_from(data.path(), cwd.path()).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_huge_retention_is_rejected() {
        let data = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(
            cwd.path().join("config.toml"),
            format!("[tasks]\nretention_secs = {}\n", i64::MAX),
        )
        .unwrap();
        let err = load_from(data.path(), cwd.path()).unwrap_err();
        assert!(err.to_string().contains("retention_secs"));
    }

    #[test]
    fn test_out_of_range_tasks_values_are_clamped() {
        let mut cfg = AppConfig::default();
        cfg.tasks.poll_interval_ms = 0;
        cfg.tasks.sweep_interval_secs = 0;
        cfg.tasks.retention_secs = u64::MAX;
        assert_eq!(cfg.tasks.poll_interval(), std::time::Duration::from_millis(100));
        assert_eq!(cfg.tasks.sweep_interval(), std::time::Duration::from_secs(1));
        assert_eq!(
            cfg.tasks.retention(),
            chrono::Duration::seconds(crate::config::MAX_RETENTION_SECS as i64)
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        let env: HashMap<&str, &str> = [
            ("CODELIB_BACKEND_URL", " http://remote:8000 "),
            ("CODELIB_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.backend.base_url, "http://remote:8000");
        assert_eq!(cfg.backend.timeout_ms, 30_000);
    }
}
