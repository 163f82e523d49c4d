use std::sync::Arc;

use anyhow::Result;

use codelib_core::api::{AppConfig, IndexerBackend};

use crate::backend::HttpBackend;

pub fn build_backend(cfg: &AppConfig) -> Result<Arc<dyn IndexerBackend>> {
    let backend = HttpBackend::new(&cfg.backend.base_url, cfg.backend.timeout_ms)?;
    tracing::debug!(
        target: "codelib.backend",
        base_url = %backend.base_url(),
        timeout_ms = cfg.backend.timeout_ms,
        "backend ready"
    );
    Ok(Arc::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_backend_uses_configured_url() {
        let mut cfg = AppConfig::default();
        cfg.backend.base_url = "http://indexer:9000/".into();
        let backend = build_backend(&cfg).unwrap();
        assert_eq!(backend.name(), "http");
    }

    #[test]
    fn test_build_backend_rejects_blank_url() {
        let mut cfg = AppConfig::default();
        cfg.backend.base_url = " ".into();
        assert!(build_backend(&cfg).is_err());
    }
}
