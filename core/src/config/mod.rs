mod load;
mod types;

pub use load::{apply_env_overrides, get_codelib_data_dir, load_default, load_from};
pub use types::{
    AppConfig, BackendConfig, IngestConfig, LoggingConfig, SearchConfig, TasksConfig,
    MAX_RETENTION_SECS, MIN_POLL_INTERVAL_MS, MIN_SWEEP_INTERVAL_SECS,
};
