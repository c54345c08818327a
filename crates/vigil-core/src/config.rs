//! Configuration for the Vigil session engine.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`VIGIL_ENGINE__` prefix)
//! 2. Config file (`vigil.toml`, `[engine]` section)
//! 3. Defaults

use serde::Deserialize;

use crate::error::VigilError;

/// Tunable parameters of the session engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Seconds between face-detector samples (default: 2).
    #[serde(default = "default_face_interval")]
    pub face_sample_interval_secs: u64,

    /// Seconds between screen/visibility samples (default: 1).
    #[serde(default = "default_screen_interval")]
    pub screen_sample_interval_secs: u64,

    /// Countdown resolution of the session clock in seconds.
    #[serde(default = "default_clock_resolution")]
    pub clock_resolution_secs: u64,

    /// Authenticity-score penalty per counted red flag.
    #[serde(default = "default_flag_penalty")]
    pub flag_penalty: u32,

    /// Directory for archived submission records.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,
}

fn default_face_interval() -> u64 {
    2
}

fn default_screen_interval() -> u64 {
    1
}

fn default_clock_resolution() -> u64 {
    1
}

fn default_flag_penalty() -> u32 {
    5
}

fn default_archive_dir() -> String {
    "./submissions".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            face_sample_interval_secs: default_face_interval(),
            screen_sample_interval_secs: default_screen_interval(),
            clock_resolution_secs: default_clock_resolution(),
            flag_penalty: default_flag_penalty(),
            archive_dir: default_archive_dir(),
        }
    }
}

/// Load the engine config from `{file_prefix}.toml` and the environment.
/// Missing files and missing sections fall back to defaults.
pub fn load_engine_config(file_prefix: &str) -> Result<EngineConfig, VigilError> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("VIGIL_ENGINE")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| VigilError::Config(e.to_string()))?;

    match cfg.get::<EngineConfig>("engine") {
        Ok(c) => Ok(c),
        Err(_) => {
            tracing::debug!(prefix = %file_prefix, "No [engine] config found; using defaults");
            Ok(EngineConfig::default())
        }
    }
}
