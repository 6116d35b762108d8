//! Application configuration loaded from a TOML file.
//!
//! `load_or_create_config` mirrors the service bootstrap contract: read the
//! file when it exists, otherwise write the defaults next to where the file
//! was expected so operators have something concrete to edit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "docshelf.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter; overridden by `RUST_LOG` when set.
    pub level: String,
    /// Optional log file path. Absent means stderr only.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Simulated latency windows for the mock backend, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub crud_latency_ms: u64,
    pub fetch_latency_ms: u64,
    pub index_latency_min_ms: u64,
    pub index_latency_max_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            crud_latency_ms: 300,
            fetch_latency_ms: 500,
            index_latency_min_ms: 2000,
            index_latency_max_ms: 5000,
        }
    }
}

impl BackendConfig {
    /// Zero-latency profile for tests and benchmarks.
    pub fn instant() -> Self {
        BackendConfig {
            crud_latency_ms: 0,
            fetch_latency_ms: 0,
            index_latency_min_ms: 0,
            index_latency_max_ms: 0,
        }
    }
}

/// Load the config from `path` (default `docshelf.toml`). A missing file is
/// created with defaults; a malformed file is an error rather than a silent
/// fallback.
pub fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let cfg = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        return Ok(cfg);
    }

    let cfg = AppConfig::default();
    let rendered = toml::to_string_pretty(&cfg).context("serializing default config")?;
    fs::write(path, rendered)
        .with_context(|| format!("writing default config to {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_latency_windows() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.backend.crud_latency_ms, 300);
        assert_eq!(cfg.backend.fetch_latency_ms, 500);
        assert_eq!(cfg.backend.index_latency_min_ms, 2000);
        assert_eq!(cfg.backend.index_latency_max_ms, 5000);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docshelf.toml");

        let cfg = load_or_create_config(Some(&path)).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(path.exists());

        // Second load reads the file back to the same value.
        let reread = load_or_create_config(Some(&path)).unwrap();
        assert_eq!(reread, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docshelf.toml");
        fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let cfg = load_or_create_config(Some(&path)).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.backend, BackendConfig::default());
    }
}
