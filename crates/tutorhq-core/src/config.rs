//! Host configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::roster::AdminGate;

/// Top-level tutorhq configuration.
///
/// Note: Custom Debug impl masks the admin code to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct HqConfig {
    /// Code that unlocks the admin roster.
    #[serde(default = "default_admin_code")]
    pub admin_code: String,
    /// Catalog file or directory.
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,
    /// Directory holding student snapshots and the device uid.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Fixed student id; when absent the device uid is used.
    #[serde(default)]
    pub student_id: Option<String>,
}

impl std::fmt::Debug for HqConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HqConfig")
            .field("admin_code", &"***")
            .field("catalog", &self.catalog)
            .field("data_dir", &self.data_dir)
            .field("student_id", &self.student_id)
            .finish()
    }
}

fn default_admin_code() -> String {
    "repetitor2025".to_string()
}
fn default_catalog() -> PathBuf {
    PathBuf::from("catalog/course.toml")
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./tutorhq-data")
}

impl Default for HqConfig {
    fn default() -> Self {
        Self {
            admin_code: default_admin_code(),
            catalog: default_catalog(),
            data_dir: default_data_dir(),
            student_id: None,
        }
    }
}

impl HqConfig {
    pub fn admin_gate(&self) -> AdminGate {
        AdminGate::new(self.admin_code.clone())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(p: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&p.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `tutorhq.toml` in the current directory
/// 2. `~/.config/tutorhq/config.toml`
///
/// Environment variable overrides: `TUTORHQ_ADMIN_CODE`, `TUTORHQ_DATA_DIR`.
pub fn load_config() -> Result<HqConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<HqConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("tutorhq.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<HqConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => HqConfig::default(),
    };

    if let Ok(code) = std::env::var("TUTORHQ_ADMIN_CODE") {
        config.admin_code = code;
    }
    if let Ok(dir) = std::env::var("TUTORHQ_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }

    config.admin_code = resolve_env_vars(&config.admin_code);
    config.catalog = resolve_path(&config.catalog);
    config.data_dir = resolve_path(&config.data_dir);
    config.student_id = config.student_id.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("tutorhq"))
}
