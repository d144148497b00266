pub mod admin;
pub mod init;
pub mod profile;
pub mod quiz;
pub mod status;
pub mod submit;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use tutorhq_core::catalog::load_catalog;
use tutorhq_core::config::{load_config_from, HqConfig};
use tutorhq_core::session::StudentSession;
use tutorhq_core::traits::SystemClock;

use crate::store::{device_uid, SnapshotStore};

/// Global flags that override values from the config file.
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub student: Option<String>,
}

/// Load the config and apply command-line overrides on top of it.
pub fn resolve_config(overrides: &Overrides) -> Result<HqConfig> {
    let mut config = load_config_from(overrides.config.as_deref())?;
    if let Some(catalog) = &overrides.catalog {
        config.catalog = catalog.clone();
    }
    if let Some(data_dir) = &overrides.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(student) = &overrides.student {
        config.student_id = Some(student.clone());
    }
    tracing::debug!(?config, "resolved config");
    Ok(config)
}

pub fn snapshot_store(config: &HqConfig) -> SnapshotStore {
    SnapshotStore::new(config.data_dir.join("students"))
}

/// Open the session of the configured student, or of this device's student.
pub async fn open_session(overrides: &Overrides) -> Result<StudentSession> {
    let config = resolve_config(overrides)?;
    let catalog = load_catalog(&config.catalog)
        .with_context(|| format!("failed to load catalog: {}", config.catalog.display()))?;

    let student_id = match &config.student_id {
        Some(id) => id.clone(),
        None => device_uid(&config.data_dir)?,
    };

    let session = StudentSession::open(
        Arc::new(catalog),
        Arc::new(snapshot_store(&config)),
        Arc::new(SystemClock),
        &student_id,
    )
    .await?;
    Ok(session)
}

/// Warn when an update only reached memory.
pub fn report_unsaved(saved: bool) {
    if !saved {
        eprintln!("Warning: progress could not be saved and will be lost on exit.");
    }
}
