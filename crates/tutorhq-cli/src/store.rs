//! JSON snapshot store: one file per student under a directory.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use tutorhq_core::error::StoreError;
use tutorhq_core::record::StudentRecord;
use tutorhq_core::traits::StudentStore;

/// Stores each student as `<dir>/<student_id>.json`.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, student_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !student_id.is_empty()
            && student_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Unavailable(format!(
                "invalid student id: '{student_id}'"
            )));
        }
        Ok(self.dir.join(format!("{student_id}.json")))
    }

    fn decode(path: &Path, content: &str) -> StudentRecord {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("unreadable snapshot {}, using defaults: {e}", path.display());
            StudentRecord::default()
        })
    }
}

#[async_trait]
impl StudentStore for SnapshotStore {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn load(&self, student_id: &str) -> Result<StudentRecord, StoreError> {
        let path = self.path_for(student_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Self::decode(&path, &content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StudentRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, student_id: &str, record: &StudentRecord) -> Result<(), StoreError> {
        let path = self.path_for(student_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(record)?;

        // Write then rename so readers never see a half-written snapshot.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, student_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(student_id)?;
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn list_all(&self) -> Result<BTreeMap<String, StudentRecord>, StoreError> {
        let mut records = BTreeMap::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Some(student_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = tokio::fs::read_to_string(&path).await?;
            records.insert(student_id.to_string(), Self::decode(&path, &content));
        }

        Ok(records)
    }
}

/// The id of this device's student, created on first use.
pub fn device_uid(data_dir: &Path) -> Result<String> {
    let path = data_dir.join("uid");
    if let Ok(existing) = std::fs::read_to_string(&path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let simple = uuid::Uuid::new_v4().simple().to_string();
    let uid = format!("u_{}", &simple[..12]);
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data dir: {}", data_dir.display()))?;
    std::fs::write(&path, &uid)
        .with_context(|| format!("failed to write device uid: {}", path.display()))?;
    tracing::info!(uid = %uid, "created device student id");
    Ok(uid)
}
