// src/store/snapshot.rs
//
// Local persistence slot used when no remote store is configured or reachable.

use crate::{models::LedgerSnapshot, seed};
use chrono::Utc;
use std::{io::ErrorKind, path::PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, warn};

pub const SNAPSHOT_KEY: &str = "hr_ledger_db_v1";
pub const VERSION_KEY: &str = "hr_ledger_version";
pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[cfg(test)]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", SNAPSHOT_KEY))
    }

    fn version_path(&self) -> PathBuf {
        self.dir.join(VERSION_KEY)
    }

    /// Presence of a snapshot implies a compatible schema.
    pub async fn load(&self) -> Result<Option<LedgerSnapshot>, SnapshotError> {
        match fs::read(self.snapshot_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the stored snapshot, or the seeded defaults when there is none.
    /// An unreadable snapshot is moved aside first so the next save cannot
    /// overwrite it.
    pub async fn load_or_default(&self) -> LedgerSnapshot {
        match self.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No local snapshot in {}; using defaults", self.dir.display());
                seed::default_snapshot()
            }
            Err(e) => {
                match self.quarantine().await {
                    Ok(moved) => warn!(
                        "Unreadable local snapshot ({}) moved to {}; using defaults",
                        e,
                        moved.display()
                    ),
                    Err(io) => error!(
                        "Unreadable local snapshot ({}) could not be moved aside: {}",
                        e, io
                    ),
                }
                seed::default_snapshot()
            }
        }
    }

    async fn quarantine(&self) -> Result<PathBuf, SnapshotError> {
        let target = self.dir.join(format!(
            "{}.json.corrupt-{}",
            SNAPSHOT_KEY,
            Utc::now().timestamp_millis()
        ));
        fs::rename(self.snapshot_path(), &target).await?;
        Ok(target)
    }

    /// Replaces the previous snapshot wholesale.
    pub async fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.dir.join(format!("{}.json.tmp", SNAPSHOT_KEY));
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, self.snapshot_path()).await?;
        fs::write(self.version_path(), SCHEMA_VERSION).await?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn schema_version(&self) -> Result<Option<String>, SnapshotError> {
        match fs::read_to_string(self.version_path()).await {
            Ok(v) => Ok(Some(v.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("hr-ledger-test-{}", uuid::Uuid::new_v4()))
}
