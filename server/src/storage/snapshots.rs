//! Snapshot store - one file per pushed version plus a `LATEST` index.
//!
//! Layout under the data directory:
//! - `<version>`: the raw snapshot string pushed with that version
//! - `LATEST`: decimal version of the snapshot served to clients
//!
//! Both are written through a temp file and a rename, so readers never
//! observe a partially written file. The index is only rebuilt from the
//! directory listing at startup, and only when it is missing or unreadable.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::{Mutex, RwLock};

use super::{Result, StorageError};

/// Name of the version index file.
pub const INDEX_FILE: &str = "LATEST";

/// Whether a push became the served snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The snapshot is now the latest
    Promoted,
    /// Stored, but a newer snapshot is already indexed
    Superseded { latest: u64 },
}

/// Snapshot storage rooted at a data directory.
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    latest: RwLock<Option<u64>>,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Open the store, creating `dir` if needed and loading the index.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;

        let latest = match read_index(&dir).await? {
            Some(version) => Some(version),
            None => {
                let recovered = scan_latest(&dir).await?;
                if let Some(version) = recovered {
                    tracing::info!("Rebuilt snapshot index from directory: {}", version);
                    write_atomic(&dir, INDEX_FILE, version.to_string().as_bytes()).await?;
                }
                recovered
            }
        };

        tracing::info!(
            "Snapshot store opened at {} (latest: {:?})",
            dir.display(),
            latest
        );

        Ok(Self {
            dir,
            latest: RwLock::new(latest),
            write_lock: Mutex::new(()),
        })
    }

    /// Data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Version of the latest snapshot, if anything has been stored.
    pub async fn latest_version(&self) -> Option<u64> {
        *self.latest.read().await
    }

    /// Latest snapshot if its version is strictly greater than `since`.
    pub async fn read_if_newer(&self, since: u64) -> Result<Option<(u64, String)>> {
        let Some(latest) = self.latest_version().await else {
            return Ok(None);
        };
        if latest <= since {
            return Ok(None);
        }

        let path = self.dir.join(latest.to_string());
        match fs::read_to_string(&path).await {
            Ok(data) => Ok(Some((latest, data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::MissingSnapshot(latest))
            }
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    /// Store `data` as the snapshot for `version`.
    ///
    /// Becomes the latest unless a strictly higher version is already
    /// indexed. Pushing the indexed version again overwrites it.
    pub async fn write(&self, version: u64, data: &str) -> Result<WriteOutcome> {
        let _guard = self.write_lock.lock().await;

        write_atomic(&self.dir, &version.to_string(), data.as_bytes()).await?;

        let current = *self.latest.read().await;
        if let Some(latest) = current.filter(|&latest| latest > version) {
            tracing::debug!(
                "Stored snapshot {} behind latest {}; not promoted",
                version,
                latest
            );
            return Ok(WriteOutcome::Superseded { latest });
        }

        write_atomic(&self.dir, INDEX_FILE, version.to_string().as_bytes()).await?;
        *self.latest.write().await = Some(version);
        tracing::debug!("Snapshot {} is now latest ({} bytes)", version, data.len());

        Ok(WriteOutcome::Promoted)
    }
}

async fn read_index(dir: &Path) -> Result<Option<u64>> {
    let path = dir.join(INDEX_FILE);
    let raw = match fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    match raw.trim().parse() {
        Ok(version) => Ok(Some(version)),
        Err(_) => {
            tracing::warn!("Ignoring unreadable snapshot index {:?}", raw.trim());
            Ok(None)
        }
    }
}

/// Highest version-named file in `dir`.
async fn scan_latest(dir: &Path) -> Result<Option<u64>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| StorageError::io(dir, e))?;

    let mut latest = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::io(dir, e))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        let version = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u64>().ok());

        if let (true, Some(version)) = (is_file, version) {
            latest = latest.max(Some(version));
        }
    }

    Ok(latest)
}

async fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> Result<()> {
    let path = dir.join(name);
    let tmp = dir.join(format!("{name}.tmp"));

    fs::write(&tmp, contents)
        .await
        .map_err(|e| StorageError::io(&tmp, e))?;
    fs::rename(&tmp, &path)
        .await
        .map_err(|e| StorageError::io(&path, e))
}
