//! JSON document store backed by a single file.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, OnceLock, PoisonError, Weak};

use async_trait::async_trait;
use futures::lock::Mutex;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::occupancy::{OccupancyState, RoomRecord};
use crate::store::OccupancyStore;

/// Errors raised by [`FileStore`].
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The document exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Document location.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The document could not be replaced.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Document location.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The state could not be encoded.
    #[error("failed to encode occupancy: {0}")]
    Encode(#[source] serde_json::Error),
    /// Called outside a Tokio runtime.
    #[error("file store I/O must run inside a Tokio runtime")]
    NoRuntime,
}

/// Occupancy store keeping the whole state in one JSON file.
///
/// The document is a list of room records,
/// `[{"RoomId":2,"Users":[{"KeyId":4}]}]`. Saves go to a sibling temporary
/// file that is synced and then renamed over the document.
///
/// All I/O goes through `tokio::fs`, so loads and saves must be awaited on a
/// Tokio runtime. Elsewhere they fail with [`FileStoreError::NoRuntime`].
///
/// Stores created for the same path within a process share one
/// [`document_lock`](OccupancyStore::document_lock). Paths are compared after
/// making them absolute, without resolving symlinks or `..`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Creates a store for the document at `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = document_lock_for(&path);
        Self { path, lock }
    }

    /// Returns the document location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_atomic(&self, body: &[u8]) -> io::Result<()> {
        let temp = self.temp_path();
        let written = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(body).await?;
            file.flush().await?;
            file.sync_all().await?;
            fs::rename(&temp, &self.path).await
        }
        .await;
        if written.is_err() {
            let _ = fs::remove_file(&temp).await;
        }
        written
    }
}

fn document_lock_for(path: &Path) -> Arc<Mutex<()>> {
    static DOCUMENT_LOCKS: OnceLock<StdMutex<HashMap<PathBuf, Weak<Mutex<()>>>>> =
        OnceLock::new();

    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = DOCUMENT_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks.retain(|_, lock| lock.strong_count() > 0);
    if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
        return lock;
    }
    let lock = Arc::new(Mutex::new(()));
    locks.insert(key, Arc::downgrade(&lock));
    lock
}

fn require_runtime() -> std::result::Result<(), FileStoreError> {
    tokio::runtime::Handle::try_current()
        .map(drop)
        .map_err(|_| FileStoreError::NoRuntime)
}

/// Parses a document body.
///
/// Blank input and anything that is not a list of room records is an empty
/// building. Well-formed records that break an occupancy invariant are an
/// error.
fn decode(bytes: &[u8], path: &Path) -> Result<OccupancyState> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(OccupancyState::new());
    }
    match serde_json::from_slice::<Option<Vec<RoomRecord>>>(bytes) {
        Ok(records) => OccupancyState::from_records(records.unwrap_or_default()),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "occupancy document is not a room list, treating building as empty"
            );
            Ok(OccupancyState::new())
        }
    }
}

#[async_trait]
impl OccupancyStore for FileStore {
    async fn load(&self) -> std::result::Result<OccupancyState, StoreError> {
        require_runtime()?;
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "occupancy document missing");
                return Ok(OccupancyState::new());
            }
            Err(source) => {
                return Err(Box::new(FileStoreError::Read {
                    path: self.path.clone(),
                    source,
                }));
            }
        };
        decode(&bytes, &self.path).map_err(|err| Box::new(err) as StoreError)
    }

    async fn save(&self, state: &OccupancyState) -> std::result::Result<(), StoreError> {
        require_runtime()?;
        let body = serde_json::to_vec(&state.to_records()).map_err(FileStoreError::Encode)?;
        self.write_atomic(&body)
            .await
            .map_err(|source| FileStoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        Ok(())
    }

    fn document_lock(&self) -> Option<Arc<Mutex<()>>> {
        Some(Arc::clone(&self.lock))
    }
}
