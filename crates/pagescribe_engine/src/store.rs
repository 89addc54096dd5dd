use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use engine_logging::{engine_debug, engine_warn};
use fs2::FileExt;
use pagescribe_core::RunState;

use crate::persist::{remove_if_exists, AtomicFileWriter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("progress storage unavailable: {0}")]
    Unavailable(String),
    #[error("run {0} is already in progress")]
    Locked(String),
}

/// Storage key for a run's checkpoint.
pub fn checkpoint_key(run_id: &str) -> String {
    format!("novel_{run_id}")
}

/// Durable key/value home of run checkpoints, plus a per-run lock.
#[async_trait::async_trait]
pub trait ProgressStore: Send + Sync {
    /// Overwrites any previous checkpoint of `run_id`.
    async fn save(&self, run_id: &str, state: &RunState) -> Result<(), StoreError>;
    async fn load(&self, run_id: &str) -> Result<Option<RunState>, StoreError>;
    /// Removing a checkpoint that does not exist is a no-op.
    async fn clear(&self, run_id: &str) -> Result<(), StoreError>;
    /// Claims `run_id` for one run; fails with [`StoreError::Locked`] while held.
    async fn acquire(&self, run_id: &str) -> Result<(), StoreError>;
    async fn release(&self, run_id: &str);
}

fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// One JSON file per run in a directory, with a sibling `.lock` file.
///
/// The lock is an OS advisory lock on the `.lock` file, held from `acquire`
/// until `release` or until the last clone of the store is dropped. The OS
/// drops it with the process, so a killed run never blocks the next one.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    writer: AtomicFileWriter,
    held: Arc<Mutex<HashMap<String, File>>>,
}

impl FileProgressStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            held: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn state_path(&self, run_id: &str) -> PathBuf {
        self.writer.dir().join(format!("{}.json", checkpoint_key(run_id)))
    }

    fn lock_path(&self, run_id: &str) -> PathBuf {
        self.writer.dir().join(format!("{}.lock", checkpoint_key(run_id)))
    }

    fn open_lock(&self, run_id: &str) -> std::io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path(run_id))
    }

    /// Synchronous read of a checkpoint, for callers outside a runtime.
    pub fn read(&self, run_id: &str) -> Result<Option<RunState>, StoreError> {
        let raw = match std::fs::read_to_string(self.state_path(run_id)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(unavailable(err)),
        };
        RunState::from_json(&raw).map(Some).map_err(unavailable)
    }

    /// Whether some store, in this process or another, currently holds `run_id`.
    pub fn is_locked(&self, run_id: &str) -> bool {
        let held_here = self
            .held
            .lock()
            .map(|held| held.contains_key(run_id))
            .unwrap_or(false);
        if held_here {
            return true;
        }
        if !self.lock_path(run_id).exists() {
            return false;
        }
        // The probe handle is closed on return, which drops a lock it managed to take.
        match self.open_lock(run_id) {
            Ok(file) => file.try_lock_exclusive().is_err(),
            Err(_) => false,
        }
    }
}

#[async_trait::async_trait]
impl ProgressStore for FileProgressStore {
    async fn save(&self, run_id: &str, state: &RunState) -> Result<(), StoreError> {
        let json = state.to_json().map_err(unavailable)?;
        let filename = format!("{}.json", checkpoint_key(run_id));
        self.writer.write(&filename, &json).map_err(unavailable)?;
        engine_debug!("checkpoint {} saved ({} bytes)", run_id, json.len());
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Option<RunState>, StoreError> {
        self.read(run_id)
    }

    async fn clear(&self, run_id: &str) -> Result<(), StoreError> {
        remove_if_exists(&self.state_path(run_id)).map_err(unavailable)?;
        Ok(())
    }

    async fn acquire(&self, run_id: &str) -> Result<(), StoreError> {
        crate::persist::ensure_dir(self.writer.dir()).map_err(unavailable)?;
        let mut held = self.held.lock().map_err(unavailable)?;
        if held.contains_key(run_id) {
            return Err(StoreError::Locked(run_id.to_string()));
        }
        let file = self.open_lock(run_id).map_err(unavailable)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                held.insert(run_id.to_string(), file);
                engine_debug!("locked run {}", run_id);
                Ok(())
            }
            Err(err) if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(StoreError::Locked(run_id.to_string()))
            }
            Err(err) => Err(unavailable(err)),
        }
    }

    async fn release(&self, run_id: &str) {
        // The lock file stays behind; deleting it could race a waiting opener.
        match self.held.lock() {
            Ok(mut held) => {
                if held.remove(run_id).is_none() {
                    engine_warn!("release of run {} that was not locked here", run_id);
                }
            }
            Err(err) => engine_warn!("failed to release lock of run {}: {}", run_id, err),
        }
    }
}

/// In-process store. Blobs go through the same JSON encoding as the file store.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    blobs: Mutex<HashMap<String, String>>,
    locks: Mutex<HashSet<String>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail with [`StoreError::Unavailable`].
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn contains(&self, run_id: &str) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(&checkpoint_key(run_id)))
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn save(&self, run_id: &str, state: &RunState) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        let json = state.to_json().map_err(unavailable)?;
        self.blobs
            .lock()
            .map_err(unavailable)?
            .insert(checkpoint_key(run_id), json);
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Option<RunState>, StoreError> {
        let raw = self
            .blobs
            .lock()
            .map_err(unavailable)?
            .get(&checkpoint_key(run_id))
            .cloned();
        raw.map(|raw| RunState::from_json(&raw).map_err(unavailable))
            .transpose()
    }

    async fn clear(&self, run_id: &str) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .map_err(unavailable)?
            .remove(&checkpoint_key(run_id));
        Ok(())
    }

    async fn acquire(&self, run_id: &str) -> Result<(), StoreError> {
        let mut locks = self.locks.lock().map_err(unavailable)?;
        if locks.insert(run_id.to_string()) {
            Ok(())
        } else {
            Err(StoreError::Locked(run_id.to_string()))
        }
    }

    async fn release(&self, run_id: &str) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(run_id);
        }
    }
}
