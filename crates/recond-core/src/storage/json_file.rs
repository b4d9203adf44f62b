//! Single-file JSON store with an advisory lock and atomic replace.
//!
//! Layout under the data directory:
//! - `state.json`: the whole [`PersistedState`]
//! - `state.json.tmp`: staging file for atomic replace
//! - `.lock`: advisory lock serializing writers across processes
//!
//! Writers stage the new state into the tmp file and rename it over
//! `state.json`, so a crashed writer never leaves a torn state file.

use super::{PersistedState, StateStore};
use crate::domain::{Job, Target, TargetRecords};
use crate::error::{ReconError, ReconResult};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct JsonFileStore {
    state_path: PathBuf,
    tmp_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    /// In-memory copy of the persisted state; saves mutate this first and
    /// then flush the whole thing to disk.
    cache: Mutex<PersistedState>,
}

impl JsonFileStore {
    /// Open (or initialize) a store under `data_dir`.
    pub async fn open(data_dir: &Path) -> ReconResult<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| ReconError::persistence(format!("cannot create {}: {e}", data_dir.display())))?;

        let state_path = data_dir.join("state.json");
        let store = Self {
            tmp_path: data_dir.join("state.json.tmp"),
            lock_path: data_dir.join(".lock"),
            lock_timeout: Duration::from_secs(10),
            cache: Mutex::new(PersistedState::default()),
            state_path,
        };
        let loaded = store.read_from_disk().await?;
        *store.cache.lock().await = loaded;
        Ok(store)
    }

    async fn read_from_disk(&self) -> ReconResult<PersistedState> {
        match tokio::fs::read_to_string(&self.state_path).await {
            Ok(raw) => {
                let mut state: PersistedState = serde_json::from_str(&raw).map_err(|e| {
                    ReconError::persistence(format!(
                        "cannot parse {}: {e}",
                        self.state_path.display()
                    ))
                })?;
                let repaired = state.normalize();
                if repaired > 0 {
                    debug!(repaired, "reset interrupted jobs to queued on load");
                }
                Ok(state)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(ReconError::persistence(format!(
                "cannot read {}: {e}",
                self.state_path.display()
            ))),
        }
    }

    /// Best-effort advisory lock via exclusive file creation. After the
    /// timeout the write proceeds anyway; atomic replace keeps the file
    /// consistent even if two writers race.
    async fn acquire_lock(&self) {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.lock_path)
                .await
            {
                Ok(_) => return,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        warn!(lock = %self.lock_path.display(), "lock timeout reached, proceeding anyway");
                        return;
                    }
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(e) => {
                    warn!(error = %e, "cannot create lock file, proceeding unlocked");
                    return;
                }
            }
        }
    }

    async fn release_lock(&self) {
        let _ = tokio::fs::remove_file(&self.lock_path).await;
    }

    async fn write_state(&self, state: &PersistedState) -> ReconResult<()> {
        let payload = serde_json::to_vec_pretty(state)?;
        self.acquire_lock().await;
        let result = async {
            tokio::fs::write(&self.tmp_path, &payload).await.map_err(|e| {
                ReconError::persistence(format!("cannot write {}: {e}", self.tmp_path.display()))
            })?;
            tokio::fs::rename(&self.tmp_path, &self.state_path)
                .await
                .map_err(|e| {
                    ReconError::persistence(format!(
                        "cannot replace {}: {e}",
                        self.state_path.display()
                    ))
                })
        }
        .await;
        self.release_lock().await;
        result
    }

    /// Flush the cache, retrying once. A second failure is logged and
    /// swallowed so in-memory progress is never thrown away over a save.
    async fn flush(&self, state: &PersistedState) -> ReconResult<()> {
        if let Err(first) = self.write_state(state).await {
            warn!(error = %first, "state save failed, retrying once");
            if let Err(second) = self.write_state(state).await {
                warn!(error = %second, "state save failed again, continuing with degraded persistence");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_all(&self) -> ReconResult<PersistedState> {
        let state = self.read_from_disk().await?;
        let mut cache = self.cache.lock().await;
        *cache = state.clone();
        Ok(state)
    }

    async fn save_target(&self, target: &Target) -> ReconResult<()> {
        let mut cache = self.cache.lock().await;
        cache.targets.insert(target.name.clone(), target.clone());
        cache.last_updated = Some(Utc::now());
        let snapshot = cache.clone();
        drop(cache);
        self.flush(&snapshot).await
    }

    async fn save_job(&self, job: &Job) -> ReconResult<()> {
        let mut cache = self.cache.lock().await;
        cache.upsert_job(job);
        cache.last_updated = Some(Utc::now());
        let snapshot = cache.clone();
        drop(cache);
        self.flush(&snapshot).await
    }

    async fn save_records(&self, target: &str, records: &TargetRecords) -> ReconResult<()> {
        let mut cache = self.cache.lock().await;
        cache.records.insert(target.to_string(), records.clone());
        cache.last_updated = Some(Utc::now());
        let snapshot = cache.clone();
        drop(cache);
        self.flush(&snapshot).await
    }

    async fn load_records(&self, target: &str) -> ReconResult<TargetRecords> {
        let cache = self.cache.lock().await;
        Ok(cache.records.get(target).cloned().unwrap_or_default())
    }
}
