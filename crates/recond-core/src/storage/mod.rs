//! Persistence layer: source of truth for targets, jobs, and records.
//!
//! Scheduler and pipeline state held in memory is a cache; after a restart
//! everything is rebuilt from a [`StateStore`]. Stores must be
//! crash-consistent: a failed save never leaves a half-written state behind.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::domain::{Job, JobId, Target, TargetRecords};
use crate::error::ReconResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a store persists, in its serialized shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub version: u32,
    pub targets: BTreeMap<String, Target>,
    pub jobs: Vec<Job>,
    /// Scan records per target.
    pub records: BTreeMap<String, TargetRecords>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: 1,
            targets: BTreeMap::new(),
            jobs: Vec::new(),
            records: BTreeMap::new(),
            last_updated: None,
        }
    }
}

impl PersistedState {
    /// Repair state loaded after a crash: steps persisted as running or
    /// queued get no executor on reload, so they are reset to pending and
    /// their jobs re-parked as queued. Returns how many jobs were repaired.
    pub fn normalize(&mut self) -> usize {
        let mut repaired = 0;
        for job in &mut self.jobs {
            if job.normalize_after_restart() {
                repaired += 1;
            }
        }
        repaired
    }

    pub fn job_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn upsert_job(&mut self, job: &Job) {
        match self.job_mut(job.id) {
            Some(existing) => *existing = job.clone(),
            None => self.jobs.push(job.clone()),
        }
    }
}

/// Durable storage of orchestrator state.
///
/// `save_job` and `save_records` are incremental from the caller's point of
/// view; implementations decide how to make them durable. Save failures are
/// the implementation's to retry; callers treat an `Err` as a degraded save
/// and keep their in-memory progress.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load all persisted state, already crash-normalized.
    async fn load_all(&self) -> ReconResult<PersistedState>;

    async fn save_target(&self, target: &Target) -> ReconResult<()>;

    async fn save_job(&self, job: &Job) -> ReconResult<()>;

    async fn save_records(&self, target: &str, records: &TargetRecords) -> ReconResult<()>;

    /// Current records for one target; empty if none were saved yet.
    async fn load_records(&self, target: &str) -> ReconResult<TargetRecords>;
}
