//! In-memory store for tests and ephemeral runs.

use super::{PersistedState, StateStore};
use crate::domain::{Job, Target, TargetRecords};
use crate::error::ReconResult;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-built state (e.g. to simulate a restart).
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Current state, for assertions.
    pub async fn dump(&self) -> PersistedState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_all(&self) -> ReconResult<PersistedState> {
        let mut state = self.state.lock().await;
        state.normalize();
        Ok(state.clone())
    }

    async fn save_target(&self, target: &Target) -> ReconResult<()> {
        let mut state = self.state.lock().await;
        state.targets.insert(target.name.clone(), target.clone());
        state.last_updated = Some(Utc::now());
        Ok(())
    }

    async fn save_job(&self, job: &Job) -> ReconResult<()> {
        let mut state = self.state.lock().await;
        state.upsert_job(job);
        state.last_updated = Some(Utc::now());
        Ok(())
    }

    async fn save_records(&self, target: &str, records: &TargetRecords) -> ReconResult<()> {
        let mut state = self.state.lock().await;
        state.records.insert(target.to_string(), records.clone());
        state.last_updated = Some(Utc::now());
        Ok(())
    }

    async fn load_records(&self, target: &str) -> ReconResult<TargetRecords> {
        let state = self.state.lock().await;
        Ok(state.records.get(target).cloned().unwrap_or_default())
    }
}
