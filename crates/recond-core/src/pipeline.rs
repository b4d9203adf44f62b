//! The per-job pipeline state machine.
//!
//! Steps run strictly in stage order. A pause request is honored only at
//! step boundaries; an in-flight tool invocation always runs to completion
//! (or its own timeout). Step failures are recorded and the pipeline keeps
//! going: a probing timeout must not prevent unrelated downstream stages
//! from running.

use crate::config::{ReconConfig, ToolLimits};
use crate::domain::{
    Job, JobStatus, StageName, Target, TargetRecords, ToolRecords, merge_records,
};
use crate::error::ReconError;
use crate::gate::ToolGate;
use crate::storage::StateStore;
use crate::tools::{Classified, ReconTool, ToolInvoker, classify, registry, subs_file_path};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// A job shared between the scheduler and its executor. The executor is the
/// only writer while the job runs; the scheduler reads it for snapshots and
/// flips pending steps to skipped.
pub type SharedJob = Arc<Mutex<Job>>;

/// Dependencies every executor needs, cloned per job.
#[derive(Clone)]
pub struct PipelineContext {
    pub store: Arc<dyn StateStore>,
    pub gate: ToolGate,
    pub invoker: Arc<dyn ToolInvoker>,
    pub config: Arc<ReconConfig>,
}

enum StepResult {
    Done {
        parsed: ToolRecords,
        warning: Option<String>,
    },
    Failed(String),
}

/// Drives one job through its steps.
pub struct PipelineExecutor {
    ctx: PipelineContext,
    target: Target,
    job: SharedJob,
    pause: Arc<AtomicBool>,
    records: TargetRecords,
}

impl PipelineExecutor {
    pub fn new(ctx: PipelineContext, target: Target, job: SharedJob, pause: Arc<AtomicBool>) -> Self {
        Self {
            ctx,
            target,
            job,
            pause,
            records: TargetRecords::new(),
        }
    }

    /// Run the job until every step is terminal or a pause lands at a step
    /// boundary. The job's final status is written back and persisted.
    pub async fn run(mut self) {
        self.records = match self.ctx.store.load_records(&self.target.name).await {
            Ok(records) => records,
            Err(e) => {
                warn!(target = %self.target.name, error = %e, "cannot load records, starting empty");
                TargetRecords::new()
            }
        };

        let step_count = self.job.lock().steps.len();
        for idx in 0..step_count {
            if self.pause.load(Ordering::Relaxed) {
                debug!(target = %self.target.name, "pause requested, stopping at step boundary");
                break;
            }
            let (stage, status) = {
                let job = self.job.lock();
                (job.steps[idx].stage, job.steps[idx].status)
            };
            if status.is_terminal() {
                continue;
            }
            self.run_step(idx, stage).await;
        }

        self.finalize().await;
    }

    async fn run_step(&mut self, idx: usize, stage: StageName) {
        if stage == StageName::Aggregate {
            return self.run_aggregate(idx).await;
        }
        if stage == StageName::Nikto && self.target.overrides.skip_nikto {
            return self
                .finish_step(idx, |s| s.finish_skipped(Some("disabled by target override".into())))
                .await;
        }
        if stage == StageName::Ffuf && self.target.overrides.wordlist.is_none() {
            return self
                .finish_step(idx, |s| s.finish_skipped(Some("no wordlist configured".into())))
                .await;
        }
        let Some(tool) = registry::for_stage(stage) else {
            return self
                .finish_step(idx, |s| s.finish_skipped(Some("no tool for stage".into())))
                .await;
        };
        let limits = self.ctx.config.tools.limits_for(tool.name());

        self.finish_step(idx, |s| s.set_queued()).await;
        let permit = match self.ctx.gate.acquire(tool.name()).await {
            Ok(permit) => permit,
            Err(e) => {
                warn!(target = %self.target.name, tool = tool.name(), error = %e, "gate rejected step");
                return self.finish_step(idx, |s| s.finish_failed(e.to_string())).await;
            }
        };
        // The step may have been skipped while it waited for a slot. The
        // check and the transition to running share one lock acquisition, so
        // a concurrent skip cannot land in between.
        let snapshot = {
            let mut job = self.job.lock();
            if !job.steps[idx].begin_if_unskipped() {
                None
            } else {
                job.touch();
                Some(job.clone())
            }
        };
        let Some(snapshot) = snapshot else {
            drop(permit);
            return;
        };
        if let Err(e) = self.ctx.store.save_job(&snapshot).await {
            warn!(target = %self.target.name, error = %e, "job save degraded");
        }
        info!(target = %self.target.name, tool = tool.name(), "step started");

        let result = self.invoke_with_retry(idx, tool, &limits).await;
        drop(permit);

        match result {
            StepResult::Done { parsed, warning } => {
                let merged = parsed.len();
                merge_records(&mut self.records, tool.name(), parsed);
                if let Err(e) = self
                    .ctx
                    .store
                    .save_records(&self.target.name, &self.records)
                    .await
                {
                    warn!(target = %self.target.name, error = %e, "records save degraded");
                }
                info!(target = %self.target.name, tool = tool.name(), merged, "step done");
                self.finish_step(idx, |s| s.finish_done(warning)).await;
            }
            StepResult::Failed(reason) => {
                warn!(target = %self.target.name, tool = tool.name(), %reason, "step failed, continuing pipeline");
                self.finish_step(idx, |s| s.finish_failed(reason)).await;
            }
        }
    }

    async fn invoke_with_retry(
        &self,
        idx: usize,
        tool: &'static dyn ReconTool,
        limits: &ToolLimits,
    ) -> StepResult {
        let data_dir = self.ctx.config.storage.data_dir.clone();
        let mut attempt: u32 = 1;
        loop {
            self.job.lock().steps[idx].attempts = attempt;
            let invoked = self
                .ctx
                .invoker
                .invoke(tool, &self.target, &data_dir, limits.timeout)
                .await;
            match invoked {
                Ok(outcome) => match classify(&outcome, limits) {
                    Classified::Success => {
                        return StepResult::Done {
                            parsed: tool.parse_output(&outcome.output),
                            warning: None,
                        };
                    }
                    Classified::SoftSuccess(warning) => {
                        warn!(target = %self.target.name, tool = tool.name(), %warning, "soft success");
                        return StepResult::Done {
                            parsed: tool.parse_output(&outcome.output),
                            warning: Some(warning),
                        };
                    }
                    Classified::RateLimited => {
                        if attempt >= limits.max_attempts {
                            let err = ReconError::RateLimited {
                                tool: tool.name().to_string(),
                                attempts: attempt,
                            };
                            return StepResult::Failed(err.to_string());
                        }
                        let delay = limits.backoff_base * 2u32.saturating_pow(attempt - 1);
                        debug!(tool = tool.name(), attempt, delay_ms = delay.as_millis() as u64, "rate limited, backing off");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Classified::Failed(reason) => {
                        return StepResult::Failed(
                            ReconError::tool_failed(tool.name(), reason).to_string(),
                        );
                    }
                },
                Err(e) => {
                    // Timeouts and missing binaries are expected step
                    // failures; anything else points at a bug.
                    if !e.is_step_failure() {
                        error!(tool = tool.name(), error = %e, "unexpected invoker error");
                    }
                    return StepResult::Failed(e.to_string());
                }
            }
        }
    }

    /// The aggregate stage dedups everything discovered so far and writes
    /// the subs file the probing stages read. No external tool, no gate.
    async fn run_aggregate(&mut self, idx: usize) {
        self.finish_step(idx, |s| s.begin()).await;
        let subs: Vec<&str> = self.records.keys().map(String::as_str).collect();
        let path = subs_file_path(&self.ctx.config.storage.data_dir, &self.target.name);
        let mut body = subs.join("\n");
        body.push('\n');

        let written = async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, body.as_bytes()).await
        }
        .await;

        match written {
            Ok(()) => {
                info!(target = %self.target.name, count = subs.len(), "aggregated subdomains");
                self.finish_step(idx, |s| s.finish_done(None)).await;
            }
            Err(e) => {
                self.finish_step(idx, |s| {
                    s.finish_failed(format!("cannot write {}: {e}", path.display()))
                })
                .await;
            }
        }
    }

    /// Apply a mutation to one step and persist the job.
    async fn finish_step(&self, idx: usize, mutate: impl FnOnce(&mut crate::domain::Step)) {
        let snapshot = {
            let mut job = self.job.lock();
            mutate(&mut job.steps[idx]);
            job.touch();
            job.clone()
        };
        if let Err(e) = self.ctx.store.save_job(&snapshot).await {
            warn!(target = %self.target.name, error = %e, "job save degraded");
        }
    }

    /// Settle the job's final status: terminal when every step is terminal,
    /// paused when the pipeline stopped early at a boundary. A cancellation
    /// set by the scheduler sticks.
    async fn finalize(&self) {
        let snapshot = {
            let mut job = self.job.lock();
            if job.status != JobStatus::Cancelled {
                match job.terminal_status() {
                    Some(status) => job.status = status,
                    None => job.status = JobStatus::Paused,
                }
            }
            job.touch();
            job.clone()
        };
        if let Err(e) = self.ctx.store.save_job(&snapshot).await {
            warn!(target = %self.target.name, error = %e, "job save degraded");
        }
        info!(target = %self.target.name, status = %snapshot.status, "pipeline stopped");
    }
}
