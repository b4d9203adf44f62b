//! Job admission under a bounded, adjustable concurrency budget.
//!
//! All admission decisions happen inside one mutex-guarded critical section:
//! the running count is incremented before the executor task is spawned, so
//! the number of running jobs can never overshoot the budget, even when
//! ticks race with job completions. Lowering the budget never interrupts
//! running jobs; the scheduler simply stops admitting until completions
//! bring the count back under the cap.

use crate::domain::{
    ConcurrencyBudget, Job, JobId, JobStatus, StageName, StepStatus, Target, TargetOverrides,
};
use crate::error::{ReconError, ReconResult};
use crate::pipeline::{PipelineContext, PipelineExecutor, SharedJob};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Point-in-time view of the scheduler for status reporting.
#[derive(Debug, Clone)]
pub struct SchedulerSnapshot {
    pub budget: ConcurrencyBudget,
    pub running: usize,
    pub queued: usize,
    pub jobs: Vec<Job>,
}

struct JobEntry {
    target: Target,
    job: SharedJob,
    /// Checked by the executor at step boundaries.
    pause: Arc<AtomicBool>,
}

struct SchedState {
    budget: ConcurrencyBudget,
    /// Jobs with a live executor task. Always `<= budget.current` at
    /// admission time.
    running: usize,
    /// All known jobs, keyed by target name.
    entries: HashMap<String, JobEntry>,
    /// Admission order for queued jobs.
    queue: VecDeque<String>,
}

impl SchedState {
    /// Index of the first queued entry that is not paused.
    fn admissible(&self) -> Option<usize> {
        self.queue.iter().position(|name| {
            self.entries
                .get(name)
                .is_some_and(|e| !e.pause.load(Ordering::Relaxed))
        })
    }
}

/// Admits jobs, tracks their lifecycle, and owns the concurrency budget.
pub struct Scheduler {
    ctx: PipelineContext,
    state: Mutex<SchedState>,
    /// Woken on submissions, completions, and budget raises.
    wake: Notify,
    /// Woken on completions, for idle waiters.
    idle: Notify,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new(ctx: PipelineContext) -> Arc<Self> {
        let budget = ctx.config.scheduler.budget();
        Arc::new(Self {
            ctx,
            state: Mutex::new(SchedState {
                budget,
                running: 0,
                entries: HashMap::new(),
                queue: VecDeque::new(),
            }),
            wake: Notify::new(),
            idle: Notify::new(),
            shutdown: CancellationToken::new(),
        })
    }

    /// Rebuild scheduler state from the store after a restart. Jobs the
    /// store normalized back to `queued` are re-enqueued; paused jobs stay
    /// parked until resumed. Returns how many jobs were picked up.
    pub async fn load(&self) -> ReconResult<usize> {
        let persisted = self.ctx.store.load_all().await?;
        let mut loaded = 0;

        // Re-persist jobs the crash normalization repaired.
        for job in &persisted.jobs {
            if matches!(job.status, JobStatus::Queued | JobStatus::Paused) {
                self.ctx.store.save_job(job).await?;
            }
        }

        let mut state = self.state.lock();
        for job in persisted.jobs {
            let target = match persisted.targets.get(&job.target) {
                Some(target) => target.clone(),
                None => Target::new(
                    &job.target,
                    self.ctx
                        .config
                        .targets
                        .get(&job.target)
                        .cloned()
                        .unwrap_or_default(),
                )?,
            };
            let name = target.name.clone();
            let queued = job.status == JobStatus::Queued;
            let paused = job.status == JobStatus::Paused;
            state.entries.insert(
                name.clone(),
                JobEntry {
                    target,
                    job: Arc::new(Mutex::new(job)),
                    pause: Arc::new(AtomicBool::new(paused)),
                },
            );
            if queued {
                state.queue.push_back(name);
                loaded += 1;
            } else if paused {
                loaded += 1;
            }
        }
        drop(state);

        if loaded > 0 {
            info!(jobs = loaded, "resumed persisted jobs");
            self.wake.notify_one();
        }
        Ok(loaded)
    }

    /// Submit a target for a full pipeline run. Rejects targets that
    /// already have a non-terminal job. Overrides from the configuration
    /// apply unless explicit overrides are given.
    pub async fn submit(
        &self,
        raw_name: &str,
        overrides: Option<TargetOverrides>,
    ) -> ReconResult<JobId> {
        let name = crate::domain::sanitize_target_name(raw_name)?;
        let overrides = overrides
            .or_else(|| self.ctx.config.targets.get(&name).cloned())
            .unwrap_or_default();
        let target = Target::new(&name, overrides)?;

        let (job_id, job_snapshot) = {
            let mut state = self.state.lock();
            if let Some(entry) = state.entries.get(&name)
                && !entry.job.lock().status.is_terminal()
            {
                return Err(ReconError::DuplicateSubmission { target: name });
            }
            let job = Job::new(&name);
            let job_id = job.id;
            let snapshot = job.clone();
            state.entries.insert(
                name.clone(),
                JobEntry {
                    target: target.clone(),
                    job: Arc::new(Mutex::new(job)),
                    pause: Arc::new(AtomicBool::new(false)),
                },
            );
            state.queue.push_back(name.clone());
            (job_id, snapshot)
        };

        self.ctx.store.save_target(&target).await?;
        self.ctx.store.save_job(&job_snapshot).await?;
        info!(target = %name, job = %job_id, "job submitted");
        self.wake.notify_one();
        Ok(job_id)
    }

    /// Admit queued jobs while the budget allows. One admission per
    /// critical section; the running count is bumped before the executor
    /// task exists, so a racing tick cannot admit past the budget.
    pub async fn tick(self: &Arc<Self>) {
        loop {
            let admitted = {
                let mut guard = self.state.lock();
                let state = &mut *guard;
                if state.running > state.budget.ceiling {
                    // Admission always increments under this lock, so this
                    // cannot happen; treat it as fatal accounting corruption.
                    error!(
                        running = state.running,
                        ceiling = state.budget.ceiling,
                        "concurrency invariant violated, halting admission"
                    );
                    return;
                }
                if state.running >= state.budget.current {
                    None
                } else if let Some(idx) = state.admissible() {
                    let name = state
                        .queue
                        .remove(idx)
                        .unwrap_or_default();
                    match state.entries.get(&name) {
                        Some(entry) => {
                            state.running += 1;
                            let snapshot = {
                                let mut job = entry.job.lock();
                                job.status = JobStatus::Running;
                                job.touch();
                                job.clone()
                            };
                            Some((name, entry.target.clone(), entry.job.clone(), entry.pause.clone(), snapshot))
                        }
                        None => continue,
                    }
                } else {
                    None
                }
            };

            let Some((name, target, job, pause, snapshot)) = admitted else {
                return;
            };
            if let Err(e) = self.ctx.store.save_job(&snapshot).await {
                warn!(target = %name, error = %e, "job save degraded");
            }
            debug!(target = %name, "job admitted");

            let scheduler = Arc::clone(self);
            let executor = PipelineExecutor::new(self.ctx.clone(), target, job, pause);
            tokio::spawn(async move {
                executor.run().await;
                scheduler.on_job_finished(&name);
            });
        }
    }

    fn on_job_finished(&self, name: &str) {
        let mut state = self.state.lock();
        state.running = state.running.saturating_sub(1);
        debug!(target = %name, running = state.running, "job finished");
        drop(state);
        self.wake.notify_one();
        self.idle.notify_waiters();
    }

    /// Run the admission loop until shutdown. Ticks on submissions,
    /// completions, budget raises, and a periodic timer.
    pub async fn run(self: Arc<Self>) {
        let interval = self.ctx.config.scheduler.tick_interval;
        loop {
            self.tick().await;
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(interval) => {}
            }
        }
        info!("scheduler stopped");
    }

    /// Stop admitting and ask running jobs to stop at their next step
    /// boundary. In-flight tool invocations still run to completion.
    pub fn request_shutdown(&self) {
        let state = self.state.lock();
        for entry in state.entries.values() {
            entry.pause.store(true, Ordering::Relaxed);
        }
        drop(state);
        self.shutdown.cancel();
        self.wake.notify_one();
    }

    /// Pause one target. A running job stops at its next step boundary; a
    /// queued job is parked and will not be admitted until resumed.
    pub async fn pause(&self, target: &str) -> ReconResult<()> {
        let snapshot = {
            let mut state = self.state.lock();
            let entry = state.entries.get(target).ok_or_else(|| {
                ReconError::UnknownTarget {
                    target: target.to_string(),
                }
            })?;
            entry.pause.store(true, Ordering::Relaxed);
            let mut job = entry.job.lock();
            if job.status == JobStatus::Queued {
                job.status = JobStatus::Paused;
                job.touch();
                let snapshot = job.clone();
                drop(job);
                state.queue.retain(|n| n != target);
                Some(snapshot)
            } else {
                // A running job persists its own pause when the executor
                // stops at a boundary.
                None
            }
        };
        if let Some(job) = snapshot {
            self.ctx.store.save_job(&job).await?;
        }
        info!(target, "pause requested");
        Ok(())
    }

    /// Resume a paused target: it re-enters the queue and waits for budget
    /// like any other job.
    pub async fn resume(&self, target: &str) -> ReconResult<()> {
        let snapshot = {
            let mut state = self.state.lock();
            let entry = state.entries.get(target).ok_or_else(|| {
                ReconError::UnknownTarget {
                    target: target.to_string(),
                }
            })?;
            entry.pause.store(false, Ordering::Relaxed);
            let mut job = entry.job.lock();
            if job.status == JobStatus::Paused {
                job.status = JobStatus::Queued;
                job.touch();
                let snapshot = job.clone();
                drop(job);
                state.queue.push_back(target.to_string());
                Some(snapshot)
            } else {
                None
            }
        };
        if let Some(job) = snapshot {
            self.ctx.store.save_job(&job).await?;
            info!(target, "job resumed");
            self.wake.notify_one();
        }
        Ok(())
    }

    /// Stop all work: pause every known non-terminal job. Running jobs stop
    /// at their next step boundary, queued jobs are parked, and every job
    /// stays resumable; nothing is hard-killed. One failed pause does not
    /// stop the sweep; each target's result is reported individually.
    pub async fn cancel_all(&self) -> Vec<(String, ReconResult<()>)> {
        let mut results = Vec::new();
        for name in self.non_terminal_targets() {
            let result = self.pause(&name).await;
            results.push((name, result));
        }
        results
    }

    /// Resume every paused job, reporting each target's result. This also
    /// clears pause requests on jobs still draining toward a step boundary,
    /// so they keep running instead of parking. Jobs with no pause in
    /// effect are left alone.
    pub async fn resume_all(&self) -> Vec<(String, ReconResult<()>)> {
        let mut results = Vec::new();
        for name in self.non_terminal_targets() {
            let pausing = {
                let state = self.state.lock();
                state
                    .entries
                    .get(&name)
                    .is_some_and(|e| e.pause.load(Ordering::Relaxed))
            };
            if pausing {
                let result = self.resume(&name).await;
                results.push((name, result));
            }
        }
        results
    }

    /// Cancel one target's job: all steps that have not started are marked
    /// skipped, and the job ends `Cancelled`. A step already running
    /// finishes on its own; cancellation never kills a child process.
    pub async fn cancel(&self, target: &str) -> ReconResult<()> {
        let snapshot = {
            let mut state = self.state.lock();
            let entry = state.entries.get(target).ok_or_else(|| {
                ReconError::UnknownTarget {
                    target: target.to_string(),
                }
            })?;
            entry.pause.store(true, Ordering::Relaxed);
            let mut job = entry.job.lock();
            if job.status.is_terminal() {
                return Err(ReconError::invalid_input(format!(
                    "job for '{target}' is already {}",
                    job.status
                )));
            }
            for step in &mut job.steps {
                if matches!(step.status, StepStatus::Pending | StepStatus::Queued) {
                    step.finish_skipped(Some("cancelled".to_string()));
                }
            }
            job.status = JobStatus::Cancelled;
            job.touch();
            let snapshot = job.clone();
            drop(job);
            state.queue.retain(|n| n != target);
            snapshot
        };
        self.ctx.store.save_job(&snapshot).await?;
        info!(target, "job cancelled");
        Ok(())
    }

    /// Skip one step of a target's job. Only steps that have not started
    /// running can be skipped; a step waiting on the tool gate releases its
    /// place without running.
    pub async fn skip_step(&self, target: &str, stage: StageName) -> ReconResult<()> {
        let snapshot = {
            let state = self.state.lock();
            let entry = state.entries.get(target).ok_or_else(|| {
                ReconError::UnknownTarget {
                    target: target.to_string(),
                }
            })?;
            let mut job = entry.job.lock();
            let step = job.step_mut(stage).ok_or_else(|| {
                ReconError::invalid_input(format!("job has no step '{stage}'"))
            })?;
            if !matches!(step.status, StepStatus::Pending | StepStatus::Queued) {
                return Err(ReconError::StepNotSkippable {
                    step: stage.to_string(),
                    status: step.status.to_string(),
                });
            }
            step.finish_skipped(Some("skipped by operator".to_string()));
            job.touch();
            job.clone()
        };
        self.ctx.store.save_job(&snapshot).await?;
        info!(target, stage = %stage, "step skipped");
        Ok(())
    }

    /// Raise the budget by one. Returns whether it changed.
    pub fn raise_budget(&self) -> bool {
        let changed = self.state.lock().budget.raise();
        if changed {
            self.wake.notify_one();
        }
        changed
    }

    /// Lower the budget by one. Running jobs are unaffected. Returns
    /// whether it changed.
    pub fn lower_budget(&self) -> bool {
        self.state.lock().budget.lower()
    }

    pub fn budget(&self) -> ConcurrencyBudget {
        self.state.lock().budget
    }

    pub fn running_jobs(&self) -> usize {
        self.state.lock().running
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.state.lock();
        let mut jobs: Vec<Job> = state
            .entries
            .values()
            .map(|e| e.job.lock().clone())
            .collect();
        jobs.sort_by(|a, b| a.target.cmp(&b.target));
        SchedulerSnapshot {
            budget: state.budget,
            running: state.running,
            queued: state.queue.len(),
            jobs,
        }
    }

    /// Wait until no job is running and nothing admissible is queued.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            {
                let state = self.state.lock();
                if state.running == 0 && state.admissible().is_none() {
                    return;
                }
            }
            notified.await;
        }
    }

    fn non_terminal_targets(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .entries
            .iter()
            .filter(|(_, e)| !e.job.lock().status.is_terminal())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use crate::gate::ToolGate;
    use crate::storage::{MemoryStore, StateStore};
    use crate::tools::{ReconTool, ToolInvoker, ToolOutcome};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Scripted invoker: every invocation waits for a permit, then succeeds
    /// with empty output. Lets tests hold jobs mid-step.
    struct StallInvoker {
        release: Arc<Semaphore>,
        invocations: AtomicUsize,
    }

    impl StallInvoker {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                release: Arc::new(Semaphore::new(0)),
                invocations: AtomicUsize::new(0),
            })
        }

        fn release_all(&self) {
            self.release.add_permits(1000);
        }
    }

    #[async_trait]
    impl ToolInvoker for StallInvoker {
        async fn invoke(
            &self,
            tool: &dyn ReconTool,
            target: &Target,
            data_dir: &Path,
            _timeout: Duration,
        ) -> ReconResult<ToolOutcome> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            let permit = self
                .release
                .acquire()
                .await
                .map_err(|_| ReconError::invariant("release semaphore closed"))?;
            permit.forget();
            Ok(ToolOutcome {
                exit_code: Some(0),
                output: String::new(),
                output_path: tool.output_path(data_dir, &target.name),
                stderr_tail: String::new(),
                duration_ms: 1,
            })
        }
    }

    fn test_ctx(invoker: Arc<dyn ToolInvoker>, initial_jobs: usize, data_dir: &Path) -> PipelineContext {
        let mut config = ReconConfig::default();
        config.scheduler.initial_jobs = initial_jobs;
        config.storage.data_dir = data_dir.to_path_buf();
        let config = Arc::new(config);
        PipelineContext {
            store: Arc::new(MemoryStore::default()),
            gate: ToolGate::new(config.tools.clone()),
            invoker,
            config,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn admission_never_exceeds_budget() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(test_ctx(invoker.clone(), 2, dir.path()));

        for name in ["a.com", "b.com", "c.com"] {
            scheduler.submit(name, None).await.unwrap();
        }
        scheduler.tick().await;
        settle().await;

        let snap = scheduler.snapshot();
        assert_eq!(snap.running, 2);
        assert_eq!(snap.queued, 1);
        assert_eq!(
            snap.jobs
                .iter()
                .filter(|j| j.status == JobStatus::Running)
                .count(),
            2
        );

        invoker.release_all();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                scheduler.tick().await;
                if scheduler.snapshot().jobs.iter().all(|j| j.status.is_terminal()) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();

        let snap = scheduler.snapshot();
        assert!(snap.jobs.iter().all(|j| j.status == JobStatus::Completed));
    }

    #[tokio::test]
    async fn raising_budget_admits_more() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(test_ctx(invoker.clone(), 1, dir.path()));

        scheduler.submit("a.com", None).await.unwrap();
        scheduler.submit("b.com", None).await.unwrap();
        scheduler.tick().await;
        settle().await;
        assert_eq!(scheduler.snapshot().running, 1);

        assert!(scheduler.raise_budget());
        scheduler.tick().await;
        settle().await;
        assert_eq!(scheduler.snapshot().running, 2);

        invoker.release_all();
    }

    #[tokio::test]
    async fn duplicate_submission_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(test_ctx(invoker, 2, dir.path()));

        scheduler.submit("a.com", None).await.unwrap();
        let err = scheduler.submit("A.com.", None).await.unwrap_err();
        assert!(matches!(err, ReconError::DuplicateSubmission { .. }));
    }

    #[tokio::test]
    async fn paused_queued_job_is_not_admitted() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(test_ctx(invoker.clone(), 2, dir.path()));

        scheduler.submit("a.com", None).await.unwrap();
        scheduler.pause("a.com").await.unwrap();
        scheduler.tick().await;
        settle().await;

        let snap = scheduler.snapshot();
        assert_eq!(snap.running, 0);
        assert_eq!(snap.jobs[0].status, JobStatus::Paused);

        scheduler.resume("a.com").await.unwrap();
        scheduler.tick().await;
        settle().await;
        assert_eq!(scheduler.snapshot().running, 1);

        invoker.release_all();
    }

    #[tokio::test]
    async fn cancel_all_parks_everything_resumably() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(test_ctx(invoker.clone(), 1, dir.path()));

        scheduler.submit("a.com", None).await.unwrap();
        scheduler.submit("b.com", None).await.unwrap();
        scheduler.tick().await;
        settle().await;
        assert_eq!(scheduler.snapshot().running, 1);

        let results = scheduler.cancel_all().await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));

        // The running job drains to its next step boundary and parks; the
        // queued job parks immediately. Nothing ends up terminal.
        invoker.release_all();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                scheduler.tick().await;
                let snap = scheduler.snapshot();
                if snap.running == 0
                    && snap.jobs.iter().all(|j| j.status == JobStatus::Paused)
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let resumed = scheduler.resume_all().await;
        assert_eq!(resumed.len(), 2);
        assert!(resumed.iter().all(|(_, r)| r.is_ok()));

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                scheduler.tick().await;
                if scheduler
                    .snapshot()
                    .jobs
                    .iter()
                    .all(|j| j.status == JobStatus::Completed)
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn cancel_skips_unstarted_steps() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(test_ctx(invoker, 2, dir.path()));

        scheduler.submit("a.com", None).await.unwrap();
        scheduler.cancel("a.com").await.unwrap();

        let snap = scheduler.snapshot();
        assert_eq!(snap.jobs[0].status, JobStatus::Cancelled);
        assert!(
            snap.jobs[0]
                .steps
                .iter()
                .all(|s| s.status == StepStatus::Skipped)
        );
        assert_eq!(snap.queued, 0);

        // A cancelled job never gets admitted.
        scheduler.tick().await;
        assert_eq!(scheduler.snapshot().running, 0);
    }

    #[tokio::test]
    async fn skip_step_only_before_it_runs() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(test_ctx(invoker.clone(), 1, dir.path()));

        scheduler.submit("a.com", None).await.unwrap();
        scheduler
            .skip_step("a.com", StageName::Nuclei)
            .await
            .unwrap();

        scheduler.tick().await;
        settle().await;

        // amass is running now; skipping it must fail.
        let err = scheduler
            .skip_step("a.com", StageName::Amass)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconError::StepNotSkippable { .. }));

        invoker.release_all();
        tokio::time::timeout(Duration::from_secs(5), scheduler.wait_idle())
            .await
            .unwrap();

        let snap = scheduler.snapshot();
        let job = &snap.jobs[0];
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(
            job.step(StageName::Nuclei).unwrap().status,
            StepStatus::Skipped
        );
        assert_eq!(job.step(StageName::Amass).unwrap().status, StepStatus::Done);
    }

    #[tokio::test]
    async fn load_requeues_persisted_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());

        // A job persisted as running, as after a crash.
        let target = Target::new("a.com", TargetOverrides::default()).unwrap();
        let mut job = Job::new("a.com");
        job.status = JobStatus::Running;
        job.steps[0].begin();
        store.save_target(&target).await.unwrap();
        store.save_job(&job).await.unwrap();

        let mut config = ReconConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        let config = Arc::new(config);
        let invoker = StallInvoker::new();
        let scheduler = Scheduler::new(PipelineContext {
            store,
            gate: ToolGate::new(config.tools.clone()),
            invoker: invoker.clone(),
            config,
        });

        assert_eq!(scheduler.load().await.unwrap(), 1);
        let snap = scheduler.snapshot();
        assert_eq!(snap.jobs[0].status, JobStatus::Queued);
        assert_eq!(snap.jobs[0].steps[0].status, StepStatus::Pending);
        assert_eq!(snap.queued, 1);

        invoker.release_all();
        scheduler.tick().await;
        tokio::time::timeout(Duration::from_secs(5), scheduler.wait_idle())
            .await
            .unwrap();
        assert_eq!(scheduler.snapshot().jobs[0].status, JobStatus::Completed);
    }
}
