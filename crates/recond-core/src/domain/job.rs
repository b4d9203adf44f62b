//! Jobs and their ordered pipeline steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed, ordered list of pipeline stages.
///
/// `Aggregate` is an internal stage (subdomain dedup + subs-file write); it
/// runs inline without an external tool or a gate slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Amass,
    Ffuf,
    Aggregate,
    Httpx,
    Nuclei,
    Nikto,
}

impl StageName {
    /// Pipeline execution order.
    pub const ORDER: [StageName; 6] = [
        StageName::Amass,
        StageName::Ffuf,
        StageName::Aggregate,
        StageName::Httpx,
        StageName::Nuclei,
        StageName::Nikto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amass => "amass",
            Self::Ffuf => "ffuf",
            Self::Aggregate => "aggregate",
            Self::Httpx => "httpx",
            Self::Nuclei => "nuclei",
            Self::Nikto => "nikto",
        }
    }

    /// Name of the external tool backing this stage, if any.
    pub fn tool(&self) -> Option<&'static str> {
        match self {
            Self::Aggregate => None,
            other => Some(other.as_str()),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ORDER.iter().copied().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single pipeline step.
///
/// A step only ever advances forward: `Pending`/`Queued` -> `Running` ->
/// one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Queued,
    Running,
    Done,
    Skipped,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pipeline stage execution within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub stage: StageName,
    pub status: StepStatus,
    /// Number of tool invocation attempts (rate-limit retries included).
    pub attempts: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Warning recorded on soft success (abnormal exit with usable output).
    pub warning: Option<String>,
    /// Failure reason when the step ends `Failed`.
    pub failure: Option<String>,
}

impl Step {
    pub fn new(stage: StageName) -> Self {
        Self {
            stage,
            status: StepStatus::Pending,
            attempts: 0,
            started_at: None,
            finished_at: None,
            warning: None,
            failure: None,
        }
    }

    pub fn set_queued(&mut self) {
        self.status = StepStatus::Queued;
    }

    pub fn begin(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Advance to `Running` unless the step was skipped while it waited for
    /// a tool slot. Returns whether the step actually started; callers hold
    /// the job lock across the check and the transition, so a concurrent
    /// skip either lands before this or is rejected as not skippable.
    pub fn begin_if_unskipped(&mut self) -> bool {
        if self.status == StepStatus::Skipped {
            return false;
        }
        self.begin();
        true
    }

    pub fn finish_done(&mut self, warning: Option<String>) {
        self.status = StepStatus::Done;
        self.warning = warning;
        self.finished_at = Some(Utc::now());
    }

    pub fn finish_skipped(&mut self, reason: Option<String>) {
        self.status = StepStatus::Skipped;
        self.warning = reason;
        self.finished_at = Some(Utc::now());
    }

    pub fn finish_failed(&mut self, reason: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.failure = Some(reason.into());
        self.finished_at = Some(Utc::now());
    }
}

/// Status of a job as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run of the pipeline over a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub target: String,
    pub status: JobStatus,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a queued job with every step pending, in stage order.
    pub fn new(target: &str) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            target: target.to_string(),
            status: JobStatus::Queued,
            steps: StageName::ORDER.iter().map(|s| Step::new(*s)).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn step(&self, stage: StageName) -> Option<&Step> {
        self.steps.iter().find(|s| s.stage == stage)
    }

    pub fn step_mut(&mut self, stage: StageName) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.stage == stage)
    }

    /// Whether every step has reached a terminal status.
    pub fn all_steps_terminal(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_terminal())
    }

    /// The terminal status this job should end with, once all steps are
    /// terminal: `Failed` if any step failed, `Completed` otherwise.
    /// A failed job here means a partially failed scan, not a process error.
    pub fn terminal_status(&self) -> Option<JobStatus> {
        if !self.all_steps_terminal() {
            return None;
        }
        if self.steps.iter().any(|s| s.status == StepStatus::Failed) {
            Some(JobStatus::Failed)
        } else {
            Some(JobStatus::Completed)
        }
    }

    /// Repair state loaded after a crash or restart.
    ///
    /// A `running` step means the process died mid-execution with no live
    /// executor owning it; it is reset to `pending` so the job re-runs it.
    /// `queued` steps were waiting on a gate that no longer exists. Steps
    /// already `done`/`skipped`/`failed` are never re-run. A `running` job
    /// is re-parked as `queued` so the scheduler re-admits it.
    pub fn normalize_after_restart(&mut self) -> bool {
        let mut changed = false;
        for step in &mut self.steps {
            if matches!(step.status, StepStatus::Running | StepStatus::Queued) {
                step.status = StepStatus::Pending;
                step.started_at = None;
                changed = true;
            }
        }
        if self.status == JobStatus::Running {
            self.status = JobStatus::Queued;
            changed = true;
        }
        if changed {
            self.touch();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_has_all_steps_pending_in_order() {
        let job = Job::new("example.com");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.steps.len(), StageName::ORDER.len());
        for (step, stage) in job.steps.iter().zip(StageName::ORDER.iter()) {
            assert_eq!(step.stage, *stage);
            assert_eq!(step.status, StepStatus::Pending);
        }
    }

    #[test]
    fn terminal_status_requires_all_steps_terminal() {
        let mut job = Job::new("example.com");
        assert_eq!(job.terminal_status(), None);

        for step in &mut job.steps {
            step.finish_done(None);
        }
        assert_eq!(job.terminal_status(), Some(JobStatus::Completed));

        job.steps[2].status = StepStatus::Failed;
        assert_eq!(job.terminal_status(), Some(JobStatus::Failed));
    }

    #[test]
    fn skipped_counts_as_clean_completion() {
        let mut job = Job::new("example.com");
        for step in &mut job.steps {
            step.finish_skipped(None);
        }
        assert_eq!(job.terminal_status(), Some(JobStatus::Completed));
    }

    #[test]
    fn restart_resets_running_and_queued_steps() {
        let mut job = Job::new("example.com");
        job.status = JobStatus::Running;
        job.steps[0].finish_done(None);
        job.steps[1].begin();
        job.steps[2].set_queued();

        assert!(job.normalize_after_restart());
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.steps[0].status, StepStatus::Done);
        assert_eq!(job.steps[1].status, StepStatus::Pending);
        assert_eq!(job.steps[2].status, StepStatus::Pending);
    }

    #[test]
    fn restart_leaves_paused_jobs_parked() {
        let mut job = Job::new("example.com");
        job.status = JobStatus::Paused;
        job.steps[0].finish_done(None);

        assert!(!job.normalize_after_restart());
        assert_eq!(job.status, JobStatus::Paused);
    }

    #[test]
    fn skipped_step_never_restarts() {
        let mut step = Step::new(StageName::Httpx);
        step.set_queued();
        step.finish_skipped(Some("skipped by operator".into()));

        assert!(!step.begin_if_unskipped());
        assert_eq!(step.status, StepStatus::Skipped);
        assert_eq!(step.started_at, None);

        let mut queued = Step::new(StageName::Httpx);
        queued.set_queued();
        assert!(queued.begin_if_unskipped());
        assert_eq!(queued.status, StepStatus::Running);
        assert!(queued.started_at.is_some());
    }

    #[test]
    fn stage_lookup_round_trips() {
        for stage in StageName::ORDER {
            assert_eq!(StageName::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(StageName::parse("sqlmap"), None);
        assert_eq!(StageName::Aggregate.tool(), None);
        assert_eq!(StageName::Httpx.tool(), Some("httpx"));
    }
}
