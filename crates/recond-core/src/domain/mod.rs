//! Shared data model: targets, jobs, steps, budgets, and per-host records.

mod budget;
mod job;
mod records;
mod target;

pub use budget::ConcurrencyBudget;
pub use job::{Job, JobId, JobStatus, StageName, Step, StepStatus};
pub use records::{
    HttpProbe, NiktoFinding, SubdomainRecord, TargetRecords, ToolRecords, VulnFinding,
    merge_records, normalize_host,
};
pub use target::{Target, TargetOverrides, sanitize_target_name};
