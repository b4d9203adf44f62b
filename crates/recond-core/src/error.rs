//! Error types shared across the orchestrator.

use thiserror::Error;

/// Result type alias for recond operations.
pub type ReconResult<T> = Result<T, ReconError>;

/// Main error type for recond.
///
/// Step-level failures (`QueueFull`, `ToolTimeout`, `ToolUnavailable`,
/// `RateLimited`, `ToolFailed`) are absorbed by the pipeline executor and
/// recorded on the affected step; they never propagate out of a running job.
/// `InvariantViolation` is the one variant that indicates a programming
/// error rather than an operational condition.
#[derive(Error, Debug)]
pub enum ReconError {
    /// A non-terminal job already exists for the submitted target.
    #[error("target '{target}' already has an active job")]
    DuplicateSubmission { target: String },

    /// No job exists for the named target.
    #[error("no job found for target '{target}'")]
    UnknownTarget { target: String },

    /// The tool gate's wait queue for this tool is at capacity.
    #[error("tool gate queue full for '{tool}'")]
    QueueFull { tool: String },

    /// The tool did not exit within its configured timeout.
    #[error("tool '{tool}' timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    /// The tool binary is not installed or not on PATH.
    #[error("tool '{tool}' is not available")]
    ToolUnavailable { tool: String },

    /// The tool reported rate limiting; retries were exhausted.
    #[error("tool '{tool}' rate limited after {attempts} attempts")]
    RateLimited { tool: String, attempts: u32 },

    /// The tool exited abnormally without usable output.
    #[error("tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// A step operation was attempted in a state that forbids it.
    #[error("step '{step}' is {status} and cannot be skipped")]
    StepNotSkippable { step: String, status: String },

    /// Persistence failure (I/O or lock) while saving state.
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// A scheduler accounting invariant was broken. Must never occur.
    #[error("concurrency invariant violated: {message}")]
    InvariantViolation { message: String },

    /// Configuration is missing, unreadable, or inconsistent.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Invalid caller-supplied input, e.g. a malformed target name.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// IO errors outside the persistence layer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconError {
    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a tool failure error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an invariant-violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Whether this error is a step-level failure that the pipeline
    /// absorbs into the step record instead of propagating.
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self,
            Self::QueueFull { .. }
                | Self::ToolTimeout { .. }
                | Self::ToolUnavailable { .. }
                | Self::RateLimited { .. }
                | Self::ToolFailed { .. }
        )
    }
}
