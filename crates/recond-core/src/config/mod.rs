//! Configuration for the orchestrator.
//!
//! All sections are serde structs with sensible defaults so a missing or
//! partial config file still yields a runnable setup.

mod logging;

pub use logging::LoggingConfig;

use crate::domain::{ConcurrencyBudget, TargetOverrides};
use crate::error::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub scheduler: SchedulerConfig,
    pub controller: ControllerConfig,
    pub storage: StorageConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
    /// Per-target overrides, keyed by sanitized target name.
    pub targets: HashMap<String, TargetOverrides>,
}

/// Scheduler admission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Starting concurrency budget.
    pub initial_jobs: usize,
    /// Budget floor; the controller never drops below this.
    pub min_jobs: usize,
    /// Budget ceiling; also bounds the worker pool.
    pub max_jobs: usize,
    /// Periodic tick interval for the scheduler run loop.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_jobs: 2,
            min_jobs: 1,
            max_jobs: 8,
            tick_interval: Duration::from_secs(5),
        }
    }
}

impl SchedulerConfig {
    pub fn budget(&self) -> ConcurrencyBudget {
        ConcurrencyBudget::new(self.initial_jobs, self.min_jobs, self.max_jobs)
    }
}

/// Dynamic concurrency controller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub enabled: bool,
    /// Sampling period.
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    /// CPU/memory percentage above which the budget is lowered.
    pub high_threshold: f32,
    /// Dead-band width below the high threshold; both metrics must stay
    /// under `high_threshold - hysteresis_margin` before a raise.
    pub hysteresis_margin: f32,
    /// Consecutive low samples required before raising the budget.
    pub raise_after_samples: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: Duration::from_secs(30),
            high_threshold: 85.0,
            hysteresis_margin: 15.0,
            raise_after_samples: 3,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding state.json, the lock file, and tool output files.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("recon_data"),
        }
    }
}

/// Limits applied to one external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolLimits {
    /// Maximum concurrent invocations of this tool.
    pub capacity: usize,
    /// Maximum callers allowed to wait for a slot before QueueFull.
    pub queue_depth: usize,
    /// Hard timeout per invocation.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Total invocation attempts when rate limited (first try included).
    pub max_attempts: u32,
    /// Base delay for exponential backoff between rate-limited attempts.
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,
    /// Minimum output size (bytes) for a non-zero exit to count as a soft
    /// success instead of a failure.
    pub soft_success_min_bytes: u64,
    /// Extra case-insensitive markers that indicate rate limiting, matched
    /// against tool stderr in addition to the built-in set.
    pub rate_limit_markers: Vec<String>,
}

impl Default for ToolLimits {
    fn default() -> Self {
        Self {
            capacity: 2,
            queue_depth: 8,
            timeout: Duration::from_secs(600),
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            soft_success_min_bytes: 1,
            rate_limit_markers: Vec::new(),
        }
    }
}

/// Per-tool limits with a shared default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub defaults: ToolLimits,
    /// Overrides keyed by tool name; absent tools use `defaults`.
    pub per_tool: HashMap<String, ToolLimits>,
}

impl ToolsConfig {
    pub fn limits_for(&self, tool: &str) -> ToolLimits {
        self.per_tool
            .get(tool)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }
}

impl ReconConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> ReconResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReconError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ReconError::config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file when it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> ReconResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> ReconResult<()> {
        let s = &self.scheduler;
        if s.min_jobs == 0 {
            return Err(ReconError::config("scheduler.min_jobs must be at least 1"));
        }
        if s.min_jobs > s.max_jobs {
            return Err(ReconError::config(format!(
                "scheduler.min_jobs ({}) exceeds max_jobs ({})",
                s.min_jobs, s.max_jobs
            )));
        }
        if s.initial_jobs < s.min_jobs || s.initial_jobs > s.max_jobs {
            return Err(ReconError::config(format!(
                "scheduler.initial_jobs ({}) outside [{}, {}]",
                s.initial_jobs, s.min_jobs, s.max_jobs
            )));
        }
        let c = &self.controller;
        if !(0.0..=100.0).contains(&c.high_threshold) {
            return Err(ReconError::config("controller.high_threshold must be a percentage"));
        }
        if c.hysteresis_margin < 0.0 || c.hysteresis_margin >= c.high_threshold {
            return Err(ReconError::config(
                "controller.hysteresis_margin must be non-negative and below high_threshold",
            ));
        }
        for name in self.tools.per_tool.keys() {
            if crate::tools::registry::by_name(name).is_none() {
                return Err(ReconError::config(format!(
                    "tools.per_tool names unknown tool '{name}'"
                )));
            }
        }
        for (name, limits) in
            std::iter::once((&"defaults".to_string(), &self.tools.defaults))
                .chain(self.tools.per_tool.iter())
        {
            if limits.capacity == 0 {
                return Err(ReconError::config(format!(
                    "tools.{name}.capacity must be at least 1"
                )));
            }
            if limits.max_attempts == 0 {
                return Err(ReconError::config(format!(
                    "tools.{name}.max_attempts must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ReconConfig::default().validate().unwrap();
    }

    #[test]
    fn per_tool_limits_fall_back_to_defaults() {
        let mut config = ToolsConfig::default();
        config.per_tool.insert(
            "nikto".to_string(),
            ToolLimits {
                capacity: 1,
                ..Default::default()
            },
        );
        assert_eq!(config.limits_for("nikto").capacity, 1);
        assert_eq!(config.limits_for("httpx").capacity, config.defaults.capacity);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = ReconConfig::default();
        config.scheduler.min_jobs = 5;
        config.scheduler.max_jobs = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_capacity() {
        let mut config = ReconConfig::default();
        config
            .tools
            .per_tool
            .insert("amass".into(), ToolLimits { capacity: 0, ..Default::default() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_tool_names() {
        let mut config = ReconConfig::default();
        config
            .tools
            .per_tool
            .insert("sqlmap".into(), ToolLimits::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ReconConfig =
            serde_json::from_str(r#"{"scheduler": {"initial_jobs": 4}}"#).unwrap();
        assert_eq!(config.scheduler.initial_jobs, 4);
        assert_eq!(config.scheduler.max_jobs, 8);
        assert_eq!(config.storage.data_dir, PathBuf::from("recon_data"));
    }

    #[test]
    fn durations_parse_humantime() {
        let config: ReconConfig = serde_json::from_str(
            r#"{"tools": {"defaults": {"timeout": "90s", "backoff_base": "500ms"}}}"#,
        )
        .unwrap();
        assert_eq!(config.tools.defaults.timeout, Duration::from_secs(90));
        assert_eq!(config.tools.defaults.backoff_base, Duration::from_millis(500));
    }
}
