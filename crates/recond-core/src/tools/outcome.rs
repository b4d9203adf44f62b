//! Classifying tool invocation outcomes.
//!
//! A non-zero exit with usable output is a soft success: one flaky tool must
//! not block the rest of the pipeline. What counts as "usable" is
//! configurable per tool and every soft success is logged, so the leniency
//! stays visible.

use super::invoker::ToolOutcome;
use crate::config::ToolLimits;

/// Built-in markers indicating the tool was rate limited upstream.
const RATE_LIMIT_MARKERS: [&str; 3] = ["429", "rate limit", "too many requests"];

/// How one invocation ended, from the pipeline's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Clean exit; output is authoritative.
    Success,
    /// Abnormal exit but usable output; carries the warning to record.
    SoftSuccess(String),
    /// Rate limited; the caller retries with backoff.
    RateLimited,
    /// No usable result; carries the failure reason.
    Failed(String),
}

pub fn classify(outcome: &ToolOutcome, limits: &ToolLimits) -> Classified {
    if outcome.exit_code == Some(0) {
        return Classified::Success;
    }

    if is_rate_limited(&outcome.stderr_tail, &limits.rate_limit_markers) {
        return Classified::RateLimited;
    }

    let usable = !outcome.output.trim().is_empty()
        && outcome.output.len() as u64 >= limits.soft_success_min_bytes;
    if usable {
        return Classified::SoftSuccess(format!(
            "exit code {} but {} bytes of usable output kept",
            code_str(outcome.exit_code),
            outcome.output.len(),
        ));
    }

    Classified::Failed(format!(
        "exit code {} with no usable output; stderr: {}",
        code_str(outcome.exit_code),
        outcome.stderr_tail.trim(),
    ))
}

fn is_rate_limited(stderr: &str, extra_markers: &[String]) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| stderr.contains(m))
        || extra_markers
            .iter()
            .any(|m| !m.is_empty() && stderr.contains(&m.to_ascii_lowercase()))
}

fn code_str(code: Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcome(exit_code: Option<i32>, output: &str, stderr: &str) -> ToolOutcome {
        ToolOutcome {
            exit_code,
            output: output.to_string(),
            output_path: PathBuf::from("out.json"),
            stderr_tail: stderr.to_string(),
            duration_ms: 5,
        }
    }

    #[test]
    fn clean_exit_is_success_even_with_empty_output() {
        let limits = ToolLimits::default();
        assert_eq!(classify(&outcome(Some(0), "", ""), &limits), Classified::Success);
    }

    #[test]
    fn nonzero_exit_with_output_is_soft_success() {
        let limits = ToolLimits::default();
        let classified = classify(&outcome(Some(1), "{\"name\": \"a.example.com\"}", ""), &limits);
        assert!(matches!(classified, Classified::SoftSuccess(_)));
    }

    #[test]
    fn soft_success_threshold_is_configurable() {
        let limits = ToolLimits {
            soft_success_min_bytes: 1024,
            ..Default::default()
        };
        let classified = classify(&outcome(Some(1), "tiny", ""), &limits);
        assert!(matches!(classified, Classified::Failed(_)));
    }

    #[test]
    fn rate_limit_markers_trigger_retry() {
        let limits = ToolLimits::default();
        assert_eq!(
            classify(&outcome(Some(1), "", "HTTP 429 Too Many Requests"), &limits),
            Classified::RateLimited
        );

        let custom = ToolLimits {
            rate_limit_markers: vec!["quota exceeded".to_string()],
            ..Default::default()
        };
        assert_eq!(
            classify(&outcome(Some(2), "", "API quota exceeded for key"), &custom),
            Classified::RateLimited
        );
    }

    #[test]
    fn signal_death_without_output_fails() {
        let limits = ToolLimits::default();
        let classified = classify(&outcome(None, "", "killed"), &limits);
        match classified {
            Classified::Failed(reason) => assert!(reason.contains("signal")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
