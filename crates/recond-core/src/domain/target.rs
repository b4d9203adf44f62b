//! Targets: domains under reconnaissance.

use crate::error::{ReconError, ReconResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-target configuration overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetOverrides {
    /// Wordlist for ffuf vhost brute-forcing. The ffuf stage is skipped
    /// when no wordlist is configured.
    pub wordlist: Option<PathBuf>,
    /// Skip the nikto stage entirely (it can be heavy).
    pub skip_nikto: bool,
}

/// A domain/host scheduled for reconnaissance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Sanitized domain name; the unique key for this target.
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub overrides: TargetOverrides,
}

impl Target {
    /// Create a target from a raw name, sanitizing it first.
    pub fn new(raw_name: &str, overrides: TargetOverrides) -> ReconResult<Self> {
        Ok(Self {
            name: sanitize_target_name(raw_name)?,
            created_at: Utc::now(),
            overrides,
        })
    }
}

/// Normalize and validate a target name.
///
/// Lowercases, trims whitespace and a trailing dot, then validates the
/// result as a plausible hostname. Rejects empty names, names over 253
/// characters, and anything outside `[a-z0-9.-]`.
pub fn sanitize_target_name(raw: &str) -> ReconResult<String> {
    let name = raw.trim().trim_end_matches('.').to_ascii_lowercase();

    if name.is_empty() {
        return Err(ReconError::invalid_input("target name is empty"));
    }
    if name.len() > 253 {
        return Err(ReconError::invalid_input(format!(
            "target name too long ({} chars)",
            name.len()
        )));
    }
    for label in name.split('.') {
        if label.is_empty() {
            return Err(ReconError::invalid_input(format!(
                "target name '{name}' has an empty label"
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ReconError::invalid_input(format!(
                "target name '{name}' contains invalid characters"
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ReconError::invalid_input(format!(
                "target label '{label}' starts or ends with '-'"
            )));
        }
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_trims() {
        assert_eq!(
            sanitize_target_name("  Example.COM. ").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn sanitize_rejects_bad_names() {
        assert!(sanitize_target_name("").is_err());
        assert!(sanitize_target_name("exa mple.com").is_err());
        assert!(sanitize_target_name("foo..com").is_err());
        assert!(sanitize_target_name("-bad.com").is_err());
        assert!(sanitize_target_name(&"a".repeat(300)).is_err());
    }

    #[test]
    fn target_keeps_overrides() {
        let target = Target::new(
            "example.com",
            TargetOverrides {
                wordlist: Some(PathBuf::from("/tmp/words.txt")),
                skip_nikto: true,
            },
        )
        .unwrap();
        assert!(target.overrides.skip_nikto);
    }
}
