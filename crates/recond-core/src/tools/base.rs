//! Base trait for external tool wrappers.

use crate::domain::{Target, ToolRecords};
use std::path::{Path, PathBuf};

/// One external reconnaissance tool.
///
/// Implementations are stateless: they know how to build an argument vector
/// for a target, where the tool writes its output, and how to parse that
/// output into mergeable records. Invocation itself goes through a
/// [`super::ToolInvoker`].
pub trait ReconTool: Send + Sync {
    /// Unique tool name; also the gate key.
    fn name(&self) -> &'static str;

    /// Binary name looked up on PATH. Usually the same as `name`.
    fn binary(&self) -> &'static str {
        self.name()
    }

    /// Whether the tool can be invoked on this machine.
    fn check_available(&self) -> bool {
        binary_on_path(self.binary())
    }

    /// Argument vector for one invocation against `target`.
    fn build_args(&self, target: &Target, data_dir: &Path) -> Vec<String>;

    /// Where this tool writes its output for `target`.
    fn output_path(&self, data_dir: &Path, target: &str) -> PathBuf;

    /// Parse raw output into records. Parsers are lenient: unparseable
    /// lines are dropped, never fatal.
    fn parse_output(&self, raw: &str) -> ToolRecords;
}

/// Check whether `binary` resolves on PATH.
pub fn binary_on_path(binary: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        let candidate = dir.join(binary);
        candidate.is_file()
    })
}

/// The deduplicated subdomain list file shared by the aggregate, httpx, and
/// nuclei stages.
pub fn subs_file_path(data_dir: &Path, target: &str) -> PathBuf {
    data_dir.join(format!("subs_{target}.txt"))
}

/// Pull a string out of a JSON value, stringifying numbers.
pub(crate) fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
