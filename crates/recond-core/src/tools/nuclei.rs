//! Template-based vulnerability scanning via nuclei.

use super::base::{ReconTool, json_str, subs_file_path};
use crate::domain::{Target, ToolRecords, VulnFinding, normalize_host};
use std::path::{Path, PathBuf};

pub struct Nuclei;

impl ReconTool for Nuclei {
    fn name(&self) -> &'static str {
        "nuclei"
    }

    fn build_args(&self, target: &Target, data_dir: &Path) -> Vec<String> {
        let out = self.output_path(data_dir, &target.name);
        vec![
            "-l".to_string(),
            subs_file_path(data_dir, &target.name)
                .to_string_lossy()
                .into_owned(),
            "-json".to_string(),
            "-o".to_string(),
            out.to_string_lossy().into_owned(),
            "-silent".to_string(),
        ]
    }

    fn output_path(&self, data_dir: &Path, target: &str) -> PathBuf {
        data_dir.join(format!("nuclei_{target}.json"))
    }

    /// One JSON finding per line; the host is under `host`, `matched-at`,
    /// or `url` depending on nuclei version.
    fn parse_output(&self, raw: &str) -> ToolRecords {
        let findings: Vec<(String, VulnFinding)> = raw
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                let value: serde_json::Value = serde_json::from_str(line).ok()?;
                let host = json_str(&value, "host")
                    .or_else(|| json_str(&value, "matched-at"))
                    .or_else(|| json_str(&value, "url"))?;
                let info = value.get("info");
                let finding = VulnFinding {
                    template_id: json_str(&value, "template-id"),
                    name: info.and_then(|i| json_str(i, "name")),
                    severity: info.and_then(|i| json_str(i, "severity")),
                    matched_at: json_str(&value, "matched-at").or_else(|| json_str(&value, "url")),
                };
                Some((normalize_host(&host), finding))
            })
            .collect();
        ToolRecords::Findings(findings)
    }
}
