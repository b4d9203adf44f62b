//! Web server scanning via nikto.

use super::base::{ReconTool, json_str};
use crate::domain::{NiktoFinding, Target, ToolRecords, normalize_host};
use std::path::{Path, PathBuf};

pub struct Nikto;

impl ReconTool for Nikto {
    fn name(&self) -> &'static str {
        "nikto"
    }

    fn build_args(&self, target: &Target, data_dir: &Path) -> Vec<String> {
        let out = self.output_path(data_dir, &target.name);
        vec![
            "-h".to_string(),
            format!("http://{}", target.name),
            "-Format".to_string(),
            "json".to_string(),
            "-output".to_string(),
            out.to_string_lossy().into_owned(),
        ]
    }

    fn output_path(&self, data_dir: &Path, target: &str) -> PathBuf {
        data_dir.join(format!("nikto_{target}.json"))
    }

    /// Nikto's JSON output is a single document (object or list of objects),
    /// each with a host reference and a `vulnerabilities` array.
    fn parse_output(&self, raw: &str) -> ToolRecords {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return ToolRecords::Empty;
        };
        let scans = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        let mut findings = Vec::new();
        for scan in &scans {
            let Some(host) = json_str(scan, "host")
                .or_else(|| json_str(scan, "target"))
                .or_else(|| json_str(scan, "banner"))
            else {
                continue;
            };
            let host = normalize_host(&host);
            let vulns = scan
                .get("vulnerabilities")
                .or_else(|| scan.get("vulns"))
                .and_then(|v| v.as_array());
            for vuln in vulns.into_iter().flatten() {
                findings.push((
                    host.clone(),
                    NiktoFinding {
                        id: json_str(vuln, "id"),
                        msg: json_str(vuln, "msg").or_else(|| json_str(vuln, "description")),
                        osvdb: json_str(vuln, "osvdb"),
                        risk: json_str(vuln, "risk"),
                        uri: json_str(vuln, "uri"),
                    },
                ));
            }
        }
        ToolRecords::NiktoFindings(findings)
    }
}
