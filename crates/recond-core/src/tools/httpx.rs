//! HTTP probing via httpx.

use super::base::{ReconTool, json_str, subs_file_path};
use crate::domain::{HttpProbe, Target, ToolRecords, normalize_host};
use std::path::{Path, PathBuf};

pub struct Httpx;

impl ReconTool for Httpx {
    fn name(&self) -> &'static str {
        "httpx"
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
            "-timeout".to_string(),
            "10".to_string(),
            "-follow-redirects".to_string(),
            "-silent".to_string(),
        ]
    }

    fn output_path(&self, data_dir: &Path, target: &str) -> PathBuf {
        data_dir.join(format!("httpx_{target}.json"))
    }

    /// One JSON object per probed host.
    fn parse_output(&self, raw: &str) -> ToolRecords {
        let probes: Vec<(String, HttpProbe)> = raw
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                let value: serde_json::Value = serde_json::from_str(line).ok()?;
                let host = json_str(&value, "host").or_else(|| json_str(&value, "url"))?;
                let probe = HttpProbe {
                    url: json_str(&value, "url"),
                    status_code: value
                        .get("status_code")
                        .and_then(|v| v.as_u64())
                        .map(|v| v as u16),
                    content_length: value.get("content_length").and_then(|v| v.as_u64()),
                    title: json_str(&value, "title"),
                    webserver: json_str(&value, "webserver"),
                    tech: value.get("tech").and_then(|v| v.as_array()).map(|arr| {
                        arr.iter()
                            .filter_map(|t| t.as_str().map(str::to_string))
                            .collect()
                    }),
                };
                Some((normalize_host(&host), probe))
            })
            .collect();
        ToolRecords::HttpProbes(probes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetOverrides;

    #[test]
    fn parses_probe_lines() {
        let raw = concat!(
            r#"{"host": "a.example.com", "url": "https://a.example.com", "status_code": 200, "title": "Portal", "webserver": "nginx", "tech": ["nginx", "react"]}"#,
            "\n\n",
            r#"{"url": "http://b.example.com:8080/admin", "status_code": 403}"#,
            "\n",
            "garbage\n",
        );
        let ToolRecords::HttpProbes(probes) = Httpx.parse_output(raw) else {
            panic!("expected http probes");
        };
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].0, "a.example.com");
        assert_eq!(probes[0].1.status_code, Some(200));
        assert_eq!(probes[0].1.tech.as_ref().unwrap().len(), 2);
        assert_eq!(probes[1].0, "b.example.com");
    }

    #[test]
    fn args_read_the_subs_file() {
        let target = Target::new("example.com", TargetOverrides::default()).unwrap();
        let args = Httpx.build_args(&target, Path::new("recon_data"));
        assert!(args.iter().any(|a| a.ends_with("subs_example.com.txt")));
        assert!(args.contains(&"-follow-redirects".to_string()));
    }
}
