//! Vhost brute-forcing via ffuf.

use super::base::{ReconTool, json_str};
use crate::domain::{Target, ToolRecords, normalize_host};
use std::path::{Path, PathBuf};

pub struct Ffuf;

impl ReconTool for Ffuf {
    fn name(&self) -> &'static str {
        "ffuf"
    }

    /// HTTP-based vhost brute via the Host header. The pipeline skips this
    /// stage when the target has no wordlist configured.
    fn build_args(&self, target: &Target, data_dir: &Path) -> Vec<String> {
        let out = self.output_path(data_dir, &target.name);
        let wordlist = target
            .overrides
            .wordlist
            .as_deref()
            .unwrap_or_else(|| Path::new(""));
        vec![
            "-u".to_string(),
            format!("http://{}", target.name),
            "-H".to_string(),
            format!("Host: FUZZ.{}", target.name),
            "-w".to_string(),
            wordlist.to_string_lossy().into_owned(),
            "-of".to_string(),
            "json".to_string(),
            "-o".to_string(),
            out.to_string_lossy().into_owned(),
            "-mc".to_string(),
            "200,301,302,403,401".to_string(),
        ]
    }

    fn output_path(&self, data_dir: &Path, target: &str) -> PathBuf {
        data_dir.join(format!("ffuf_{target}.json"))
    }

    /// ffuf writes a single JSON document with a `results` array; each
    /// result carries the matched vhost in `host` (or `url`).
    fn parse_output(&self, raw: &str) -> ToolRecords {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return ToolRecords::Empty;
        };
        let mut subs: Vec<String> = value
            .get("results")
            .and_then(|r| r.as_array())
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| json_str(r, "host").or_else(|| json_str(r, "url")))
                    .map(|h| normalize_host(&h))
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        subs.sort();
        subs.dedup();
        ToolRecords::Subdomains(subs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetOverrides;

    #[test]
    fn parses_results_array() {
        let raw = r#"{
            "results": [
                {"host": "dev.example.com", "status": 200},
                {"url": "https://staging.example.com/"},
                {"status": 403}
            ]
        }"#;
        let records = Ffuf.parse_output(raw);
        assert_eq!(
            records,
            ToolRecords::Subdomains(vec![
                "dev.example.com".to_string(),
                "staging.example.com".to_string()
            ])
        );
    }

    #[test]
    fn garbage_output_is_empty_not_fatal() {
        assert_eq!(Ffuf.parse_output("]["), ToolRecords::Empty);
    }

    #[test]
    fn args_use_the_configured_wordlist() {
        let target = Target::new(
            "example.com",
            TargetOverrides {
                wordlist: Some(PathBuf::from("/opt/words.txt")),
                skip_nikto: false,
            },
        )
        .unwrap();
        let args = Ffuf.build_args(&target, Path::new("recon_data"));
        assert!(args.contains(&"/opt/words.txt".to_string()));
        assert!(args.contains(&"Host: FUZZ.example.com".to_string()));
    }
}
