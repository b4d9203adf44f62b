//! Subdomain enumeration via amass.

use super::base::{ReconTool, json_str};
use crate::domain::{Target, ToolRecords};
use std::path::{Path, PathBuf};

pub struct Amass;

impl ReconTool for Amass {
    fn name(&self) -> &'static str {
        "amass"
    }

    fn build_args(&self, target: &Target, data_dir: &Path) -> Vec<String> {
        let out = self.output_path(data_dir, &target.name);
        vec![
            "enum".to_string(),
            "-d".to_string(),
            target.name.clone(),
            "-json".to_string(),
            out.to_string_lossy().into_owned(),
        ]
    }

    fn output_path(&self, data_dir: &Path, target: &str) -> PathBuf {
        data_dir.join(format!("amass_{target}.json"))
    }

    /// Amass emits one JSON object per line; the `name` field carries the
    /// discovered hostname.
    fn parse_output(&self, raw: &str) -> ToolRecords {
        let mut subs: Vec<String> = raw
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                let value: serde_json::Value = serde_json::from_str(line).ok()?;
                json_str(&value, "name").map(|n| n.trim().to_ascii_lowercase())
            })
            .filter(|n| !n.is_empty())
            .collect();
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
    fn parses_line_delimited_json() {
        let raw = concat!(
            r#"{"name": "WWW.Example.com", "addresses": []}"#,
            "\n",
            "not json at all\n",
            r#"{"name": "api.example.com"}"#,
            "\n",
            r#"{"name": "api.example.com"}"#,
            "\n",
        );
        let records = Amass.parse_output(raw);
        assert_eq!(
            records,
            ToolRecords::Subdomains(vec![
                "api.example.com".to_string(),
                "www.example.com".to_string()
            ])
        );
    }

    #[test]
    fn args_name_the_domain_and_output() {
        let target = Target::new("example.com", TargetOverrides::default()).unwrap();
        let args = Amass.build_args(&target, Path::new("recon_data"));
        assert_eq!(args[0], "enum");
        assert!(args.contains(&"example.com".to_string()));
        assert!(args.iter().any(|a| a.ends_with("amass_example.com.json")));
    }
}
