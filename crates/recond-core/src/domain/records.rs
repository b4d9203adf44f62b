//! Per-host scan records accumulated across pipeline stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything known about one discovered subdomain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdomainRecord {
    /// Which tools reported this host (e.g. "amass", "ffuf").
    pub sources: Vec<String>,
    /// HTTP probe result, if the host answered.
    pub http: Option<HttpProbe>,
    /// Template-based vulnerability findings.
    pub findings: Vec<VulnFinding>,
    /// Nikto web server findings.
    pub nikto: Vec<NiktoFinding>,
}

/// Summary of an HTTP probe against one host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpProbe {
    pub url: Option<String>,
    pub status_code: Option<u16>,
    pub content_length: Option<u64>,
    pub title: Option<String>,
    pub webserver: Option<String>,
    pub tech: Option<Vec<String>>,
}

/// One template-scan finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnFinding {
    pub template_id: Option<String>,
    pub name: Option<String>,
    pub severity: Option<String>,
    pub matched_at: Option<String>,
}

/// One nikto finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NiktoFinding {
    pub id: Option<String>,
    pub msg: Option<String>,
    pub osvdb: Option<String>,
    pub risk: Option<String>,
    pub uri: Option<String>,
}

/// All records for one target, keyed by subdomain. BTreeMap keeps the
/// persisted form stable and sorted.
pub type TargetRecords = BTreeMap<String, SubdomainRecord>;

/// Parsed output of one tool invocation, ready to merge into a target's
/// records.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRecords {
    /// Subdomains discovered by an enumeration tool.
    Subdomains(Vec<String>),
    /// HTTP probe results per host.
    HttpProbes(Vec<(String, HttpProbe)>),
    /// Vulnerability findings per host.
    Findings(Vec<(String, VulnFinding)>),
    /// Nikto findings per host.
    NiktoFindings(Vec<(String, NiktoFinding)>),
    /// The tool produced nothing mergeable.
    Empty,
}

impl ToolRecords {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Subdomains(v) => v.is_empty(),
            Self::HttpProbes(v) => v.is_empty(),
            Self::Findings(v) => v.is_empty(),
            Self::NiktoFindings(v) => v.is_empty(),
            Self::Empty => true,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Subdomains(v) => v.len(),
            Self::HttpProbes(v) => v.len(),
            Self::Findings(v) => v.len(),
            Self::NiktoFindings(v) => v.len(),
            Self::Empty => 0,
        }
    }
}

/// Merge one tool's parsed output into a target's records. `source` is the
/// reporting tool's name, tracked per subdomain for provenance.
pub fn merge_records(records: &mut TargetRecords, source: &str, parsed: ToolRecords) {
    match parsed {
        ToolRecords::Subdomains(hosts) => {
            for host in hosts {
                let entry = records.entry(normalize_host(&host)).or_default();
                if !entry.sources.iter().any(|s| s == source) {
                    entry.sources.push(source.to_string());
                }
            }
        }
        ToolRecords::HttpProbes(probes) => {
            for (host, probe) in probes {
                records.entry(normalize_host(&host)).or_default().http = Some(probe);
            }
        }
        ToolRecords::Findings(findings) => {
            for (host, finding) in findings {
                records
                    .entry(normalize_host(&host))
                    .or_default()
                    .findings
                    .push(finding);
            }
        }
        ToolRecords::NiktoFindings(findings) => {
            for (host, finding) in findings {
                records
                    .entry(normalize_host(&host))
                    .or_default()
                    .nikto
                    .push(finding);
            }
        }
        ToolRecords::Empty => {}
    }
}

/// Strip scheme and path from a host reference and lowercase it.
pub fn normalize_host(raw: &str) -> String {
    let host = raw
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let host = host.split('/').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    host.to_ascii_lowercase()
}
