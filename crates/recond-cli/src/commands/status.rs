//! The `status` command: print persisted state.

use recond_core::config::ReconConfig;
use recond_core::storage::{JsonFileStore, StateStore};
use std::path::Path;

pub async fn execute(config_file: &Path) -> anyhow::Result<()> {
    let config = ReconConfig::load_or_default(config_file)?;
    let store = JsonFileStore::open(&config.storage.data_dir).await?;
    let state = store.load_all().await?;

    if state.targets.is_empty() && state.jobs.is_empty() {
        println!("No persisted state in {}.", config.storage.data_dir.display());
        return Ok(());
    }

    println!("Targets ({}):", state.targets.len());
    for (name, target) in &state.targets {
        let mut notes = Vec::new();
        if target.overrides.skip_nikto {
            notes.push("skip-nikto".to_string());
        }
        if let Some(wordlist) = &target.overrides.wordlist {
            notes.push(format!("wordlist={}", wordlist.display()));
        }
        if notes.is_empty() {
            println!("  {name}");
        } else {
            println!("  {name} ({})", notes.join(", "));
        }
    }

    println!();
    println!("Jobs ({}):", state.jobs.len());
    for job in &state.jobs {
        println!("  {:<32} {:<10} ({})", job.target, job.status.as_str(), job.id);
        for step in &job.steps {
            let attempts = if step.attempts > 1 {
                format!(" ({} attempts)", step.attempts)
            } else {
                String::new()
            };
            println!("    {:<12} {}{attempts}", step.stage.as_str(), step.status);
        }
    }

    println!();
    println!("Records:");
    for (target, records) in &state.records {
        let hosts = records.len();
        let probed = records.values().filter(|r| r.http.is_some()).count();
        let findings: usize = records.values().map(|r| r.findings.len() + r.nikto.len()).sum();
        println!("  {target:<32} {hosts} hosts, {probed} probed, {findings} findings");
    }

    if let Some(updated) = state.last_updated {
        println!();
        println!("Last updated: {updated}");
    }
    Ok(())
}
