//! The `config` command: init, show, validate.

use crate::args::ConfigAction;
use anyhow::{Context, bail};
use recond_core::config::ReconConfig;
use std::path::Path;

pub async fn execute(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show { config_file } => show(&config_file),
        ConfigAction::Validate { config_file } => validate(&config_file),
        ConfigAction::Init { config_file, force } => init(&config_file, force),
    }
}

fn show(path: &Path) -> anyhow::Result<()> {
    let config = ReconConfig::load_or_default(path)?;
    if !path.exists() {
        println!("# {} not found; showing defaults", path.display());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    ReconConfig::load(path)?;
    println!("{} is valid.", path.display());
    Ok(())
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    let config = ReconConfig::default();
    let body = serde_json::to_string_pretty(&config)?;
    std::fs::write(path, body + "\n")
        .with_context(|| format!("cannot write {}", path.display()))?;
    println!("Wrote {}.", path.display());
    Ok(())
}
