use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Overrides the home directory, mainly for tests and sandboxes
pub const HOME_ENV: &str = "STATEMENTSENSE_HOME";

pub fn app_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".statementsense"))
}

pub fn ensure_app_home() -> Result<PathBuf> {
    let dir = app_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
