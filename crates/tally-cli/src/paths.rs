//! Data directory resolution.

use anyhow::Context;
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "TALLY_DATA_DIR";

/// Resolve the data directory: `--data-dir` flag, then `TALLY_DATA_DIR`,
/// then the platform data dir.
pub fn resolve_data_dir(flag: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let base = dirs::data_dir().context("could not determine a platform data directory")?;
    Ok(base.join("tally"))
}
