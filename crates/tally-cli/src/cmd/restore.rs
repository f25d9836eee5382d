//! `tally restore` — load counts from a backup JSON file.

use crate::output::{self, OutputMode};
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use tally_core::export;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup JSON file written by `tally backup`.
    pub file: PathBuf,

    /// Apply without the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run_restore(args: &RestoreArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let backup = export::parse_backup(&text)?;
    let incoming = backup.counts.len();

    let mut store = super::open_store(data_dir)?;
    let collisions = store.backup_collisions(&backup);

    if !args.yes {
        anyhow::bail!(
            "restore would import {incoming} counts ({collisions} overwriting existing ones); \
             re-run with --yes to apply"
        );
    }

    let applied = store.apply_backup(backup)?;
    tracing::info!(applied, collisions, "restored backup");
    output::render_success(
        mode,
        &format!("Restored {applied} counts ({collisions} overwritten)"),
    )
}
