//! `tally backup` — dump every count to a backup JSON file.

use crate::output::{self, OutputMode};
use anyhow::Context;
use chrono::Utc;
use clap::Args;
use std::path::{Path, PathBuf};
use tally_core::export;

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Output file. Defaults to a timestamped name in the current directory;
    /// `-` writes to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run_backup(args: &BackupArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let store = super::open_store(data_dir)?;
    let backup = store.export_all();
    let json = export::to_json(&backup)?;

    if args.output.as_deref() == Some(Path::new("-")) {
        println!("{json}");
        return Ok(());
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(export::backup_file_name(Utc::now())));
    std::fs::write(&path, &json).with_context(|| format!("failed to write {}", path.display()))?;
    output::render_success(
        mode,
        &format!("Backed up {} counts to {}", backup.counts.len(), path.display()),
    )
}
