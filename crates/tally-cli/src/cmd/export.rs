//! `tally export` — write one count as CSV.

use crate::output::{self, OutputMode};
use anyhow::Context;
use chrono::Utc;
use clap::Args;
use std::path::{Path, PathBuf};
use tally_core::export;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Count id to export.
    pub id: String,

    /// Output file. Defaults to `<count name>_<date>.csv` in the current
    /// directory; `-` writes to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run_export(args: &ExportArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let store = super::open_store(data_dir)?;
    let count = super::require_count(&store, &args.id)?;
    let csv = export::count_to_csv(count);

    if args.output.as_deref() == Some(Path::new("-")) {
        print!("{csv}");
        return Ok(());
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(export::csv_file_name(&count.name, Utc::now())));
    std::fs::write(&path, &csv).with_context(|| format!("failed to write {}", path.display()))?;
    output::render_success(mode, &format!("Exported to {}", path.display()))
}
