//! `tally create` — create a count from counting list XML files.

use crate::output::{self, OutputMode};
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tally_core::import::ImportFile;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name for the new count.
    #[arg(short, long)]
    pub name: String,

    /// Counting list XML files to import.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct CreateResult {
    id: String,
    name: String,
    items: usize,
}

pub fn run_create(args: &CreateArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        files.push(ImportFile::new(name, contents));
    }

    let mut store = super::open_store(data_dir)?;
    let id = store.create_count(&args.name, &files)?;
    let items = store.get(&id).map_or(0, |count| count.items.len());

    let result = CreateResult {
        id,
        name: args.name.clone(),
        items,
    };
    output::render(mode, &result, |r, w| {
        writeln!(w, "✓ Created count \"{}\" ({} items)", r.name, r.items)?;
        writeln!(w, "  id: {}", r.id)
    })
}
