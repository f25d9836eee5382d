//! `tally list` — list all counts with progress.

use crate::output::{self, OutputMode};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ListArgs {}

#[derive(Serialize)]
struct CountRow {
    id: String,
    name: String,
    created_at: String,
    items: usize,
    completed: usize,
}

pub fn run_list(_args: &ListArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let store = super::open_store(data_dir)?;

    let mut rows: Vec<CountRow> = store
        .counts()
        .values()
        .map(|count| {
            let stats = count.stats();
            CountRow {
                id: count.id.clone(),
                name: count.name.clone(),
                created_at: count.created_at.to_rfc3339(),
                items: stats.total,
                completed: stats.completed,
            }
        })
        .collect();
    // Newest first, matching the dashboard ordering.
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    output::render(mode, &rows, |rows, w| {
        if rows.is_empty() {
            return writeln!(w, "No counts yet. Create one with: tally create");
        }
        for row in rows {
            writeln!(
                w,
                "{}  {}/{} done  {}  {}",
                row.id, row.completed, row.items, row.created_at, row.name
            )?;
        }
        Ok(())
    })
}
