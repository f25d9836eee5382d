//! `tally show` — show one count's items and progress.

use crate::output::{self, OutputMode};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tally_core::model::{Count, CountStats, Item};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Count id.
    pub id: String,

    /// Only show items whose PosID or name contains this text.
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only show completed items.
    #[arg(long)]
    pub done_only: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowResult<'a> {
    id: &'a str,
    name: &'a str,
    created_at: String,
    stats: CountStats,
    items: Vec<&'a Item>,
}

fn matching_items<'a>(count: &'a Count, args: &ShowArgs) -> Vec<&'a Item> {
    let filter = args.filter.as_deref().unwrap_or("").to_lowercase();
    let mut items: Vec<&Item> = count
        .items
        .iter()
        .filter(|item| {
            filter.is_empty()
                || item.pos_id.to_lowercase().contains(&filter)
                || item.item_name.to_lowercase().contains(&filter)
        })
        .filter(|item| !args.done_only || item.completed)
        .collect();
    items.sort_by_key(|item| item.completed);
    items
}

pub fn run_show(args: &ShowArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let store = super::open_store(data_dir)?;
    let count = super::require_count(&store, &args.id)?;

    let result = ShowResult {
        id: &count.id,
        name: &count.name,
        created_at: count.created_at.to_rfc3339(),
        stats: count.stats(),
        items: matching_items(count, args),
    };

    output::render(mode, &result, |r, w| {
        writeln!(w, "{}  ({})", r.name, r.id)?;
        writeln!(
            w,
            "{} items, {} done, {} to go",
            r.stats.total, r.stats.completed, r.stats.incomplete
        )?;
        writeln!(w)?;
        for item in &r.items {
            let mark = if item.completed { "x" } else { " " };
            writeln!(
                w,
                "[{mark}] {:<10} {:<30} cases {:>4}  inners {:>4}  singles {:>4}",
                item.pos_id, item.item_name, item.cases, item.inners, item.individuals
            )?;
        }
        Ok(())
    })
}
