//! `tally storage` — report the store's disk footprint.

use crate::output::{self, OutputMode};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct StorageArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StorageReport {
    total_bytes: u64,
    counts: Vec<CountSize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CountSize {
    id: String,
    name: String,
    bytes: u64,
}

pub fn run_storage(_args: &StorageArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let store = super::open_store(data_dir)?;

    let mut counts: Vec<CountSize> = store
        .counts()
        .values()
        .map(|count| CountSize {
            id: count.id.clone(),
            name: count.name.clone(),
            bytes: store.count_size(&count.id),
        })
        .collect();
    counts.sort_by(|a, b| b.bytes.cmp(&a.bytes));

    let report = StorageReport {
        total_bytes: store.storage_info()?,
        counts,
    };

    output::render(mode, &report, |r, w| {
        writeln!(w, "Total: {}", output::format_bytes(r.total_bytes))?;
        for count in &r.counts {
            writeln!(
                w,
                "  {:>10}  {}  {}",
                output::format_bytes(count.bytes),
                count.id,
                count.name
            )?;
        }
        Ok(())
    })
}
