//! `tally delete` — remove a count permanently.

use crate::output::{self, OutputMode};
use clap::Args;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Count id to delete.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run_delete(args: &DeleteArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let mut store = super::open_store(data_dir)?;
    let name = super::require_count(&store, &args.id)?.name.clone();

    if !args.yes {
        anyhow::bail!("refusing to delete \"{name}\" without --yes");
    }

    store.delete_count(&args.id)?;
    tracing::info!(count_id = %args.id, "deleted count");
    output::render_success(mode, &format!("Deleted \"{name}\""))
}
