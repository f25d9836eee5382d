//! `tally theme` — read or change the persisted theme.

use crate::output::{self, OutputMode};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ThemeArgs {
    /// New theme name. With no value, prints the current theme.
    pub name: Option<String>,
}

#[derive(Serialize)]
struct ThemeResult {
    theme: String,
}

pub fn run_theme(args: &ThemeArgs, mode: OutputMode, data_dir: &Path) -> anyhow::Result<()> {
    let mut store = super::open_store(data_dir)?;

    if let Some(name) = &args.name {
        store.set_theme(name)?;
        return output::render_success(mode, &format!("Theme set to {name}"));
    }

    let result = ThemeResult {
        theme: store.theme()?,
    };
    output::render(mode, &result, |r, w| writeln!(w, "{}", r.theme))
}
