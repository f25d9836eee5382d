//! Command handlers, one module per subcommand.

pub mod backup;
pub mod create;
pub mod delete;
pub mod export;
pub mod list;
pub mod restore;
pub mod session;
pub mod show;
pub mod storage;
pub mod theme;

use std::path::Path;
use tally_core::Store;

/// Open and initialize the store every command works against.
pub fn open_store(data_dir: &Path) -> anyhow::Result<Store> {
    let mut store = Store::open(data_dir)?;
    store.init()?;
    Ok(store)
}

/// Look up a count id, with a structured not-found error.
pub fn require_count<'a>(
    store: &'a Store,
    id: &str,
) -> Result<&'a tally_core::model::Count, tally_core::TallyError> {
    store
        .get(id)
        .ok_or_else(|| tally_core::TallyError::CountNotFound(id.to_string()))
}
