//! Backup (JSON) and per-count (CSV) export codecs.

use crate::error::{Result, TallyError};
use crate::model::Count;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BACKUP_VERSION: &str = "1.0";

const CSV_HEADER: &str = "PosID,Item Name,Cases,Inners,Individuals,Completed";

/// The whole-document backup format.
///
/// Restore accepts any JSON object with a `counts` mapping; `exportDate` and
/// `version` are informational and optional on the way in. Unknown top-level
/// fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub counts: BTreeMap<String, Count>,
    #[serde(default = "Utc::now")]
    pub export_date: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    BACKUP_VERSION.to_string()
}

/// Snapshot the counts map into a backup document stamped now.
#[must_use]
pub fn make_backup(counts: &BTreeMap<String, Count>) -> Backup {
    Backup {
        counts: counts.clone(),
        export_date: Utc::now(),
        version: default_version(),
    }
}

/// Pretty-printed JSON for a backup file.
pub fn to_json(backup: &Backup) -> Result<String> {
    Ok(serde_json::to_string_pretty(backup)?)
}

/// Parse and validate a backup document without mutating anything.
///
/// Ids are re-stamped from the map keys because older exports omit the id
/// inside each record.
pub fn parse_backup(text: &str) -> Result<Backup> {
    let mut backup: Backup =
        serde_json::from_str(text).map_err(|err| TallyError::InvalidBackup(err.to_string()))?;
    for (id, count) in &mut backup.counts {
        count.id.clone_from(id);
    }
    Ok(backup)
}

/// Default backup filename: `the-count-backup-<millis>.json`.
#[must_use]
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("the-count-backup-{}.json", now.timestamp_millis())
}

/// Render one count as CSV in its original stored item order (the export is
/// never filtered or re-sorted). Item names are quoted with embedded quotes
/// doubled; `completed` renders as literal `Yes`/`No`.
#[must_use]
pub fn count_to_csv(count: &Count) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for item in &count.items {
        let name = item.item_name.replace('"', "\"\"");
        csv.push_str(&format!(
            "{},\"{}\",{},{},{},{}\n",
            item.pos_id,
            name,
            item.cases,
            item.inners,
            item.individuals,
            if item.completed { "Yes" } else { "No" }
        ));
    }
    csv
}

/// CSV filename: count name sanitized to `[A-Za-z0-9]` (everything else
/// becomes `_`) plus the export date.
#[must_use]
pub fn csv_file_name(count_name: &str, date: DateTime<Utc>) -> String {
    let sanitized: String = count_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{sanitized}_{}.csv", date.format("%Y-%m-%d"))
}
