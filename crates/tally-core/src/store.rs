//! Central application state store.
//!
//! Owns the in-memory counts document and is the only legal mutation entry
//! point: every command records history where applicable, persists through
//! the [`Database`](crate::db::Database), then emits notifications on the
//! [`EventBus`](crate::bus::EventBus) so observers can re-render. The store
//! is explicitly constructed and passed by reference; it is single-threaded
//! and every command runs to completion before the next is issued.

use crate::bus::{EventBus, StoreEvent};
use crate::db::Database;
use crate::error::{Result, TallyError};
use crate::export::{self, Backup};
use crate::history::{History, Snapshot};
use crate::import::{self, ImportFile};
use crate::model::{Count, CountField, Item};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

const DB_FILE: &str = "tally.sqlite3";
const LEGACY_STORE_FILE: &str = "the-count.json";
const THEME_KEY: &str = "theme";
const DEFAULT_THEME: &str = "light";

/// The three top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Dashboard,
    Create,
    Count,
}

impl View {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Create => "create",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the count screen lays items out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountViewStyle {
    Table,
    Grid,
}

/// Ephemeral per-session view state. Never persisted.
#[derive(Debug)]
pub struct ViewState {
    pub view: View,
    pub current_count_id: Option<String>,
    pub filter: String,
    pub show_only_done: bool,
    pub active_accordion: Option<usize>,
    pub count_view_style: CountViewStyle,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view: View::Dashboard,
            current_count_id: None,
            filter: String::new(),
            show_only_done: false,
            active_accordion: None,
            count_view_style: CountViewStyle::Table,
        }
    }
}

pub struct Store {
    db: Database,
    bus: EventBus,
    counts: BTreeMap<String, Count>,
    view: ViewState,
    history: History,
    data_dir: PathBuf,
}

impl Store {
    /// Open the store rooted at `data_dir` (database file plus the target
    /// directory for emergency backups). Call [`init`](Self::init) next.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let db = Database::open(&data_dir.join(DB_FILE))?;
        Ok(Self::with_database(db, data_dir.to_path_buf()))
    }

    /// Build a store over an already-open database. Used by tests.
    #[must_use]
    pub fn with_database(db: Database, data_dir: PathBuf) -> Self {
        Self {
            db,
            bus: EventBus::new(),
            counts: BTreeMap::new(),
            view: ViewState::default(),
            history: History::new(),
            data_dir,
        }
    }

    /// Initialize: run the one-time legacy migration, load the theme and
    /// all counts, then announce readiness.
    pub fn init(&mut self) -> Result<()> {
        let legacy = self.data_dir.join(LEGACY_STORE_FILE);
        if let Err(err) = self.db.migrate_legacy(&legacy) {
            tracing::warn!(%err, "legacy migration failed, continuing with sqlite data");
        }
        let theme = self.theme()?;
        self.bus.emit(&StoreEvent::ThemeChanged { theme });
        self.counts = self.db.load_all()?;
        self.bus.emit(&StoreEvent::Initialized);
        self.bus.emit(&StoreEvent::CountsUpdated);
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------------

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    #[must_use]
    pub fn counts(&self) -> &BTreeMap<String, Count> {
        &self.counts
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Count> {
        self.counts.get(id)
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn current_count(&self) -> Option<&Count> {
        self.view
            .current_count_id
            .as_ref()
            .and_then(|id| self.counts.get(id))
    }

    // ---------------------------------------------------------------------------
    // Theme
    // ---------------------------------------------------------------------------

    pub fn theme(&self) -> Result<String> {
        Ok(self
            .db
            .load_setting(THEME_KEY)?
            .unwrap_or_else(|| DEFAULT_THEME.to_string()))
    }

    pub fn set_theme(&mut self, theme: &str) -> Result<()> {
        self.db.save_setting(THEME_KEY, theme)?;
        self.bus.emit(&StoreEvent::ThemeChanged {
            theme: theme.to_string(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------------

    pub fn show_dashboard(&mut self) {
        self.view.current_count_id = None;
        self.view.view = View::Dashboard;
        self.bus.emit(&StoreEvent::ViewChanged {
            view: View::Dashboard,
        });
        self.bus.emit(&StoreEvent::CountsUpdated);
    }

    pub fn show_create_view(&mut self) {
        self.view.view = View::Create;
        self.bus
            .emit(&StoreEvent::ViewChanged { view: View::Create });
    }

    /// Enter the counting screen for `count_id`. Filter, done-flag,
    /// accordion, and undo history all reset: history is scoped to the
    /// active count.
    pub fn show_count_view(&mut self, count_id: &str) {
        self.view.current_count_id = Some(count_id.to_string());
        self.view.filter.clear();
        self.view.show_only_done = false;
        self.view.active_accordion = None;
        self.history.clear();
        self.view.view = View::Count;
        self.bus
            .emit(&StoreEvent::ViewChanged { view: View::Count });
    }

    pub fn switch_count_view(&mut self, style: CountViewStyle) {
        self.view.count_view_style = style;
        self.bus
            .emit(&StoreEvent::CountViewStyleChanged { view: style });
        self.bus.emit(&StoreEvent::CountsUpdated);
    }

    // ---------------------------------------------------------------------------
    // Counts CRUD
    // ---------------------------------------------------------------------------

    /// Parse the uploaded files into a fresh count and navigate to it.
    /// All-or-nothing: validation or parse failure leaves the document
    /// untouched.
    pub fn create_count(&mut self, name: &str, files: &[ImportFile]) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::EmptyCountName);
        }
        if files.is_empty() {
            return Err(TallyError::NoFiles);
        }

        let items = import::parse_files(files)?;
        let id = generate_id();
        tracing::info!(count_id = %id, name, items = items.len(), "creating count");
        self.counts.insert(id.clone(), Count::new(&id, name, items));
        self.persist()?;
        self.show_count_view(&id);
        Ok(id)
    }

    /// Remove a count from storage and the document. Idempotent.
    pub fn delete_count(&mut self, count_id: &str) -> Result<()> {
        self.db.delete_one(count_id)?;
        self.counts.remove(count_id);
        self.bus.emit(&StoreEvent::CountsUpdated);
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Items
    // ---------------------------------------------------------------------------

    /// Adjust one denomination of one item by `delta`, clamped at zero.
    /// No-op when there is no active count, the index is out of range, or
    /// the item is completed.
    pub fn change_value(&mut self, item_index: usize, field: CountField, delta: i64) -> Result<()> {
        let Some(id) = self.view.current_count_id.clone() else {
            return Ok(());
        };
        let snapshot = {
            let Some(count) = self.counts.get(&id) else {
                return Ok(());
            };
            match count.items.get(item_index) {
                Some(item) if !item.completed => Snapshot::capture(&id, count),
                _ => return Ok(()),
            }
        };
        self.history.record(snapshot);

        let value = {
            let Some(item) = self
                .counts
                .get_mut(&id)
                .and_then(|count| count.items.get_mut(item_index))
            else {
                return Ok(());
            };
            item.apply_delta(field, delta)
        };

        self.persist()?;
        self.bus.emit(&StoreEvent::ItemValueChanged {
            item_index,
            field,
            value,
        });
        self.bus.emit(&StoreEvent::StatsUpdated);
        Ok(())
    }

    /// Flip an item's completed flag, then re-run the celebration check.
    pub fn toggle_completed(&mut self, item_index: usize) -> Result<()> {
        let Some(id) = self.view.current_count_id.clone() else {
            return Ok(());
        };
        let snapshot = {
            let Some(count) = self.counts.get(&id) else {
                return Ok(());
            };
            if count.items.get(item_index).is_none() {
                return Ok(());
            }
            Snapshot::capture(&id, count)
        };
        self.history.record(snapshot);

        if let Some(item) = self
            .counts
            .get_mut(&id)
            .and_then(|count| count.items.get_mut(item_index))
        {
            item.completed = !item.completed;
        }

        self.persist()?;
        self.bus.emit(&StoreEvent::ItemsChanged);
        self.bus.emit(&StoreEvent::StatsUpdated);
        self.check_and_celebrate();
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<()> {
        let Some(current) = self.capture_current() else {
            return Ok(());
        };
        let Some(previous) = self.history.undo(current) else {
            return Ok(());
        };
        self.restore_snapshot(previous, "Undo")
    }

    pub fn redo(&mut self) -> Result<()> {
        let Some(current) = self.capture_current() else {
            return Ok(());
        };
        let Some(next) = self.history.redo(current) else {
            return Ok(());
        };
        self.restore_snapshot(next, "Redo")
    }

    /// Jump to an arbitrary point in the undo log; newer entries become
    /// redoable. No-op when `index` is out of range.
    pub fn restore_from_history(&mut self, index: usize) -> Result<()> {
        let Some(snapshot) = self.history.restore_at(index) else {
            return Ok(());
        };
        self.restore_snapshot(snapshot, "Restored")
    }

    fn capture_current(&self) -> Option<Snapshot> {
        let id = self.view.current_count_id.as_ref()?;
        let count = self.counts.get(id)?;
        Some(Snapshot::capture(id, count))
    }

    fn restore_snapshot(&mut self, snapshot: Snapshot, label: &str) -> Result<()> {
        self.counts.insert(snapshot.count_id.clone(), snapshot.state);
        self.persist()?;
        self.bus.emit(&StoreEvent::ItemsChanged);
        self.bus.emit(&StoreEvent::StatsUpdated);
        self.check_and_celebrate();
        self.bus.emit(&StoreEvent::Notification {
            text: label.to_string(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Filter & derived views
    // ---------------------------------------------------------------------------

    pub fn set_filter(&mut self, filter: &str) {
        self.view.filter = filter.to_string();
        self.view.active_accordion = None;
        self.bus.emit(&StoreEvent::ItemsChanged);
    }

    pub fn set_show_only_done(&mut self, value: bool) {
        self.view.show_only_done = value;
        self.view.active_accordion = None;
        self.bus.emit(&StoreEvent::ItemsChanged);
    }

    pub fn set_active_accordion(&mut self, index: Option<usize>) {
        self.view.active_accordion = index;
    }

    /// The active count's items after filtering, paired with their positions
    /// in the unfiltered item list. Incomplete items come first; relative
    /// order within each completion group is preserved.
    #[must_use]
    pub fn filtered_items(&self) -> Vec<(usize, &Item)> {
        let Some(count) = self.current_count() else {
            return Vec::new();
        };
        let filter = self.view.filter.to_lowercase();
        let mut items: Vec<(usize, &Item)> = count
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                filter.is_empty()
                    || item.pos_id.to_lowercase().contains(&filter)
                    || item.item_name.to_lowercase().contains(&filter)
            })
            .filter(|(_, item)| !self.view.show_only_done || item.completed)
            .collect();
        // Stable two-valued sort: false orders before true.
        items.sort_by_key(|(_, item)| item.completed);
        items
    }

    // ---------------------------------------------------------------------------
    // Export / backup
    // ---------------------------------------------------------------------------

    /// Snapshot the whole document as a backup.
    #[must_use]
    pub fn export_all(&self) -> Backup {
        export::make_backup(&self.counts)
    }

    /// CSV for one count (or the active one). `None` when the count is
    /// absent.
    #[must_use]
    pub fn export_count_csv(&self, count_id: Option<&str>) -> Option<String> {
        let id = count_id.or(self.view.current_count_id.as_deref())?;
        self.counts.get(id).map(export::count_to_csv)
    }

    /// How many existing counts `backup` would overwrite if applied.
    /// Pure preview, no mutation.
    #[must_use]
    pub fn backup_collisions(&self, backup: &Backup) -> usize {
        backup
            .counts
            .keys()
            .filter(|id| self.counts.contains_key(*id))
            .count()
    }

    /// Merge a parsed backup into the document, overwriting on id collision.
    /// Returns how many counts were written. Callers confirm first using
    /// [`export::parse_backup`] and [`backup_collisions`](Self::backup_collisions).
    pub fn apply_backup(&mut self, backup: Backup) -> Result<usize> {
        let applied = backup.counts.len();
        for (id, count) in backup.counts {
            self.counts.insert(id, count);
        }
        self.persist()?;
        self.bus.emit(&StoreEvent::CountsUpdated);
        Ok(applied)
    }

    // ---------------------------------------------------------------------------
    // Storage info
    // ---------------------------------------------------------------------------

    pub fn storage_info(&self) -> Result<u64> {
        self.db.storage_footprint()
    }

    /// Estimated in-memory size of one count, serialized × 2.
    #[must_use]
    pub fn count_size(&self, count_id: &str) -> u64 {
        self.counts
            .get(count_id)
            .and_then(|count| crate::db::serialized_size(count).ok())
            .unwrap_or(0)
    }

    // ---------------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------------

    /// Save the whole document. On quota exhaustion, write an emergency
    /// backup and retreat to the dashboard before surfacing the error;
    /// on any other failure the in-memory document stays authoritative and
    /// the error goes to the caller for a retry or manual export.
    fn persist(&mut self) -> Result<()> {
        match self.db.save_all(&self.counts) {
            Ok(()) => Ok(()),
            Err(TallyError::QuotaExceeded) => {
                self.handle_quota_exceeded();
                Err(TallyError::QuotaExceeded)
            }
            Err(err) => {
                tracing::error!(%err, "failed to save counts; in-memory state kept");
                Err(err)
            }
        }
    }

    fn handle_quota_exceeded(&mut self) {
        self.bus.emit(&StoreEvent::Notification {
            text: "Storage limit reached! Your data is being exported as a backup.".to_string(),
        });
        let backup = export::make_backup(&self.counts);
        let path = self.data_dir.join(export::backup_file_name(Utc::now()));
        match export::to_json(&backup).and_then(|json| Ok(std::fs::write(&path, json)?)) {
            Ok(()) => {
                tracing::warn!(path = %path.display(), "storage quota exceeded, wrote emergency backup");
            }
            Err(err) => {
                tracing::error!(%err, "storage quota exceeded and emergency backup failed");
            }
        }
        self.show_dashboard();
    }

    fn check_and_celebrate(&mut self) {
        let complete = self.current_count().is_some_and(Count::all_completed);
        if complete {
            self.bus.emit(&StoreEvent::Celebration);
        }
    }
}

/// Fresh count id: `count_<millis>_<9 base36 chars>`.
fn generate_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    format!("count_{}_{}", Utc::now().timestamp_millis(), suffix)
}
