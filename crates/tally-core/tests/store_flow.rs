//! End-to-end store flows: create from XML, counting commands, undo/redo,
//! filtering, backup/restore, and persistence across reopen.

use std::cell::RefCell;
use std::rc::Rc;

use tally_core::bus::{EventKind, StoreEvent};
use tally_core::export;
use tally_core::import::ImportFile;
use tally_core::model::CountField;
use tally_core::store::{Store, View};
use tally_core::{Result, TallyError};

const SAMPLE_XML: &str = r#"<?xml version="1.0"?>
<CountingList>
  <CountingListItem>
    <PosID>B2</PosID>
    <ItemName>Bolts</ItemName>
  </CountingListItem>
  <CountingListItem>
    <PosID>a1</PosID>
    <ItemName>Anchors</ItemName>
  </CountingListItem>
  <CountingListItem>
    <PosID>C3</PosID>
    <ItemName>Clamps</ItemName>
  </CountingListItem>
</CountingList>"#;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn open_store(dir: &tempfile::TempDir) -> Store {
    let mut store = Store::open(dir.path()).expect("open store");
    store.init().expect("init store");
    store
}

fn store_with_sample(dir: &tempfile::TempDir) -> (Store, String) {
    let mut store = open_store(dir);
    let id = store
        .create_count("Warehouse A", &[ImportFile::new("list.xml", SAMPLE_XML)])
        .expect("create count");
    (store, id)
}

fn record_events(store: &mut Store, kind: EventKind) -> Rc<RefCell<Vec<StoreEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    store.bus_mut().subscribe(kind, move |event| {
        sink.borrow_mut().push(event.clone());
    });
    seen
}

// ---------------------------------------------------------------------------
// Creating counts
// ---------------------------------------------------------------------------

#[test]
fn create_count_sorts_items_and_enters_count_view() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (store, id) = store_with_sample(&dir);

    assert!(id.starts_with("count_"));
    assert_eq!(store.view().view, View::Count);
    assert_eq!(store.view().current_count_id.as_deref(), Some(id.as_str()));

    let count = store.get(&id).expect("count exists");
    assert_eq!(count.name, "Warehouse A");
    let pos_ids: Vec<&str> = count.items.iter().map(|i| i.pos_id.as_str()).collect();
    // Case-insensitive ordering.
    assert_eq!(pos_ids, vec!["a1", "B2", "C3"]);
    assert!(count.items.iter().all(|i| !i.completed));
    assert!(count.items.iter().all(|i| !i.has_any_count()));
}

#[test]
fn create_count_rejects_blank_name_without_side_effects() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = open_store(&dir);

    let err = store
        .create_count("   ", &[ImportFile::new("list.xml", SAMPLE_XML)])
        .expect_err("blank name must fail");
    assert!(matches!(err, TallyError::EmptyCountName));
    assert_eq!(err.error_code(), "E1001");
    assert!(store.counts().is_empty());
    assert_eq!(store.view().view, View::Dashboard);
    Ok(())
}

#[test]
fn create_count_requires_at_least_one_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = open_store(&dir);

    let err = store.create_count("Warehouse A", &[]).expect_err("no files");
    assert!(matches!(err, TallyError::NoFiles));
    assert!(store.counts().is_empty());
}

#[test]
fn create_count_with_bad_xml_leaves_document_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = open_store(&dir);

    let err = store
        .create_count(
            "Warehouse A",
            &[
                ImportFile::new("good.xml", SAMPLE_XML),
                ImportFile::new("bad.xml", "<CountingList><CountingListItem>"),
            ],
        )
        .expect_err("broken file must abort");
    assert!(matches!(err, TallyError::ImportParse { .. }));
    assert!(store.counts().is_empty());
    assert_eq!(store.view().view, View::Dashboard);
}

// ---------------------------------------------------------------------------
// Counting commands
// ---------------------------------------------------------------------------

#[test]
fn change_value_adjusts_and_clamps_at_zero() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    store.change_value(0, CountField::Cases, 5)?;
    assert_eq!(store.history().past().len(), 1);
    store.change_value(0, CountField::Cases, -2)?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 3);

    // Decrement past zero clamps instead of going negative.
    store.change_value(0, CountField::Cases, -10)?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 0);
    Ok(())
}

#[test]
fn change_value_emits_targeted_delta() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);
    let seen = record_events(&mut store, EventKind::ItemValueChanged);

    store.change_value(1, CountField::Inners, 4)?;

    assert_eq!(
        *seen.borrow(),
        vec![StoreEvent::ItemValueChanged {
            item_index: 1,
            field: CountField::Inners,
            value: 4,
        }]
    );
    Ok(())
}

#[test]
fn change_value_on_completed_item_is_a_noop() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    store.change_value(0, CountField::Individuals, 7)?;
    store.toggle_completed(0)?;
    let before_history = store.history().past().len();

    store.change_value(0, CountField::Individuals, 5)?;

    assert_eq!(store.get(&id).expect("count").items[0].individuals, 7);
    assert_eq!(store.history().past().len(), before_history);
    Ok(())
}

#[test]
fn out_of_range_item_index_is_ignored() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);

    store.change_value(99, CountField::Cases, 1)?;
    store.toggle_completed(99)?;
    assert!(!store.history().can_undo());
    Ok(())
}

#[test]
fn completing_every_item_celebrates() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);
    let seen = record_events(&mut store, EventKind::Celebration);

    store.toggle_completed(0)?;
    store.toggle_completed(1)?;
    assert!(seen.borrow().is_empty());

    store.toggle_completed(2)?;
    assert_eq!(*seen.borrow(), vec![StoreEvent::Celebration]);
    Ok(())
}

// ---------------------------------------------------------------------------
// Undo / redo
// ---------------------------------------------------------------------------

#[test]
fn undo_then_redo_round_trips_a_mutation() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    store.change_value(0, CountField::Cases, 3)?;
    store.undo()?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 0);

    store.redo()?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 3);
    Ok(())
}

#[test]
fn undo_redo_announce_themselves() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);
    let seen = record_events(&mut store, EventKind::Notification);

    store.change_value(0, CountField::Cases, 1)?;
    store.undo()?;
    store.redo()?;
    store.undo()?;
    store.redo()?;

    let texts: Vec<String> = seen
        .borrow()
        .iter()
        .map(|event| match event {
            StoreEvent::Notification { text } => text.clone(),
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(texts, vec!["Undo", "Redo", "Undo", "Redo"]);
    Ok(())
}

#[test]
fn undo_with_empty_history_does_nothing() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);
    let seen = record_events(&mut store, EventKind::Notification);

    store.undo()?;
    store.redo()?;

    assert!(seen.borrow().is_empty());
    assert_eq!(store.get(&id).expect("count").items[0].cases, 0);
    Ok(())
}

#[test]
fn new_mutation_after_undo_discards_the_redo_branch() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    store.change_value(0, CountField::Cases, 1)?;
    store.change_value(0, CountField::Cases, 1)?;
    store.undo()?;
    assert!(store.history().can_redo());

    store.change_value(0, CountField::Inners, 9)?;
    assert!(!store.history().can_redo());

    // The replaced branch stays gone.
    store.redo()?;
    let item = &store.get(&id).expect("count").items[0];
    assert_eq!((item.cases, item.inners), (1, 9));
    Ok(())
}

#[test]
fn restore_from_history_rewinds_and_keeps_newer_states_redoable() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    for _ in 0..4 {
        store.change_value(0, CountField::Cases, 1)?;
    }
    // Past holds snapshots taken before each mutation: cases 0, 1, 2, 3.
    store.restore_from_history(1)?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 1);

    // Redo walks forward through the states that were rewound.
    store.redo()?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 2);
    store.redo()?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 3);
    Ok(())
}

#[test]
fn restore_from_history_out_of_range_is_ignored() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    store.change_value(0, CountField::Cases, 2)?;
    store.restore_from_history(42)?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 2);
    Ok(())
}

#[test]
fn switching_counts_clears_history() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    store.change_value(0, CountField::Cases, 1)?;
    assert!(store.history().can_undo());

    store.show_count_view(&id);
    assert!(!store.history().can_undo());
    assert!(!store.history().can_redo());
    Ok(())
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[test]
fn filter_matches_pos_id_and_name_case_insensitively() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);

    store.set_filter("BOLT");
    let items: Vec<&str> = store
        .filtered_items()
        .iter()
        .map(|(_, item)| item.item_name.as_str())
        .collect();
    assert_eq!(items, vec!["Bolts"]);

    store.set_filter("c3");
    let items: Vec<&str> = store
        .filtered_items()
        .iter()
        .map(|(_, item)| item.item_name.as_str())
        .collect();
    assert_eq!(items, vec!["Clamps"]);
    Ok(())
}

#[test]
fn filtered_items_keep_incomplete_first_and_preserve_order() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);

    store.toggle_completed(0)?;

    let view: Vec<(usize, bool)> = store
        .filtered_items()
        .iter()
        .map(|(index, item)| (*index, item.completed))
        .collect();
    // Incomplete items lead in their original relative order; the completed
    // item sinks to the end but keeps its original index.
    assert_eq!(view, vec![(1, false), (2, false), (0, true)]);
    Ok(())
}

#[test]
fn show_only_done_restricts_to_completed_items() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);

    store.toggle_completed(1)?;
    store.set_show_only_done(true);

    let items: Vec<usize> = store
        .filtered_items()
        .iter()
        .map(|(index, _)| *index)
        .collect();
    assert_eq!(items, vec![1]);
    Ok(())
}

#[test]
fn changing_filter_resets_the_accordion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);

    store.set_active_accordion(Some(2));
    assert_eq!(store.view().active_accordion, Some(2));

    store.set_filter("a");
    assert_eq!(store.view().active_accordion, None);
}

// ---------------------------------------------------------------------------
// Backup / restore / CSV
// ---------------------------------------------------------------------------

#[test]
fn backup_round_trips_through_json() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);
    store.change_value(0, CountField::Cases, 12)?;

    let json = export::to_json(&store.export_all())?;
    let backup = export::parse_backup(&json)?;

    let dir2 = tempfile::tempdir().expect("tempdir");
    let mut other = open_store(&dir2);
    let applied = other.apply_backup(backup)?;

    assert_eq!(applied, 1);
    let restored = other.get(&id).expect("restored count");
    assert_eq!(restored.name, "Warehouse A");
    assert_eq!(restored.items[0].cases, 12);
    Ok(())
}

#[test]
fn apply_backup_overwrites_on_id_collision() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);
    store.change_value(0, CountField::Cases, 5)?;
    let backup = store.export_all();

    store.change_value(0, CountField::Cases, 5)?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 10);

    store.apply_backup(backup)?;
    assert_eq!(store.get(&id).expect("count").items[0].cases, 5);
    Ok(())
}

#[test]
fn csv_export_uses_the_active_count_by_default() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, _id) = store_with_sample(&dir);
    store.change_value(0, CountField::Cases, 2)?;
    store.toggle_completed(0)?;

    let csv = store.export_count_csv(None).expect("active count");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "PosID,Item Name,Cases,Inners,Individuals,Completed"
    );
    assert_eq!(lines[1], "a1,\"Anchors\",2,0,0,Yes");
    assert_eq!(lines.len(), 4);
    Ok(())
}

#[test]
fn csv_export_for_missing_count_returns_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (store, _id) = store_with_sample(&dir);
    assert!(store.export_count_csv(Some("count_0_missing")).is_none());
}

// ---------------------------------------------------------------------------
// Persistence and settings
// ---------------------------------------------------------------------------

#[test]
fn counts_survive_a_reopen() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = {
        let (mut store, id) = store_with_sample(&dir);
        store.change_value(2, CountField::Individuals, 8)?;
        store.toggle_completed(2)?;
        id
    };

    let store = open_store(&dir);
    let count = store.get(&id).expect("count reloaded");
    assert_eq!(count.items[2].individuals, 8);
    assert!(count.items[2].completed);
    Ok(())
}

#[test]
fn delete_count_removes_it_from_disk_too() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);

    store.delete_count(&id)?;
    assert!(store.counts().is_empty());

    let reopened = open_store(&dir);
    assert!(reopened.counts().is_empty());
    Ok(())
}

#[test]
fn theme_defaults_to_light_and_persists() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = open_store(&dir);
    assert_eq!(store.theme()?, "light");

    let seen = record_events(&mut store, EventKind::ThemeChanged);
    store.set_theme("dark")?;
    assert_eq!(
        *seen.borrow(),
        vec![StoreEvent::ThemeChanged {
            theme: "dark".to_string(),
        }]
    );

    let reopened = open_store(&dir);
    assert_eq!(reopened.theme()?, "dark");
    Ok(())
}

#[test]
fn legacy_json_is_migrated_once_on_init() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let legacy = dir.path().join("the-count.json");
    std::fs::write(
        &legacy,
        r#"{
            "counts": {
                "count_1_aaaaaaaaa": {
                    "name": "From the old app",
                    "createdAt": "2024-01-05T10:00:00Z",
                    "items": [
                        {"posId": "x1", "itemName": "Widgets", "cases": 3}
                    ]
                }
            },
            "theme": "dark"
        }"#,
    )
    .expect("write legacy file");

    let store = open_store(&dir);
    let count = store.get("count_1_aaaaaaaaa").expect("migrated count");
    assert_eq!(count.name, "From the old app");
    assert_eq!(count.items[0].cases, 3);
    assert_eq!(store.theme()?, "dark");
    assert!(!legacy.exists(), "legacy file removed after migration");
    Ok(())
}

#[test]
fn navigation_events_fire_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mut store, id) = store_with_sample(&dir);
    let seen = record_events(&mut store, EventKind::ViewChanged);

    store.show_dashboard();
    store.show_create_view();
    store.show_count_view(&id);

    let views: Vec<View> = seen
        .borrow()
        .iter()
        .map(|event| match event {
            StoreEvent::ViewChanged { view } => *view,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(views, vec![View::Dashboard, View::Create, View::Count]);
    assert_eq!(store.view().current_count_id, Some(id));
}
