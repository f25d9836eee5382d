//! XML counting-list importer.
//!
//! Records are `<CountingListItem>` elements carrying `<PosID>` and
//! `<ItemName>` children. The first occurrence of a pos id wins across every
//! file; later duplicates are dropped silently. Records missing a required
//! field are skipped; a structurally broken document aborts the whole import
//! so `create_count` stays all-or-nothing.

use crate::error::{Result, TallyError};
use crate::model::Item;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::cmp::Ordering;
use std::collections::HashSet;

const RECORD_TAG: &[u8] = b"CountingListItem";
const POS_ID_TAG: &[u8] = b"PosID";
const ITEM_NAME_TAG: &[u8] = b"ItemName";

/// One uploaded file: display name plus full contents.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub name: String,
    pub contents: String,
}

impl ImportFile {
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Parse every file into one deduplicated item list, sorted ascending by
/// pos id (case-insensitive, byte-wise tiebreak).
pub fn parse_files(files: &[ImportFile]) -> Result<Vec<Item>> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for file in files {
        parse_one(file, &mut seen, &mut items)?;
    }
    items.sort_by(|a, b| compare_pos_ids(&a.pos_id, &b.pos_id));
    Ok(items)
}

fn compare_pos_ids(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Which child of the current record is being read.
#[derive(Clone, Copy)]
enum RecordField {
    PosId,
    ItemName,
}

fn parse_one(file: &ImportFile, seen: &mut HashSet<String>, out: &mut Vec<Item>) -> Result<()> {
    let mut reader = Reader::from_str(&file.contents);
    reader.config_mut().trim_text(true);

    let mut in_record = false;
    let mut current_field: Option<RecordField> = None;
    let mut pos_id: Option<String> = None;
    let mut item_name: Option<String> = None;
    let mut depth = 0_usize;
    let mut records = 0_usize;
    let mut skipped = 0_usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| parse_error(file, &err.to_string()))?;
        match event {
            Event::Start(start) => {
                depth += 1;
                match start.name().as_ref() {
                    tag if tag == RECORD_TAG => {
                        in_record = true;
                        pos_id = None;
                        item_name = None;
                    }
                    tag if tag == POS_ID_TAG && in_record => {
                        current_field = Some(RecordField::PosId);
                    }
                    tag if tag == ITEM_NAME_TAG && in_record => {
                        current_field = Some(RecordField::ItemName);
                    }
                    _ => current_field = None,
                }
            }
            Event::Text(text) => {
                if let Some(field) = current_field {
                    let value = text
                        .unescape()
                        .map_err(|err| parse_error(file, &err.to_string()))?
                        .trim()
                        .to_string();
                    match field {
                        RecordField::PosId => pos_id = Some(value),
                        RecordField::ItemName => item_name = Some(value),
                    }
                }
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                if end.name().as_ref() == RECORD_TAG {
                    records += 1;
                    match (pos_id.take(), item_name.take()) {
                        (Some(pos), Some(name)) if !pos.is_empty() => {
                            if seen.insert(pos.clone()) {
                                out.push(Item::new(pos, name));
                            }
                        }
                        _ => skipped += 1,
                    }
                    in_record = false;
                }
                current_field = None;
            }
            // quick-xml reports end-of-input as a clean Eof even when
            // elements are still open, so truncation is ours to detect.
            Event::Eof => {
                if depth > 0 {
                    return Err(parse_error(file, "unexpected end of file inside an open element"));
                }
                break;
            }
            _ => {}
        }
    }

    tracing::debug!(
        file = %file.name,
        records,
        skipped,
        "parsed counting list"
    );
    Ok(())
}

fn parse_error(file: &ImportFile, message: &str) -> TallyError {
    TallyError::ImportParse {
        file: file.name.clone(),
        message: message.to_string(),
    }
}
