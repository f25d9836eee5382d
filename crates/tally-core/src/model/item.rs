use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three denominations an item is tallied in.
///
/// Replaces stringly-typed field access: every mutation names one of these
/// variants, so a typo is a compile error rather than a silent `undefined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountField {
    Cases,
    Inners,
    Individuals,
}

impl CountField {
    pub const ALL: [Self; 3] = [Self::Cases, Self::Inners, Self::Individuals];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Cases => "cases",
            Self::Inners => "inners",
            Self::Individuals => "individuals",
        }
    }
}

impl fmt::Display for CountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a field name from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldError {
    pub got: String,
}

impl fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid field: '{}' (expected cases, inners, or individuals)",
            self.got
        )
    }
}

impl std::error::Error for ParseFieldError {}

impl FromStr for CountField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cases" => Ok(Self::Cases),
            "inners" => Ok(Self::Inners),
            "individuals" => Ok(Self::Individuals),
            _ => Err(ParseFieldError { got: s.to_string() }),
        }
    }
}

/// A single inventory line, keyed by `pos_id` within its count.
///
/// Serde names match the persisted JSON document (`posId`, `itemName`) so
/// existing backups load unchanged. `completed` defaults to false because
/// documents written before the flag existed lack it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub pos_id: String,
    pub item_name: String,
    #[serde(default)]
    pub cases: u32,
    #[serde(default)]
    pub inners: u32,
    #[serde(default)]
    pub individuals: u32,
    #[serde(default)]
    pub completed: bool,
}

impl Item {
    /// A fresh item with zeroed tallies, as produced by the import parser.
    #[must_use]
    pub fn new(pos_id: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            pos_id: pos_id.into(),
            item_name: item_name.into(),
            cases: 0,
            inners: 0,
            individuals: 0,
            completed: false,
        }
    }

    #[must_use]
    pub const fn get(&self, field: CountField) -> u32 {
        match field {
            CountField::Cases => self.cases,
            CountField::Inners => self.inners,
            CountField::Individuals => self.individuals,
        }
    }

    const fn slot(&mut self, field: CountField) -> &mut u32 {
        match field {
            CountField::Cases => &mut self.cases,
            CountField::Inners => &mut self.inners,
            CountField::Individuals => &mut self.individuals,
        }
    }

    /// Apply `delta` to one denomination, clamping at zero, and return the
    /// new value. Decrementing below zero clamps rather than erroring.
    pub fn apply_delta(&mut self, field: CountField, delta: i64) -> u32 {
        let next = i64::from(self.get(field)).saturating_add(delta);
        let next = next.clamp(0, i64::from(u32::MAX));
        // Infallible after the clamp above.
        let next = u32::try_from(next).unwrap_or(u32::MAX);
        *self.slot(field) = next;
        next
    }

    /// True when any denomination holds a nonzero tally.
    #[must_use]
    pub const fn has_any_count(&self) -> bool {
        self.cases > 0 || self.inners > 0 || self.individuals > 0
    }
}

#[cfg(test)]
mod tests {
    use super::{CountField, Item};
    use std::str::FromStr;

    #[test]
    fn field_display_parse_roundtrips() {
        for field in CountField::ALL {
            let rendered = field.to_string();
            let reparsed = CountField::from_str(&rendered).unwrap();
            assert_eq!(field, reparsed);
        }
    }

    #[test]
    fn field_parse_rejects_unknown_values() {
        assert!(CountField::from_str("pallets").is_err());
        assert!(CountField::from_str("").is_err());
    }

    #[test]
    fn apply_delta_clamps_at_zero() {
        let mut item = Item::new("P1", "Widget");
        item.cases = 2;
        let value = item.apply_delta(CountField::Cases, -5);
        assert_eq!(value, 0);
        assert_eq!(item.cases, 0);
    }

    #[test]
    fn apply_delta_adds_and_reads_back() {
        let mut item = Item::new("P1", "Widget");
        assert_eq!(item.apply_delta(CountField::Inners, 3), 3);
        assert_eq!(item.apply_delta(CountField::Inners, 4), 7);
        assert_eq!(item.get(CountField::Inners), 7);
        assert_eq!(item.get(CountField::Cases), 0);
    }

    #[test]
    fn serde_uses_original_document_names() {
        let item = Item::new("P1", "Widget");
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("posId").is_some());
        assert!(json.get("itemName").is_some());
        assert_eq!(json["completed"], false);
    }

    #[test]
    fn completed_defaults_to_false_for_legacy_documents() {
        let item: Item = serde_json::from_str(
            r#"{"posId":"P1","itemName":"Widget","cases":1,"inners":0,"individuals":2}"#,
        )
        .unwrap();
        assert!(!item.completed);
        assert!(item.has_any_count());
    }
}
