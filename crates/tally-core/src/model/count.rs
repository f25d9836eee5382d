use super::item::Item;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named collection of inventory items being tallied.
///
/// Owned exclusively by the store's counts map; the `id` is assigned once at
/// creation and never changes. Backups written by older builds omit the `id`
/// inside the record (it only appears as the map key), so it deserializes
/// with a default and callers re-stamp it from the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Count {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<Item>,
}

/// Derived per-count counters shown in the stats panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    /// Completed items whose three denominations are all still zero,
    /// usually a sign the item was ticked off without being counted.
    pub empty_completed: usize,
    /// Items holding at least one nonzero tally.
    pub with_counts: usize,
}

impl Count {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: Utc::now(),
            items,
        }
    }

    /// True iff the count is non-empty and every item is completed.
    /// The celebration rule keys off this.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.completed)
    }

    #[must_use]
    pub fn stats(&self) -> CountStats {
        let mut stats = CountStats {
            total: self.items.len(),
            completed: 0,
            incomplete: 0,
            empty_completed: 0,
            with_counts: 0,
        };
        for item in &self.items {
            if item.completed {
                stats.completed += 1;
                if !item.has_any_count() {
                    stats.empty_completed += 1;
                }
            } else {
                stats.incomplete += 1;
            }
            if item.has_any_count() {
                stats.with_counts += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::{Count, Item};
    use crate::model::CountField;

    fn three_items() -> Vec<Item> {
        vec![
            Item::new("P1", "Widget"),
            Item::new("P2", "Gadget"),
            Item::new("P3", "Sprocket"),
        ]
    }

    #[test]
    fn empty_count_is_never_all_completed() {
        let count = Count::new("count_1", "Empty", Vec::new());
        assert!(!count.all_completed());
    }

    #[test]
    fn all_completed_requires_every_item() {
        let mut count = Count::new("count_1", "Stock A", three_items());
        assert!(!count.all_completed());

        for item in &mut count.items {
            item.completed = true;
        }
        assert!(count.all_completed());

        count.items[1].completed = false;
        assert!(!count.all_completed());
    }

    #[test]
    fn stats_tracks_all_four_counters() {
        let mut count = Count::new("count_1", "Stock A", three_items());
        count.items[0].apply_delta(CountField::Cases, 2);
        count.items[0].completed = true;
        count.items[1].completed = true; // completed with no tallies

        let stats = count.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.incomplete, 1);
        assert_eq!(stats.empty_completed, 1);
        assert_eq!(stats.with_counts, 1);
    }

    #[test]
    fn count_deserializes_without_embedded_id() {
        let count: Count = serde_json::from_str(
            r#"{"name":"Stock A","createdAt":"2024-03-01T09:30:00Z","items":[]}"#,
        )
        .unwrap();
        assert_eq!(count.id, "");
        assert_eq!(count.name, "Stock A");
    }
}
