//! Data model: items, counts, and the derived stats counters.

mod count;
mod item;

pub use count::{Count, CountStats};
pub use item::{CountField, Item, ParseFieldError};
