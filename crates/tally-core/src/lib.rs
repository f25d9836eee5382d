//! Core library for tally, an inventory counting tool.
//!
//! The [`store::Store`] is the application's single source of truth: counts
//! are loaded from SQLite at startup, mutated through store commands, and
//! every successful mutation is written back in full before observers on the
//! [`bus::EventBus`] are notified.

pub mod bus;
pub mod db;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod model;
pub mod store;

pub use error::{Result, TallyError};
pub use store::Store;
