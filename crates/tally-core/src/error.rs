//! Error taxonomy for the tally core.
//!
//! Four families of failure, none of them fatal to the process:
//! - validation: empty count name, no files, invalid backup shape; reported
//!   synchronously with no state change.
//! - parse: a structurally broken import file aborts the whole
//!   `create_count` with no partial state.
//! - persistence: a failed save leaves the in-memory document authoritative
//!   so the user can retry or export. `QuotaExceeded` is the distinguished
//!   capacity subtype that triggers an automatic backup.
//! - no-op conditions (undo with empty history, mutating a completed item,
//!   deleting an absent count) are not errors at all and never reach this type.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TallyError>;

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("count name must not be empty")]
    EmptyCountName,

    #[error("at least one import file is required")]
    NoFiles,

    /// The named import file is not well-formed; the whole import aborts.
    #[error("failed to parse import file '{file}': {message}")]
    ImportParse { file: String, message: String },

    /// A backup document without a usable `counts` mapping.
    #[error("invalid backup file: {0}")]
    InvalidBackup(String),

    /// Surfaced by CLI lookups; store commands treat absence as a no-op.
    #[error("no count with id '{0}'")]
    CountNotFound(String),

    /// The storage backend rejected a write for lack of capacity.
    #[error("storage limit reached")]
    QuotaExceeded,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TallyError {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyCountName => "E1001",
            Self::NoFiles => "E1002",
            Self::ImportParse { .. } => "E2001",
            Self::InvalidBackup(_) => "E2002",
            Self::CountNotFound(_) => "E3001",
            Self::QuotaExceeded => "E5001",
            Self::Storage(_) => "E5002",
            Self::Io(_) => "E5003",
            Self::Json(_) => "E9001",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::EmptyCountName => Some("Provide a name with --name."),
            Self::NoFiles => Some("Pass at least one XML counting list file."),
            Self::ImportParse { .. } => {
                Some("Check that the file is a well-formed XML counting list.")
            }
            Self::InvalidBackup(_) => {
                Some("The backup must be a JSON object with a 'counts' mapping.")
            }
            Self::CountNotFound(_) => Some("Run `tally list` to see available count ids."),
            Self::QuotaExceeded => {
                Some("A backup was exported automatically; delete old counts to free space.")
            }
            Self::Storage(_) | Self::Io(_) => {
                Some("Check disk space and permissions, then retry; your data is still in memory.")
            }
            Self::Json(_) => None,
        }
    }
}
