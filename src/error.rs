//! # Error Handling
//!
//! Unified error type for the stagemap pipeline. Input errors carry the
//! offending raw value so failures point back at the source row; storage,
//! I/O, CSV and settings errors convert via `#[from]`.

use thiserror::Error;

/// Result type alias using [`StageMapError`].
pub type Result<T> = std::result::Result<T, StageMapError>;

/// All errors that can occur in the stagemap pipeline.
#[derive(Error, Debug)]
pub enum StageMapError {
    /// A date cell could not be parsed as `day.month.year`.
    #[error("malformed date '{raw}': {reason}")]
    MalformedDate { raw: String, reason: String },

    /// A distance cell was non-empty but not numeric.
    #[error("malformed distance '{raw}'")]
    MalformedDistance { raw: String },

    /// Two snapshot rows share the same date, which is the sync key.
    #[error("duplicate date '{date}' in snapshot; dates must be unique per stage")]
    DuplicateDate { date: String },

    /// A snapshot row is missing the coordinates its marker needs.
    #[error("row {row} ('{label}') has no coordinates")]
    MissingCoordinates { row: usize, label: String },

    /// No coordinates at all were available to derive the map center.
    #[error("no coordinates available to center the map")]
    EmptyMapExtent,

    /// Storage-layer failure (schema, transaction, query).
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem failure reading inputs or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot CSV could not be read or deserialized.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] csv::Error),

    /// Settings file could not be parsed.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// An artifact could not be handed to the publisher.
    #[error("publish failed for '{artifact}': {reason}")]
    Publish { artifact: String, reason: String },
}
