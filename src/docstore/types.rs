//! Shared types for the document store.

use std::path::PathBuf;
use thiserror::Error;

/// One stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// What a single-document update touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// A document matched the filter.
    pub matched: bool,
    /// At least one field value actually changed.
    pub modified: bool,
}

impl UpdateOutcome {
    /// Outcome for a filter that matched nothing.
    pub fn miss() -> Self {
        Self {
            matched: false,
            modified: false,
        }
    }
}

/// Failures while loading or persisting collections.
#[derive(Debug, Error)]
pub enum DocStoreError {
    /// The store directory or a collection file could not be read or
    /// written.
    #[error("document store I/O failure at {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A collection file exists but does not hold a JSON array of objects.
    #[error("collection file {} is malformed: {source}", path.display())]
    Malformed {
        /// Path of the bad collection file.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// A collection could not be encoded for persistence.
    #[error("failed to encode collection '{collection}': {source}")]
    Encode {
        /// Collection being persisted.
        collection: String,
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },
}
