//! Shared types for the record store and its callers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::pick::record::VALUE_MARK;

/// Replacement payload for a single attribute slot.
///
/// The caller picks the variant explicitly; a [`Multivalue`] is written back
/// as its parts joined with the Value mark. Only one level of nesting is
/// modeled on the write path, so subvalues have to be spelled out inside the
/// individual strings.
///
/// [`Multivalue`]: AttributeValue::Multivalue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// One value, stored in the slot verbatim.
    Scalar(String),
    /// Ordered values, joined with the Value mark on write.
    Multivalue(Vec<String>),
}

impl AttributeValue {
    /// Render the wire form written into the attribute slot.
    pub fn render(&self) -> String {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::Multivalue(values) => values.join(&VALUE_MARK.to_string()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multivalue(values)
    }
}

/// Update payload: 1-based attribute position to replacement value.
pub type AttributeMap = BTreeMap<usize, AttributeValue>;

/// I/O failures while touching the backing file.
///
/// A missing backing file is not represented here; reads treat it as
/// "record not found" instead of an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing file exists but could not be read.
    #[error("failed to read record file {}: {source}", path.display())]
    Read {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Pre-update safety copy failed.
    #[error("failed to back up record file to {}: {source}", path.display())]
    Backup {
        /// Path of the backup file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Rewrite of the backing file failed.
    #[error("failed to rewrite record file {}: {source}", path.display())]
    Rewrite {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Failures while applying an attribute update to a record.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The record carries no raw data, so there is no line to replace.
    #[error("record '{0}' is not present in the backing file")]
    RecordNotFound(String),
    /// Attribute positions are 1-based; position 0 is not addressable.
    #[error("attribute position {0} is out of range (positions are 1-based)")]
    InvalidPosition(usize),
    /// Backup or rewrite failed; the caller sees the full I/O context.
    #[error(transparent)]
    Store(#[from] StoreError),
}
