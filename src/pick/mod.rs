//! Simulated Pick/Universe dynamic-array records over a flat file.
//!
//! Multivalue databases store a record as a single delimited string with a
//! three-level hierarchy: attributes separated by `^`, values separated by
//! `]`, subvalues separated by `\`. This module reproduces that model on
//! top of an ordinary text file, one record per line, keyed by the leading
//! field.
//!
//! [`Record`] owns the decoding and positional extraction rules;
//! [`RecordStore`] owns file scanning, the pre-update backup, and the
//! whole-file rewrite.

pub mod record;
pub mod store;
pub mod types;

pub use record::{ATTRIBUTE_MARK, Record, SUBVALUE_MARK, VALUE_MARK};
pub use store::RecordStore;
pub use types::{AttributeMap, AttributeValue, StoreError, UpdateError};
