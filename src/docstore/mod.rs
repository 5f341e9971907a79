//! Document collections for the line-of-business records.
//!
//! A deliberately small stand-in for a document database: named collections
//! of JSON objects, each persisted as one pretty-printed JSON file under the
//! store directory, with first-match lookups on a single field.

pub mod store;
pub mod types;

pub use store::{DocumentStore, ID_FIELD};
pub use types::{DocStoreError, Document, UpdateOutcome};
