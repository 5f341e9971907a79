#![deny(missing_docs)]

//! Core library for the Pickwick student records service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// JSON document collections with file-backed persistence.
pub mod docstore;
/// Structured logging and tracing setup.
pub mod logging;
/// Request and write counters exposed over HTTP.
pub mod metrics;
/// Delimited flat-file records in the legacy multivalue format.
pub mod pick;
/// Projection of legacy client records into API documents.
pub mod projection;
