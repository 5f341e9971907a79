//! Flat-file persistence for dynamic-array records.

use std::fs;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use crate::pick::record::{ATTRIBUTE_MARK, Record};
use crate::pick::types::{AttributeMap, StoreError, UpdateError};

/// Line-oriented record store over a single flat file.
///
/// Each line is `key^attributes...`; the store scans lines in order and the
/// first line whose key matches wins, so duplicate keys shadow each other.
/// Updates rewrite the whole file after copying it to a `.bak` sibling.
///
/// The store holds no file handles or locks between calls. Concurrent
/// writers can interleave read-modify-write cycles and the last rewrite
/// wins, which matches the single-user tooling this emulates.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a store over the given backing file. The file does not have
    /// to exist yet; reads against a missing file yield not-found records.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the pre-update safety copy (`<file>.bak`).
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Read the record stored under `key`.
    ///
    /// Lines are trimmed before matching, a line must start with
    /// `key^` to match, and everything after that first Attribute mark
    /// becomes the record's raw data. No match (or no file) yields a
    /// record without raw data rather than an error.
    pub fn read(&self, key: &str) -> Result<Record, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.path.display(),
                    key,
                    "Record file missing; treating read as not found"
                );
                return Ok(Record::new(key, None));
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let prefix = format!("{key}{ATTRIBUTE_MARK}");
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || !trimmed.starts_with(&prefix) {
                continue;
            }
            let raw = trimmed
                .split_once(ATTRIBUTE_MARK)
                .map(|(_, rest)| rest.to_string());
            return Ok(Record::new(key, raw));
        }
        Ok(Record::new(key, None))
    }

    /// Apply `changes` to `record` and persist the result.
    ///
    /// The sequence is: render the new raw data, copy the backing file to
    /// its `.bak` sibling, rewrite the file with the first matching line
    /// replaced, then sync the in-memory record. A record that was never
    /// found cannot be updated; its line does not exist to be replaced.
    pub fn update(&self, record: &mut Record, changes: &AttributeMap) -> Result<(), UpdateError> {
        if record.raw_data().is_none() {
            return Err(UpdateError::RecordNotFound(record.key().to_string()));
        }
        let new_raw = record.updated_raw(changes)?;
        self.backup()?;
        self.rewrite_line(record.key(), &new_raw)?;
        record.set_raw_data(new_raw);
        tracing::debug!(
            key = record.key(),
            positions = changes.len(),
            "Rewrote record file with updated attributes"
        );
        Ok(())
    }

    fn backup(&self) -> Result<(), StoreError> {
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|source| StoreError::Backup {
            path: backup.clone(),
            source,
        })?;
        Ok(())
    }

    /// Rewrite the backing file, replacing the first line that matches
    /// `key` with the freshly rendered one. Other lines are carried over
    /// unchanged; every line is terminated with a newline.
    fn rewrite_line(&self, key: &str, new_raw: &str) -> Result<(), StoreError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let prefix = format!("{key}{ATTRIBUTE_MARK}");
        let mut output = String::with_capacity(contents.len() + new_raw.len());
        let mut replaced = false;
        for line in contents.lines() {
            let trimmed = line.trim();
            if !replaced && !trimmed.is_empty() && trimmed.starts_with(&prefix) {
                output.push_str(key);
                output.push(ATTRIBUTE_MARK);
                output.push_str(new_raw);
                replaced = true;
            } else {
                output.push_str(line);
            }
            output.push('\n');
        }

        fs::write(&self.path, output).map_err(|source| StoreError::Rewrite {
            path: self.path.clone(),
            source,
        })
    }
}
