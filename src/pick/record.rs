//! Dynamic-array record decoding and positional extraction.

use crate::pick::types::{AttributeMap, UpdateError};

/// Delimiter between attributes within a record line.
pub const ATTRIBUTE_MARK: char = '^';
/// Delimiter between values within an attribute.
pub const VALUE_MARK: char = ']';
/// Delimiter between subvalues within a value.
pub const SUBVALUE_MARK: char = '\\';

/// One record addressed by key, decoded from the flat file.
///
/// `raw_data` is everything after the key and its trailing Attribute mark on
/// the matching line. A record read for a key with no matching line carries
/// no raw data; extraction on it yields empty strings and updates are
/// rejected.
///
/// The three-level hierarchy (attributes, values, subvalues) is never
/// validated up front. Delimiters are interpreted lazily at extraction time,
/// so any string is a structurally valid record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key: String,
    raw_data: Option<String>,
    attributes: Vec<String>,
}

impl Record {
    /// Build a record from the raw line remainder, splitting it into
    /// attributes eagerly. `None` means no line matched the key.
    pub fn new(key: impl Into<String>, raw_data: Option<String>) -> Self {
        let attributes = raw_data
            .as_deref()
            .map(split_attributes)
            .unwrap_or_default();
        Self {
            key: key.into(),
            raw_data,
            attributes,
        }
    }

    /// Key the record was read with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw attribute data, without the leading key.
    pub fn raw_data(&self) -> Option<&str> {
        self.raw_data.as_deref()
    }

    /// True when the read matched a line carrying attribute data.
    ///
    /// A line holding only the key (empty raw data) counts as not found,
    /// which is how the rest of the service treats it as well.
    pub fn is_found(&self) -> bool {
        self.raw_data.as_deref().is_some_and(|raw| !raw.is_empty())
    }

    /// Decoded attributes, in file order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Attribute at a 1-based position, or `None` when the position is
    /// past the end (or 0).
    ///
    /// An empty attribute slot is a real value here: `Some("")`. Callers
    /// that do not care about the distinction use [`Record::extract`].
    pub fn attribute(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|index| self.attributes.get(index))
            .map(String::as_str)
    }

    /// Value at a 1-based position within an attribute.
    ///
    /// An empty attribute holds no values at all, so every value position
    /// inside it resolves to `None`.
    pub fn value(&self, attribute: usize, value: usize) -> Option<&str> {
        let slot = self.attribute(attribute)?;
        if slot.is_empty() {
            return None;
        }
        nth_part(slot, VALUE_MARK, value)
    }

    /// Subvalue at a 1-based position within a value.
    pub fn subvalue(&self, attribute: usize, value: usize, subvalue: usize) -> Option<&str> {
        let slot = self.value(attribute, value)?;
        nth_part(slot, SUBVALUE_MARK, subvalue)
    }

    /// Attribute extraction with out-of-range positions collapsed to `""`.
    ///
    /// This is the lenient accessor the transform layer is built on; it
    /// never fails, mirroring how multivalue databases treat absent data
    /// as empty.
    pub fn extract(&self, position: usize) -> &str {
        self.attribute(position).unwrap_or("")
    }

    /// Value extraction with absent positions collapsed to `""`.
    pub fn extract_value(&self, attribute: usize, value: usize) -> &str {
        self.value(attribute, value).unwrap_or("")
    }

    /// Subvalue extraction with absent positions collapsed to `""`.
    pub fn extract_subvalue(&self, attribute: usize, value: usize, subvalue: usize) -> &str {
        self.subvalue(attribute, value, subvalue).unwrap_or("")
    }

    /// Render the raw data that results from applying `changes`, without
    /// mutating the record. The attribute list is extended with empty slots
    /// when a change addresses a position past the current end.
    pub(crate) fn updated_raw(&self, changes: &AttributeMap) -> Result<String, UpdateError> {
        if changes.contains_key(&0) {
            return Err(UpdateError::InvalidPosition(0));
        }
        let mut attributes = self.attributes.clone();
        if let Some(&highest) = changes.keys().next_back() {
            if highest > attributes.len() {
                attributes.resize(highest, String::new());
            }
        }
        for (&position, value) in changes {
            attributes[position - 1] = value.render();
        }
        Ok(attributes.join(&ATTRIBUTE_MARK.to_string()))
    }

    /// Replace the raw data and re-split the attribute cache so in-memory
    /// state matches what was written to disk.
    pub(crate) fn set_raw_data(&mut self, raw: String) {
        self.attributes = split_attributes(&raw);
        self.raw_data = Some(raw);
    }
}

fn split_attributes(raw: &str) -> Vec<String> {
    raw.split(ATTRIBUTE_MARK).map(str::to_owned).collect()
}

fn nth_part(text: &str, mark: char, position: usize) -> Option<&str> {
    position
        .checked_sub(1)
        .and_then(|index| text.split(mark).nth(index))
}
