//! JSON-file-backed document collections.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::docstore::types::{DocStoreError, Document, UpdateOutcome};

/// Name of the generated identifier field added to inserted documents.
pub const ID_FIELD: &str = "_id";

/// In-memory document collections with write-through JSON persistence.
///
/// Each collection lives in `<dir>/<collection>.json` as a pretty-printed
/// array of objects. The whole store is loaded once at startup; every
/// mutation rewrites the owning collection's file under the write lock, so
/// collection files never interleave partial writes. A failed rewrite rolls
/// the in-memory mutation back, so the cache never runs ahead of the file.
#[derive(Debug)]
pub struct DocumentStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl DocumentStore {
    /// Open the store rooted at `dir`, creating the directory when missing
    /// and loading every collection file found inside it. A malformed
    /// collection file is an error rather than silently dropped data.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DocStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| DocStoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut collections = HashMap::new();
        let entries = fs::read_dir(&dir).map_err(|source| DocStoreError::Io {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| DocStoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let contents = fs::read_to_string(&path).map_err(|source| DocStoreError::Io {
                path: path.clone(),
                source,
            })?;
            let documents: Vec<Document> = serde_json::from_str(&contents).map_err(|source| {
                DocStoreError::Malformed {
                    path: path.clone(),
                    source,
                }
            })?;
            collections.insert(name.to_string(), documents);
        }

        tracing::info!(
            dir = %dir.display(),
            collections = collections.len(),
            "Loaded document store"
        );
        Ok(Self {
            dir,
            collections: RwLock::new(collections),
        })
    }

    /// Insert one document, assigning a UUID `_id` when the document does
    /// not already carry one. Returns the identifier.
    pub async fn insert(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<String, DocStoreError> {
        let mut collections = self.collections.write().await;
        let id = ensure_id(&mut document);
        let documents = collections.entry(collection.to_string()).or_default();
        documents.push(document);
        if let Err(err) = self.persist(collection, documents) {
            documents.pop();
            return Err(err);
        }
        Ok(id)
    }

    /// Insert a batch of documents with a single persistence pass.
    pub async fn insert_many(
        &self,
        collection: &str,
        batch: Vec<Document>,
    ) -> Result<Vec<String>, DocStoreError> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        let kept = documents.len();
        let mut ids = Vec::with_capacity(batch.len());
        for mut document in batch {
            ids.push(ensure_id(&mut document));
            documents.push(document);
        }
        if let Err(err) = self.persist(collection, documents) {
            documents.truncate(kept);
            return Err(err);
        }
        Ok(ids)
    }

    /// First document whose `field` equals `value`, if any.
    pub async fn find_first(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Option<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)?
            .iter()
            .find(|document| document.get(field) == Some(value))
            .cloned()
    }

    /// Every document whose `field` equals `value`, in insertion order.
    pub async fn find_matching(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Vec<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| document.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every document in the collection; empty for unknown collections.
    pub async fn list(&self, collection: &str) -> Vec<Document> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    /// Merge `changes` into the first document whose `field` equals
    /// `value`. Fields present in `changes` overwrite or extend the
    /// document; other fields are untouched. Persists only when a field
    /// value actually changed.
    pub async fn update_first(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        changes: &Document,
    ) -> Result<UpdateOutcome, DocStoreError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(UpdateOutcome::miss());
        };
        let Some(index) = documents
            .iter()
            .position(|document| document.get(field) == Some(value))
        else {
            return Ok(UpdateOutcome::miss());
        };

        let document = &mut documents[index];
        let previous = document.clone();
        let mut modified = false;
        for (name, new_value) in changes {
            if document.get(name) != Some(new_value) {
                document.insert(name.clone(), new_value.clone());
                modified = true;
            }
        }
        if modified {
            if let Err(err) = self.persist(collection, documents) {
                documents[index] = previous;
                return Err(err);
            }
        }
        Ok(UpdateOutcome {
            matched: true,
            modified,
        })
    }

    /// Remove the first document whose `field` equals `value`. Returns
    /// whether a document was removed.
    pub async fn delete_first(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool, DocStoreError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(index) = documents
            .iter()
            .position(|document| document.get(field) == Some(value))
        else {
            return Ok(false);
        };
        let removed = documents.remove(index);
        if let Err(err) = self.persist(collection, documents) {
            documents.insert(index, removed);
            return Err(err);
        }
        Ok(true)
    }

    fn persist(&self, collection: &str, documents: &[Document]) -> Result<(), DocStoreError> {
        let path = self.dir.join(format!("{collection}.json"));
        let contents =
            serde_json::to_string_pretty(documents).map_err(|source| DocStoreError::Encode {
                collection: collection.to_string(),
                source,
            })?;
        fs::write(&path, contents).map_err(|source| DocStoreError::Io { path, source })?;
        tracing::debug!(collection, documents = documents.len(), "Persisted collection");
        Ok(())
    }
}

fn ensure_id(document: &mut Document) -> String {
    if let Some(Value::String(existing)) = document.get(ID_FIELD) {
        return existing.clone();
    }
    let id = Uuid::new_v4().to_string();
    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
    id
}
