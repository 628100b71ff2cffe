//! Document-store access for ingestion
//!
//! The pipeline only needs one operation from the store: export a whole
//! collection as documents. [`JsonLinesStore`] reads `mongoexport`-style JSON
//! Lines files; [`MemoryDocumentStore`] serves tests and embedding callers.

use crate::storage::Document;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Read access to named collections
pub trait DocumentStore: Send + Sync {
    /// Every document of `database.collection`, in store order.
    ///
    /// A collection that does not exist is an error; an existing empty one
    /// returns an empty vector.
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be read
    fn export_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>>;
}

/// Directory of JSON Lines exports: `<root>/<database>/<collection>.jsonl`
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    root: PathBuf,
}

impl JsonLinesStore {
    /// Store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store at the location named by a connection string (`file://` or path)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unsupported connection strings
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(crate::config::store_location(url)?))
    }

    /// Path of a collection file
    #[must_use]
    pub fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.root.join(database).join(format!("{collection}.jsonl"))
    }
}

impl DocumentStore for JsonLinesStore {
    fn export_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        let path = self.collection_path(database, collection);
        let file = File::open(&path).map_err(|e| {
            Error::DocumentStore(format!(
                "Failed to open collection {database}.{collection} at {}: {e}",
                path.display()
            ))
        })?;

        let mut documents = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let document: Document = serde_json::from_str(&line).map_err(|e| {
                Error::DocumentStore(format!(
                    "Invalid document on line {} of {}: {e}",
                    number + 1,
                    path.display()
                ))
            })?;
            documents.push(document);
        }

        tracing::debug!(
            database,
            collection,
            documents = documents.len(),
            "Exported collection"
        );
        Ok(documents)
    }
}

/// In-memory collections keyed by `(database, collection)`
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    collections: HashMap<(String, String), Vec<Document>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a collection's contents
    pub fn insert_collection(
        &mut self,
        database: impl Into<String>,
        collection: impl Into<String>,
        documents: Vec<Document>,
    ) {
        self.collections
            .insert((database.into(), collection.into()), documents);
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn export_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        self.collections
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::DocumentStore(format!("Collection {database}.{collection} does not exist"))
            })
    }
}
