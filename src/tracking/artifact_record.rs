//! Artifact Record - content hashes of files a run wrote

use crate::error::Stage;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A file produced by a stage.
///
/// ## CAS Hash Format
///
/// `cas_hash` is `algorithm:hex_digest`, e.g.
/// `sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRecord {
    run_id: String,
    stage: String,
    key: String,
    path: PathBuf,
    cas_hash: String,
    size_bytes: u64,
    created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Hash `path` and record it under `key`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn from_file(
        run_id: impl Into<String>,
        stage: Stage,
        key: impl Into<String>,
        path: &Path,
    ) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            run_id: run_id.into(),
            stage: stage.name().to_string(),
            key: key.into(),
            path: path.to_path_buf(),
            cas_hash: content_hash(&bytes),
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
        })
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the producing stage name.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Get the artifact key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the content-addressable hash.
    #[must_use]
    pub fn cas_hash(&self) -> &str {
        &self.cas_hash
    }

    /// Get the file size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// `sha256:<hex>` of `bytes`
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}
