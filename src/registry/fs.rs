//! Directory-backed object store: `<root>/<bucket>/<key>`

use super::ObjectStore;
use crate::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Object store on the local filesystem.
///
/// Keys may contain `/` to form prefixes; `..` and absolute keys are rejected.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store at the location named by a registry URL (`file://` or path)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unsupported URLs
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(crate::config::store_location(url)?))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        for part in [bucket, key] {
            let relative = Path::new(part);
            let valid = !part.is_empty()
                && relative
                    .components()
                    .all(|component| matches!(component, Component::Normal(_)));
            if !valid {
                return Err(Error::Registry(format!(
                    "Invalid object location {bucket}/{key}"
                )));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Registry(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        crate::persist::ensure_parent_dir(&path)?;
        fs::write(&path, bytes).map_err(|e| {
            Error::Registry(format!("Failed to write {}: {e}", path.display()))
        })
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.object_path(bucket, key)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("bucket", "models/v1/model.json", b"{}".to_vec()).unwrap();
        assert!(dir.path().join("bucket/models/v1/model.json").is_file());
        assert!(store.exists("bucket", "models/v1/model.json").unwrap());
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        assert!(store.put("bucket", "../outside.json", vec![]).is_err());
        assert!(store.get("bucket", "/etc/passwd").is_err());
        assert!(store.exists("", "model.json").is_err());
    }
}
