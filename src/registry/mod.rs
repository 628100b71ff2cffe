//! Model registry backed by object storage
//!
//! The registry is the source of truth for the production model. Stages never
//! reach for a global client: the pipeline constructs one [`ObjectStore`] and
//! lends it to evaluation, the pusher and prediction.
//!
//! # Example
//!
//! ```rust
//! use visa_pipeline::registry::{MemoryObjectStore, ObjectStore};
//!
//! # fn example() -> visa_pipeline::Result<()> {
//! let store = MemoryObjectStore::new();
//!
//! store.put("usvisa-model-registry", "model.json", b"{}".to_vec())?;
//! assert!(store.exists("usvisa-model-registry", "model.json")?);
//! assert_eq!(store.get("usvisa-model-registry", "model.json")?, Some(b"{}".to_vec()));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod estimator;
mod fs;
mod memory;
mod s3;

pub use estimator::RegistryEstimator;
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::{S3Credentials, S3ObjectStore, DEFAULT_REGION};

use crate::Result;

/// Open the registry at `url`.
///
/// `http://` and `https://` URLs name an S3-compatible endpoint whose keys
/// come from the environment (see [`S3ObjectStore::from_env`]); `file://`
/// URLs and bare paths name a local directory.
///
/// # Errors
///
/// Returns [`Error::Config`](crate::Error::Config) for unsupported schemes
/// or missing credentials
pub fn open_store(url: &str) -> Result<Box<dyn ObjectStore>> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        let store = S3ObjectStore::from_env(url)?;
        tracing::info!(endpoint = url, region = store.region(), "Using S3 registry");
        return Ok(Box::new(store));
    }
    Ok(Box::new(FsObjectStore::from_url(url)?))
}

/// Object-storage access keyed by bucket and key.
///
/// A write is durable once `put` returns `Ok`; callers do not read back.
pub trait ObjectStore: Send + Sync {
    /// Fetch an object.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store an object.
    ///
    /// Overwrites any existing object.
    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Check if an object exists.
    fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
}
