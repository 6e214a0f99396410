// src/storage/mod.rs

//! Object storage abstractions.
//!
//! The pipeline consumes storage as an opaque get/put-by-key collaborator:
//! the subscription list and avatar reference data are read from it, and
//! the published collection is written back to it wholesale.

pub mod local;
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStore;
pub use s3::S3Store;

/// Trait for object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object's bytes. A missing key is an error; every key this
    /// pipeline reads is a required input.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Write an object, replacing prior content wholesale.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
}
