//! Content-addressed blob storage (spec §4.1): `ensureBucket`, `put`, `get`,
//! `delete`, each retry-safe. The production implementation speaks the S3
//! API, which MinIO implements, configured with a custom endpoint and
//! path-style addressing the way every MinIO-backed Rust service does.

pub mod buckets;
mod retry;
mod s3;

pub use buckets::{
	source_object_key, thumbnail_object_key, METADATA_IMAGES_BUCKET, THUMBNAILS_BUCKET,
	THUMBNAIL_IMAGES_BUCKET,
};
pub use s3::{S3Config, S3ObjectStore};

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("object not found: {bucket}/{key}")]
	NotFound { bucket: String, key: String },
	#[error("object store request failed after retries: {0}")]
	Backend(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
	async fn ensure_bucket(&self, bucket: &str) -> Result<(), Error>;
	async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str) -> Result<(), Error>;
	async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, Error>;
	async fn delete(&self, bucket: &str, key: &str) -> Result<(), Error>;
}
