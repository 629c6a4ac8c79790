//! Uploads a file's raw bytes to both processing-input scratch buckets
//! (spec §4.3, §4.1) before the batch descriptor that references them is
//! submitted — the fan-out publisher's contract (§4.4.2) requires both
//! objects to already exist by the time `FileDiscovered` is published.

use std::path::Path;

use bytes::Bytes;
use sd_object_store::{source_object_key, ObjectStore, METADATA_IMAGES_BUCKET, THUMBNAIL_IMAGES_BUCKET};
use sd_utils::error::{FileIOError, IoErrorExt};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] FileIOError),
	#[error(transparent)]
	ObjectStore(#[from] sd_object_store::Error),
}

fn guess_content_type(extension: Option<&str>) -> &'static str {
	match extension.map(str::to_ascii_lowercase).as_deref() {
		Some("jpg") | Some("jpeg") => "image/jpeg",
		Some("png") => "image/png",
		Some("gif") => "image/gif",
		Some("heic") | Some("heif") => "image/heic",
		Some("webp") => "image/webp",
		_ => "application/octet-stream",
	}
}

/// Reads `path` once and puts the same bytes under the content-addressed
/// key to both scratch buckets. Content addressing makes both uploads
/// idempotent no-ops if this file (by hash) was already uploaded — e.g. on
/// `reprocess` of a file that still has objects pending consumption.
pub async fn upload_to_scratch_buckets(
	object_store: &dyn ObjectStore,
	path: &Path,
	hash: &str,
	extension: Option<&str>,
) -> Result<(), Error> {
	let bytes = Bytes::from(tokio::fs::read(path).await.for_path(path)?);
	let key = source_object_key(hash);
	let content_type = guess_content_type(extension);

	object_store.put(METADATA_IMAGES_BUCKET, &key, bytes.clone(), content_type).await?;
	object_store.put(THUMBNAIL_IMAGES_BUCKET, &key, bytes, content_type).await?;

	Ok(())
}
