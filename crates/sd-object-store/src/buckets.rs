//! Bucket names and key conventions (spec §4.1, §6.4). Keys are
//! content-addressed so concurrent uploads of identical bytes are
//! idempotent no-ops on the second attempt.

/// Scratch bucket consumed and deleted by the metadata worker.
pub const METADATA_IMAGES_BUCKET: &str = "metadata-images";
/// Scratch bucket consumed and deleted by the thumbnail worker.
pub const THUMBNAIL_IMAGES_BUCKET: &str = "thumbnail-images";
/// Derivative bucket, retained until the source row is deleted.
pub const THUMBNAILS_BUCKET: &str = "thumbnails";

#[must_use]
pub fn source_object_key(hash: &str) -> String {
	format!("files/{hash}")
}

#[must_use]
pub fn thumbnail_object_key(hash: &str) -> String {
	format!("thumbs/{hash}.jpg")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_are_content_addressed() {
		assert_eq!(source_object_key("abc123"), "files/abc123");
		assert_eq!(thumbnail_object_key("abc123"), "thumbs/abc123.jpg");
	}
}
