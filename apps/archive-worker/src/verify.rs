//! Re-hashes a file on disk to confirm it still matches the hash the
//! delete command was issued against (spec §4.7 step 1). Uses the same
//! full-file BLAKE3 streaming approach as the discovery worker's hasher so
//! a file that hasn't changed since discovery verifies cleanly.

use std::path::Path;

use sd_utils::error::{FileIOError, IoErrorExt};
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 256 * 1024;

pub async fn hashes_match(path: &Path, expected_hash: &str) -> Result<bool, FileIOError> {
	let mut file = tokio::fs::File::open(path).await.for_path(path)?;
	let mut hasher = blake3::Hasher::new();
	let mut buf = vec![0u8; CHUNK_SIZE];

	loop {
		let read = file.read(&mut buf).await.for_path(path)?;
		if read == 0 {
			break;
		}
		hasher.update(&buf[..read]);
	}

	Ok(hasher.finalize().to_hex().to_string() == expected_hash)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn matches_when_content_unchanged() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("a.bin");
		std::fs::write(&path, b"stable content").unwrap();
		let hash = blake3::hash(b"stable content").to_hex().to_string();
		assert!(hashes_match(&path, &hash).await.unwrap());
	}

	#[tokio::test]
	async fn mismatches_when_content_changed() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("a.bin");
		std::fs::write(&path, b"changed content").unwrap();
		let stale_hash = blake3::hash(b"stable content").to_hex().to_string();
		assert!(!hashes_match(&path, &stale_hash).await.unwrap());
	}
}
