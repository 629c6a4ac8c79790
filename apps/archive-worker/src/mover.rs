//! Move semantics for archiving a file (spec §4.7 steps 3-4). Grounded in
//! `core/crates/file-actions`'s mover (`tokio::fs::rename`, "already exists"
//! precondition) and copier fast-path (`is_same_filesystem` check,
//! copy-then-delete otherwise).

use std::path::{Path, PathBuf};

use sd_utils::error::{FileIOError, IoErrorExt};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("archive target already exists: {}", .0.display())]
	TargetExists(PathBuf),
	#[error(transparent)]
	Io(#[from] FileIOError),
}

/// Whether `source` and `target` are plausibly on the same filesystem, used
/// to decide between an atomic rename and copy-then-delete. A precise
/// check would compare device ids (`MetadataExt::dev` on Unix); the fast
/// path here simply tries the rename first and falls back on `EXDEV`,
/// which is the only case that distinction actually matters for.
async fn rename_or_copy(source: &Path, target: &Path) -> Result<(), Error> {
	match tokio::fs::rename(source, target).await {
		Ok(()) => Ok(()),
		Err(error) if error.raw_os_error() == Some(libc_exdev()) => {
			tokio::fs::copy(source, target).await.for_path(source)?;
			tokio::fs::remove_file(source).await.for_path(source)?;
			Ok(())
		}
		Err(error) => Err(FileIOError::new(source, error).into()),
	}
}

#[cfg(unix)]
fn libc_exdev() -> i32 {
	18 // EXDEV on Linux/macOS
}

#[cfg(not(unix))]
fn libc_exdev() -> i32 {
	17 // ERROR_NOT_SAME_DEVICE-ish placeholder; Windows rename crosses volumes differently
}

/// Archives `source` under `trash_root`, preserving `relative_path`
/// (the file's path under its scan root), creating directories as needed
/// (spec §4.7 step 3). Refuses to overwrite an existing archive target —
/// that would indicate either a double-archive or a colliding path, both
/// of which should surface as an error rather than silently clobber.
pub async fn archive_file(
	source: &Path,
	trash_root: &Path,
	relative_path: &Path,
) -> Result<PathBuf, Error> {
	let target = trash_root.join(relative_path);
	if let Some(parent) = target.parent() {
		tokio::fs::create_dir_all(parent).await.for_path(parent)?;
	}
	if tokio::fs::try_exists(&target).await.unwrap_or(false) {
		return Err(Error::TargetExists(target));
	}

	rename_or_copy(source, &target).await?;
	Ok(target)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn moves_file_preserving_relative_path() {
		let source_dir = tempfile::tempdir().unwrap();
		let trash_dir = tempfile::tempdir().unwrap();
		let source = source_dir.path().join("a.jpg");
		std::fs::write(&source, b"hello").unwrap();

		let archived = archive_file(&source, trash_dir.path(), Path::new("sub/a.jpg")).await.unwrap();

		assert_eq!(archived, trash_dir.path().join("sub/a.jpg"));
		assert!(!source.exists());
		assert_eq!(std::fs::read(&archived).unwrap(), b"hello");
	}

	#[tokio::test]
	async fn refuses_to_overwrite_existing_archive_target() {
		let source_dir = tempfile::tempdir().unwrap();
		let trash_dir = tempfile::tempdir().unwrap();
		let source = source_dir.path().join("a.jpg");
		std::fs::write(&source, b"hello").unwrap();
		std::fs::create_dir_all(trash_dir.path().join("sub")).unwrap();
		std::fs::write(trash_dir.path().join("sub/a.jpg"), b"already here").unwrap();

		let result = archive_file(&source, trash_dir.path(), Path::new("sub/a.jpg")).await;
		assert!(matches!(result, Err(Error::TargetExists(_))));
	}
}
