use std::{io, path::Path, path::PathBuf};

/// An [`io::Error`] with the path that caused it attached, so callers further
/// up the stack (job counters, hub status reports) can report something more
/// useful than "No such file or directory".
#[derive(Debug, thiserror::Error)]
#[error("I/O error for path '{}': {source}", path.display())]
pub struct FileIOError {
	pub path: PathBuf,
	#[source]
	pub source: io::Error,
}

impl FileIOError {
	pub fn new(path: impl AsRef<Path>, source: io::Error) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
			source,
		}
	}
}

/// Attaches a path to an [`io::Error`]-returning `Result`.
pub trait IoErrorExt<T> {
	fn for_path(self, path: impl AsRef<Path>) -> Result<T, FileIOError>;
}

impl<T> IoErrorExt<T> for Result<T, io::Error> {
	fn for_path(self, path: impl AsRef<Path>) -> Result<T, FileIOError> {
		self.map_err(|source| FileIOError::new(path, source))
	}
}
