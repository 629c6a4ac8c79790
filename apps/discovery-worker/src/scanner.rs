//! Recursive depth-first scan of a single root (spec §4.3 "Scanner
//! contract"). Built on `walkdir` with its own depth/symlink handling
//! disabled in favor of [`sd_core_indexer_rules::ScannerRules`] so the same
//! skip decisions apply whether we're deciding to descend or to index.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use sd_core_indexer_rules::ScannerRules;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FileDescriptor {
	pub absolute_path: PathBuf,
	pub basename: String,
	pub extension: Option<String>,
	pub size: u64,
	pub modified_utc: DateTime<Utc>,
	pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ScanCounters {
	pub files_yielded: u64,
	pub io_errors: u64,
}

/// Walks `root` depth-first, applying `rules` to decide which directories
/// to descend into and which files to yield. I/O errors on individual
/// entries are counted, not fatal (spec §4.3 "Fails with `Io` per-entry;
/// the worker counts but does not abort").
pub fn scan(
	root: &Path,
	rules: &ScannerRules,
	counters: &mut ScanCounters,
) -> Vec<FileDescriptor> {
	let mut out = Vec::new();

	let walker = WalkDir::new(root)
		.follow_links(rules.should_follow_symlink())
		.into_iter()
		.filter_entry(|entry| {
			if entry.depth() == 0 {
				return true;
			}
			if entry.file_type().is_dir() {
				let name = entry.file_name().to_string_lossy();
				rules.should_descend_dir(&name, entry.depth())
			} else {
				true
			}
		});

	for entry in walker {
		let entry = match entry {
			Ok(entry) => entry,
			Err(_) => {
				counters.io_errors += 1;
				continue;
			}
		};

		if !entry.file_type().is_file() {
			continue;
		}

		let name = entry.file_name().to_string_lossy().to_string();
		let extension = sd_core_indexer_rules::extension_of(entry.path()).map(str::to_ascii_lowercase);

		if !rules.should_index_file(&name, extension.as_deref()) {
			continue;
		}

		let metadata = match entry.metadata() {
			Ok(metadata) => metadata,
			Err(_) => {
				counters.io_errors += 1;
				continue;
			}
		};

		let modified_utc = metadata.modified().ok().map(system_time_to_utc).unwrap_or_else(Utc::now);
		let created_utc = metadata.created().ok().map(system_time_to_utc).unwrap_or(modified_utc);

		out.push(FileDescriptor {
			absolute_path: entry.path().to_path_buf(),
			basename: name,
			extension,
			size: metadata.len(),
			modified_utc,
			created_utc,
		});
		counters.files_yielded += 1;
	}

	out
}

fn system_time_to_utc(time: SystemTime) -> DateTime<Utc> {
	DateTime::<Utc>::from(time)
}

#[cfg(test)]
mod tests {
	use super::*;
	use sd_core_indexer_rules::ScannerOptions;

	#[test]
	fn yields_supported_files_and_skips_unsupported() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("a.jpg"), b"hello").unwrap();
		std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

		let rules = ScannerRules::new(ScannerOptions::default()).unwrap();
		let mut counters = ScanCounters::default();
		let files = scan(dir.path(), &rules, &mut counters);

		assert_eq!(files.len(), 1);
		assert_eq!(files[0].basename, "a.jpg");
		assert_eq!(counters.io_errors, 0);
	}

	#[test]
	fn zero_supported_files_yields_empty_scan() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

		let rules = ScannerRules::new(ScannerOptions::default()).unwrap();
		let mut counters = ScanCounters::default();
		let files = scan(dir.path(), &rules, &mut counters);

		assert!(files.is_empty());
		assert_eq!(counters.files_yielded, 0);
	}

	#[test]
	fn skips_nested_excluded_directory() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir(dir.path().join("@eaDir")).unwrap();
		std::fs::write(dir.path().join("@eaDir").join("a.jpg"), b"hello").unwrap();
		std::fs::write(dir.path().join("b.jpg"), b"hello").unwrap();

		let rules = ScannerRules::new(ScannerOptions::default()).unwrap();
		let mut counters = ScanCounters::default();
		let files = scan(dir.path(), &rules, &mut counters);

		assert_eq!(files.len(), 1);
		assert_eq!(files[0].basename, "b.jpg");
	}
}
