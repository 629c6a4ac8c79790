//! The discovery worker's scanner contract (spec §4.3): a closed, boot-time
//! configured set of skip rules, not the operator-editable rule table the
//! teacher's `sd-core-indexer-rules` exposes over the UI — this pipeline has
//! no rule CRUD surface (that's UI-owned and out of scope, spec §1).

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Static list of NAS housekeeping directories that are never worth
/// indexing, regardless of operator configuration.
pub const STATIC_EXCLUDED_DIRS: &[&str] = &[
	"@eaDir",
	"#recycle",
	"#snapshot",
	"$RECYCLE.BIN",
	"System Volume Information",
	".Trash-1000",
	"@Recently-Snapshot",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerOptions {
	/// File extensions the discovery worker will submit (others are walked
	/// past but never hashed/uploaded).
	pub supported_extensions: Vec<String>,
	/// Additional operator-configured excluded directory names/globs, on
	/// top of [`STATIC_EXCLUDED_DIRS`].
	pub excluded_dirs: Vec<String>,
	pub skip_hidden: bool,
	pub follow_symlinks: bool,
	pub max_depth: usize,
}

impl Default for ScannerOptions {
	fn default() -> Self {
		Self {
			supported_extensions: vec![
				"jpg".into(),
				"jpeg".into(),
				"png".into(),
				"gif".into(),
				"webp".into(),
				"bmp".into(),
				"tiff".into(),
				"heic".into(),
				"heif".into(),
				"avif".into(),
			],
			excluded_dirs: Vec::new(),
			skip_hidden: true,
			follow_symlinks: false,
			max_depth: 32,
		}
	}
}

pub struct ScannerRules {
	excluded: GlobSet,
	options: ScannerOptions,
}

impl ScannerRules {
	/// # Errors
	/// Returns a [`globset::Error`] if an operator-configured exclusion
	/// pattern is not a valid glob.
	pub fn new(options: ScannerOptions) -> Result<Self, globset::Error> {
		let mut builder = GlobSetBuilder::new();
		for name in STATIC_EXCLUDED_DIRS {
			builder.add(Glob::new(name)?);
		}
		for pattern in &options.excluded_dirs {
			builder.add(Glob::new(pattern)?);
		}
		Ok(Self {
			excluded: builder.build()?,
			options,
		})
	}

	#[must_use]
	pub fn options(&self) -> &ScannerOptions {
		&self.options
	}

	/// Whether a directory entry (by base name) should be descended into.
	#[must_use]
	pub fn should_descend_dir(&self, dir_name: &str, depth: usize) -> bool {
		if depth >= self.options.max_depth {
			return false;
		}
		if self.options.skip_hidden && is_dotfile(dir_name) {
			return false;
		}
		!self.excluded.is_match(dir_name)
	}

	/// Whether a file entry should be considered for hashing/submission.
	#[must_use]
	pub fn should_index_file(&self, file_name: &str, extension: Option<&str>) -> bool {
		if self.options.skip_hidden && is_dotfile(file_name) {
			return false;
		}
		match extension {
			Some(ext) => self
				.options
				.supported_extensions
				.iter()
				.any(|supported| supported.eq_ignore_ascii_case(ext)),
			None => false,
		}
	}

	#[must_use]
	pub fn should_follow_symlink(&self) -> bool {
		self.options.follow_symlinks
	}
}

#[must_use]
pub fn is_dotfile(name: &str) -> bool {
	name.starts_with('.')
}

#[must_use]
pub fn extension_of(path: &Path) -> Option<&str> {
	path.extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rules() -> ScannerRules {
		ScannerRules::new(ScannerOptions::default()).unwrap()
	}

	#[test]
	fn skips_static_nas_directories() {
		let r = rules();
		assert!(!r.should_descend_dir("@eaDir", 0));
		assert!(!r.should_descend_dir("#recycle", 0));
	}

	#[test]
	fn skips_dotdirectories_when_configured() {
		let r = rules();
		assert!(!r.should_descend_dir(".git", 0));
	}

	#[test]
	fn respects_max_depth() {
		let r = rules();
		assert!(!r.should_descend_dir("ordinary", 32));
		assert!(r.should_descend_dir("ordinary", 31));
	}

	#[test]
	fn indexes_only_supported_extensions() {
		let r = rules();
		assert!(r.should_index_file("a.jpg", Some("jpg")));
		assert!(r.should_index_file("a.HEIC", Some("HEIC")));
		assert!(!r.should_index_file("a.txt", Some("txt")));
		assert!(!r.should_index_file("noext", None));
	}

	#[test]
	fn skips_hidden_files_when_configured() {
		let r = rules();
		assert!(!r.should_index_file(".hidden.jpg", Some("jpg")));
	}

	#[test]
	fn operator_excluded_dir_pattern_is_respected() {
		let mut opts = ScannerOptions::default();
		opts.excluded_dirs.push("node_modules".into());
		let r = ScannerRules::new(opts).unwrap();
		assert!(!r.should_descend_dir("node_modules", 0));
	}
}
