//! Extension classification shared by the discovery worker (what to scan),
//! the metadata worker (what it knows how to decode) and the thumbnail
//! worker (what it knows how to resize).

use std::{ffi::OsStr, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator};

/// Raster and container formats the metadata/thumbnail workers accept.
/// HEIC/HEIF are included per spec §4.6 ("supported formats explicitly
/// include HEIC/HEIF in addition to the common raster formats").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ImageExtension {
	Jpg,
	Jpeg,
	Png,
	Gif,
	Webp,
	Bmp,
	Tiff,
	Heic,
	Heif,
	Avif,
}

impl ImageExtension {
	#[must_use]
	pub fn all() -> Vec<Self> {
		Self::iter().collect()
	}

	#[must_use]
	pub const fn is_heif_family(self) -> bool {
		matches!(self, Self::Heic | Self::Heif)
	}
}

/// Classifies a path's extension, if recognized and supported by the
/// pipeline. Unknown extensions are not an error: the discovery worker
/// simply doesn't hash/submit the file.
#[must_use]
pub fn classify(path: &Path) -> Option<ImageExtension> {
	let ext = path.extension().and_then(OsStr::to_str)?;
	ImageExtension::from_str(ext).ok()
}

#[must_use]
pub fn is_supported(path: &Path) -> bool {
	classify(path).is_some()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn classifies_common_raster_formats() {
		assert_eq!(classify(&PathBuf::from("a.jpg")), Some(ImageExtension::Jpg));
		assert_eq!(classify(&PathBuf::from("a.PNG")), Some(ImageExtension::Png));
		assert_eq!(classify(&PathBuf::from("a.heic")), Some(ImageExtension::Heic));
	}

	#[test]
	fn rejects_unsupported_extensions() {
		assert_eq!(classify(&PathBuf::from("a.txt")), None);
		assert_eq!(classify(&PathBuf::from("no_extension")), None);
	}

	#[test]
	fn heif_family_flag() {
		assert!(ImageExtension::Heic.is_heif_family());
		assert!(!ImageExtension::Jpg.is_heif_family());
	}
}
