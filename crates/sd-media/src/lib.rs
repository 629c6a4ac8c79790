pub mod exif;
pub mod heif;
pub mod thumbnail;

pub use exif::ExifMetadata;
pub use thumbnail::ThumbnailOptions;
