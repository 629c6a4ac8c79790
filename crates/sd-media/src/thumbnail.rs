//! Thumbnail generation (spec §4.6), grounded in
//! `sd-core-location-scan/src/media_processor/helpers/thumbnailer.rs`'s
//! resize-to-fit + re-encode shape, simplified to the spec's fixed JPEG
//! output (the teacher additionally supports WebP/video; out of scope here).

use image::{imageops::FilterType, DynamicImage, GenericImageView};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to decode source image: {0}")]
	Decode(#[from] image::ImageError),
	#[error("failed to decode HEIF source image: {0}")]
	Heif(#[from] crate::heif::Error),
	#[error("decoded HEIF plane size did not match its reported dimensions")]
	HeifPlaneSize,
}

#[derive(Debug, Clone, Copy)]
pub struct ThumbnailOptions {
	pub max_width: u32,
	pub max_height: u32,
	pub jpeg_quality: u8,
}

impl Default for ThumbnailOptions {
	fn default() -> Self {
		Self {
			max_width: 300,
			max_height: 300,
			jpeg_quality: 85,
		}
	}
}

/// Resizes `bytes` to fit inside `options`' bounding box, preserving aspect
/// ratio, and re-encodes as JPEG. If the source already fits, it passes
/// through unresized (still re-encoded as JPEG, since the derivative bucket
/// only ever holds JPEGs).
///
/// `bytes` is sniffed for a HEIF container first — `image` has no built-in
/// HEIC/HEIF decoder, so those go through `libheif-rs` ([`crate::heif`])
/// instead before falling into the same resize/encode path.
pub fn generate(bytes: &[u8], options: ThumbnailOptions) -> Result<Vec<u8>, Error> {
	let image = if crate::heif::is_heif(bytes) {
		let decoded = crate::heif::decode_to_rgb(bytes)?;
		image::RgbImage::from_raw(decoded.width, decoded.height, decoded.rgb)
			.map(DynamicImage::ImageRgb8)
			.ok_or(Error::HeifPlaneSize)?
	} else {
		image::load_from_memory(bytes)?
	};
	let (width, height) = image.dimensions();

	let resized = if width <= options.max_width && height <= options.max_height {
		image
	} else {
		image.resize(options.max_width, options.max_height, FilterType::Lanczos3)
	};

	encode_jpeg(&resized, options.jpeg_quality)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, Error> {
	let mut buf = Vec::new();
	let mut encoder =
		image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
	encoder.encode_image(image)?;
	Ok(buf)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn make_test_jpeg(width: u32, height: u32) -> Vec<u8> {
		let image = DynamicImage::new_rgb8(width, height);
		let mut buf = Vec::new();
		image
			.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)
			.unwrap();
		buf
	}

	#[test]
	fn passes_through_when_already_within_bounds() {
		let source = make_test_jpeg(100, 100);
		let thumb = generate(&source, ThumbnailOptions::default()).unwrap();
		let decoded = image::load_from_memory(&thumb).unwrap();
		assert_eq!(decoded.dimensions(), (100, 100));
	}

	#[test]
	fn downscales_preserving_aspect_ratio() {
		let source = make_test_jpeg(1200, 600);
		let thumb = generate(&source, ThumbnailOptions::default()).unwrap();
		let decoded = image::load_from_memory(&thumb).unwrap();
		let (w, h) = decoded.dimensions();
		assert!(w <= 300 && h <= 300);
		// Aspect ratio 2:1 preserved within rounding.
		assert!((f64::from(w) / f64::from(h) - 2.0).abs() < 0.1);
	}
}
