//! EXIF extraction and normalization (spec §4.4.3, §4.6): GPS rationals to
//! signed decimals, aperture/shutter-speed formatting, UTC-assuming capture
//! timestamps. Grounded in the teacher's `sd-media-metadata`
//! (`kamadak-exif` dependency) and `heavy-lifting::media_processor`'s
//! `exif_media_data` shape.

use std::{fs::File, io::BufReader, path::Path};

use chrono::{DateTime, Utc};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use sd_utils::time::parse_exif_datetime_assume_utc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to decode image dimensions: {0}")]
	Dimensions(#[from] image::ImageError),
	#[error("I/O error reading '{0}': {1}")]
	Io(std::path::PathBuf, std::io::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExifMetadata {
	pub width: Option<u32>,
	pub height: Option<u32>,
	pub date_taken: Option<DateTime<Utc>>,
	pub camera_make: Option<String>,
	pub camera_model: Option<String>,
	pub gps_latitude: Option<f64>,
	pub gps_longitude: Option<f64>,
	pub iso: Option<u32>,
	pub aperture: Option<String>,
	pub shutter_speed: Option<String>,
	pub orientation: Option<u16>,
}

impl ExifMetadata {
	#[must_use]
	pub fn has_any_field(&self) -> bool {
		self.date_taken.is_some()
			|| self.camera_make.is_some()
			|| self.camera_model.is_some()
			|| self.gps_latitude.is_some()
			|| self.iso.is_some()
			|| self.aperture.is_some()
			|| self.shutter_speed.is_some()
	}
}

/// Extracts what it can from `path`; never fails on the *absence* of EXIF
/// data, only on outright I/O or decode errors (those bubble up as
/// `Decode`-kind errors to the caller, per spec §7).
///
/// HEIC/HEIF containers are sniffed by magic bytes and routed through
/// `libheif-rs` ([`crate::heif`]), since `image`'s dimension/EXIF readers
/// cannot parse an ISO-BMFF container at all.
pub fn extract(path: &Path) -> Result<ExifMetadata, Error> {
	let bytes = std::fs::read(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;

	if crate::heif::is_heif(&bytes) {
		return Ok(extract_heif(&bytes));
	}

	let (width, height) = image::image_dimensions(path)
		.map(|(w, h)| (Some(w), Some(h)))
		.unwrap_or((None, None));

	let mut out = ExifMetadata {
		width,
		height,
		..Default::default()
	};

	let file = File::open(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
	let mut reader = BufReader::new(file);
	let Ok(exif) = Reader::new().read_from_container(&mut reader) else {
		return Ok(out);
	};

	fill_from_exif(&mut out, &exif);
	Ok(out)
}

/// HEIF counterpart of the JPEG/TIFF path above: dimensions come from
/// libheif's container handle, EXIF fields (when present) from the
/// container's raw `Exif` metadata item fed through the same
/// `kamadak-exif` field readers via [`exif::Reader::read_raw`].
fn extract_heif(bytes: &[u8]) -> ExifMetadata {
	let (width, height) = crate::heif::decode_dimensions(bytes)
		.map(|(w, h)| (Some(w), Some(h)))
		.unwrap_or((None, None));

	let mut out = ExifMetadata {
		width,
		height,
		..Default::default()
	};

	let Some(raw) = crate::heif::extract_raw_exif(bytes) else {
		return out;
	};
	let Ok(exif) = Reader::new().read_raw(raw) else {
		return out;
	};

	fill_from_exif(&mut out, &exif);
	out
}

fn fill_from_exif(out: &mut ExifMetadata, exif: &exif::Exif) {
	out.camera_make = read_string(exif, Tag::Make);
	out.camera_model = read_string(exif, Tag::Model);
	out.orientation = read_u16(exif, Tag::Orientation);
	out.iso = read_u32(exif, Tag::PhotographicSensitivity);

	out.date_taken = read_string(exif, Tag::DateTimeOriginal)
		.or_else(|| read_string(exif, Tag::DateTime))
		.and_then(|raw| parse_exif_datetime_assume_utc(&raw));

	out.aperture = read_rational(exif, Tag::FNumber).map(format_aperture);
	out.shutter_speed = read_rational(exif, Tag::ExposureTime).map(format_shutter_speed);

	out.gps_latitude = gps_decimal(
		read_rational_vec(exif, Tag::GPSLatitude),
		read_string(exif, Tag::GPSLatitudeRef).as_deref(),
	);
	out.gps_longitude = gps_decimal(
		read_rational_vec(exif, Tag::GPSLongitude),
		read_string(exif, Tag::GPSLongitudeRef).as_deref(),
	);
}

fn read_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
	let field = exif.get_field(tag, In::PRIMARY)?;
	Some(field.display_value().to_string().trim().to_string())
}

fn read_u16(exif: &exif::Exif, tag: Tag) -> Option<u16> {
	let field = exif.get_field(tag, In::PRIMARY)?;
	match &field.value {
		Value::Short(v) => v.first().copied(),
		_ => None,
	}
}

fn read_u32(exif: &exif::Exif, tag: Tag) -> Option<u32> {
	let field = exif.get_field(tag, In::PRIMARY)?;
	match &field.value {
		Value::Short(v) => v.first().map(|&x| u32::from(x)),
		Value::Long(v) => v.first().copied(),
		_ => None,
	}
}

/// A single rational (numerator, denominator), e.g. `FNumber`/`ExposureTime`.
fn read_rational(exif: &exif::Exif, tag: Tag) -> Option<(u32, u32)> {
	let field = exif.get_field(tag, In::PRIMARY)?;
	match &field.value {
		Value::Rational(v) => v.first().map(|r| (r.num, r.denom)),
		_ => None,
	}
}

fn read_rational_vec(exif: &exif::Exif, tag: Tag) -> Option<Vec<(u32, u32)>> {
	let field = exif.get_field(tag, In::PRIMARY)?;
	match &field.value {
		Value::Rational(v) => Some(v.iter().map(|r| (r.num, r.denom)).collect()),
		_ => None,
	}
}

/// `f/<value>`, e.g. `FNumber = 4/1` → `"f/4"`, `28/10` → `"f/2.8"`.
fn format_aperture((num, denom): (u32, u32)) -> String {
	if denom == 0 {
		return "f/0".to_string();
	}
	let value = f64::from(num) / f64::from(denom);
	if (value.fract()).abs() < f64::EPSILON {
		format!("f/{value:.0}")
	} else {
		format!("f/{value:.1}")
	}
}

/// `1/<denom>` when numerator is 1, `<seconds>s` when the exposure is a full
/// second or longer, else `1/<1⁄seconds>` (spec §4.6).
fn format_shutter_speed((num, denom): (u32, u32)) -> String {
	if denom == 0 {
		return "0s".to_string();
	}
	if num == 1 {
		return format!("1/{denom}");
	}

	let seconds = f64::from(num) / f64::from(denom);
	if seconds >= 1.0 {
		format!("{seconds:.1}s")
	} else {
		let inverse = (1.0 / seconds).round() as u64;
		format!("1/{inverse}")
	}
}

/// Converts a GPS (degrees, minutes, seconds) rational triple plus its N/S
/// or E/W reference into a signed decimal degree.
fn gps_decimal(components: Option<Vec<(u32, u32)>>, reference: Option<&str>) -> Option<f64> {
	let components = components?;
	if components.len() != 3 {
		return None;
	}
	let to_f64 = |(n, d): (u32, u32)| if d == 0 { 0.0 } else { f64::from(n) / f64::from(d) };

	let degrees = to_f64(components[0]);
	let minutes = to_f64(components[1]);
	let seconds = to_f64(components[2]);
	let mut decimal = degrees + minutes / 60.0 + seconds / 3600.0;

	if matches!(reference, Some("S") | Some("W")) {
		decimal = -decimal;
	}
	Some(decimal)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aperture_formats_as_f_slash_value() {
		assert_eq!(format_aperture((4, 1)), "f/4");
		assert_eq!(format_aperture((28, 10)), "f/2.8");
	}

	#[test]
	fn shutter_speed_with_numerator_one() {
		assert_eq!(format_shutter_speed((1, 250)), "1/250");
	}

	#[test]
	fn shutter_speed_at_or_above_one_second() {
		assert_eq!(format_shutter_speed((2, 1)), "2.0s");
	}

	#[test]
	fn shutter_speed_fractional_non_unit_numerator() {
		// 3/10 second exposure -> not numerator 1, not >= 1s -> 1/(10/3) ~ 1/3
		assert_eq!(format_shutter_speed((3, 10)), "1/3");
	}

	#[test]
	fn gps_decimal_applies_south_and_west_as_negative() {
		let components = vec![(40, 1), (30, 1), (0, 1)];
		let north = gps_decimal(Some(components.clone()), Some("N")).unwrap();
		let south = gps_decimal(Some(components), Some("S")).unwrap();
		assert!(north > 0.0);
		assert!(south < 0.0);
		assert!((north - 40.5).abs() < 0.001);
	}
}
