use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// EXIF's `DateTimeOriginal` (and friends) carry no time zone. The only
/// policy that is usable against a timezone-aware storage column is to
/// assume UTC (see `DESIGN.md` / spec §9). Strings that begin with `"0000:"`
/// (the camera didn't know the date) or are empty are rejected outright
/// rather than silently stored as a sentinel date — the caller gets `None`
/// and a logged parse failure instead.
#[must_use]
pub fn parse_exif_datetime_assume_utc(raw: &str) -> Option<DateTime<Utc>> {
	let raw = raw.trim();
	if raw.is_empty() || raw.starts_with("0000:") {
		warn!(value = raw, "rejecting ambiguous/sentinel EXIF timestamp");
		return None;
	}

	const EXIF_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
	match NaiveDateTime::parse_from_str(raw, EXIF_FORMAT) {
		Ok(naive) => Some(naive.and_utc()),
		Err(source) => {
			warn!(value = raw, %source, "failed to parse EXIF timestamp");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_well_formed_exif_timestamp_as_utc() {
		let parsed = parse_exif_datetime_assume_utc("2023:06:15 10:30:00").unwrap();
		assert_eq!(parsed.to_rfc3339(), "2023-06-15T10:30:00+00:00");
	}

	#[test]
	fn rejects_empty_string() {
		assert!(parse_exif_datetime_assume_utc("").is_none());
	}

	#[test]
	fn rejects_sentinel_zero_date() {
		assert!(parse_exif_datetime_assume_utc("0000:00:00 00:00:00").is_none());
	}

	#[test]
	fn rejects_garbage() {
		assert!(parse_exif_datetime_assume_utc("not a date").is_none());
	}
}
