//! Original-selection scoring (spec §4.4.4), grounded in the teacher's
//! `sd-core-location-scan`'s rule-evaluation shape (ordered rule list,
//! highest-priority-wins, explicit tie handling) even though the inputs
//! here are photo attributes rather than indexer rules.

use chrono::{DateTime, Datelike, Utc};

use crate::entities::{indexed_file, selection_preference};

/// `+5` per directory segment beyond the scan root, capped at `+25`.
const PATH_DEPTH_POINTS_PER_SEGMENT: i32 = 5;
const PATH_DEPTH_CAP: i32 = 25;

/// `+20` flat bonus when any EXIF field was decoded.
const EXIF_PRESENT_BONUS: i32 = 20;

/// `+1` per full month of age, capped at `+12`.
const AGE_POINTS_PER_MONTH: i32 = 1;
const AGE_CAP: i32 = 12;

/// Score gap below which `autoSelectOriginal` declines to pick.
pub const DEFAULT_CONFLICT_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
	pub file_id: uuid::Uuid,
	pub score: i32,
}

/// Scores one file against the operator's path preferences, relative to
/// `scan_root` (used to count path-depth segments) and `now` (used to
/// compute age).
pub fn score_file(
	file: &indexed_file::Model,
	scan_root: &str,
	preferences: &[selection_preference::Model],
	now: DateTime<Utc>,
) -> i32 {
	path_priority_score(&file.path, preferences)
		+ exif_present_score(file)
		+ path_depth_score(&file.path, scan_root)
		+ age_score(file, now)
}

fn path_priority_score(path: &str, preferences: &[selection_preference::Model]) -> i32 {
	preferences
		.iter()
		.filter(|p| path.starts_with(p.path_prefix.as_str()))
		// Longest prefix wins, then priority, then the operator's own
		// `sort_order` tie-break (spec §3 `SelectionPreference`); lower
		// `sort_order` wins, so negate it for `max_by_key`.
		.max_by_key(|p| (p.path_prefix.len(), p.priority, -p.sort_order))
		.map(|p| p.priority)
		.unwrap_or(0)
}

fn exif_present_score(file: &indexed_file::Model) -> i32 {
	let has_exif = file.capture_time.is_some()
		|| file.camera_make.is_some()
		|| file.camera_model.is_some()
		|| file.gps_latitude.is_some()
		|| file.iso.is_some()
		|| file.aperture.is_some()
		|| file.shutter_speed.is_some();
	if has_exif {
		EXIF_PRESENT_BONUS
	} else {
		0
	}
}

fn path_depth_score(path: &str, scan_root: &str) -> i32 {
	let relative = path.strip_prefix(scan_root).unwrap_or(path);
	let segments = relative
		.split('/')
		.filter(|segment| !segment.is_empty())
		.count()
		.saturating_sub(1); // last segment is the filename, not a directory.
	let points = i32::try_from(segments).unwrap_or(i32::MAX) * PATH_DEPTH_POINTS_PER_SEGMENT;
	points.min(PATH_DEPTH_CAP)
}

fn age_score(file: &indexed_file::Model, now: DateTime<Utc>) -> i32 {
	let reference = file.capture_time.unwrap_or(file.fs_modified_at);
	let months = full_months_between(reference, now);
	(months * AGE_POINTS_PER_MONTH).min(AGE_CAP)
}

fn full_months_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i32 {
	if later <= earlier {
		return 0;
	}
	let mut months = (later.year() - earlier.year()) * 12 + (later.month() as i32 - earlier.month() as i32);
	if later.day() < earlier.day() {
		months -= 1;
	}
	months.max(0)
}

/// Scores every live member of a group and sorts descending. Returns
/// `None` if the top two scores differ by less than `conflict_threshold`
/// (spec §4.4.4) — the caller should leave the group `pending` in that case.
pub fn auto_select(
	members: &[indexed_file::Model],
	scan_root: &str,
	preferences: &[selection_preference::Model],
	now: DateTime<Utc>,
	conflict_threshold: i32,
) -> AutoSelectOutcome {
	let mut scored: Vec<Scored> = members
		.iter()
		.map(|file| Scored {
			file_id: file.id,
			score: score_file(file, scan_root, preferences, now),
		})
		.collect();
	scored.sort_by(|a, b| b.score.cmp(&a.score).then(a.file_id.cmp(&b.file_id)));

	match scored.as_slice() {
		[] => AutoSelectOutcome::NoMembers,
		[only] => AutoSelectOutcome::Picked {
			file_id: only.file_id,
			margin: only.score,
		},
		[top, runner_up, ..] => {
			let margin = top.score - runner_up.score;
			if margin < conflict_threshold {
				AutoSelectOutcome::Conflict { top_score: top.score, margin }
			} else {
				AutoSelectOutcome::Picked { file_id: top.file_id, margin }
			}
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSelectOutcome {
	Picked { file_id: uuid::Uuid, margin: i32 },
	Conflict { top_score: i32, margin: i32 },
	NoMembers,
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use uuid::Uuid;

	fn file(path: &str, capture_months_ago: Option<i64>, has_exif: bool) -> indexed_file::Model {
		let now = Utc.with_ymd_and_hms(2026, 7, 27, 0, 0, 0).unwrap();
		let capture_time = capture_months_ago.map(|m| now - chrono::Duration::days(m * 30));
		indexed_file::Model {
			id: Uuid::new_v4(),
			scan_directory_id: Uuid::new_v4(),
			path: path.to_string(),
			basename: path.rsplit('/').next().unwrap_or(path).to_string(),
			extension: Some("jpg".to_string()),
			file_hash: "h".to_string(),
			size_bytes: 100,
			fs_created_at: now,
			fs_modified_at: now,
			indexed_at: now,
			width: None,
			height: None,
			capture_time,
			camera_make: has_exif.then(|| "Canon".to_string()),
			camera_model: None,
			gps_latitude: None,
			gps_longitude: None,
			iso: None,
			aperture: None,
			shutter_speed: None,
			orientation: None,
			metadata_error: None,
			thumbnail_object_key: None,
			thumbnail_error: None,
			retry_count: 0,
			duplicate_group_id: None,
			is_original: false,
			hidden: false,
			hidden_category: None,
			hidden_rule_id: None,
			is_deleted: false,
			archive_path: None,
			archived_at: None,
		}
	}

	#[test]
	fn path_depth_is_capped_at_25() {
		let deep = file("/root/a/b/c/d/e/f/g/h/i/j/k/photo.jpg", None, false);
		let score = path_depth_score(&deep.path, "/root");
		assert_eq!(score, PATH_DEPTH_CAP);
	}

	#[test]
	fn exif_present_adds_flat_bonus() {
		let with_exif = file("/root/photo.jpg", None, true);
		let without = file("/root/photo.jpg", None, false);
		assert_eq!(exif_present_score(&with_exif), EXIF_PRESENT_BONUS);
		assert_eq!(exif_present_score(&without), 0);
	}

	#[test]
	fn age_is_capped_at_12_points() {
		let now = Utc.with_ymd_and_hms(2026, 7, 27, 0, 0, 0).unwrap();
		let old = file("/root/photo.jpg", Some(36), false);
		assert_eq!(age_score(&old, now), AGE_CAP);
	}

	#[test]
	fn close_scores_are_reported_as_conflict() {
		let a = file("/root/photo_a.jpg", None, true);
		let b = file("/root/photo_b.jpg", None, true);
		let outcome = auto_select(&[a, b], "/root", &[], Utc::now(), DEFAULT_CONFLICT_THRESHOLD);
		assert!(matches!(outcome, AutoSelectOutcome::Conflict { .. }));
	}

	fn preference(path_prefix: &str, priority: i32, sort_order: i32) -> selection_preference::Model {
		selection_preference::Model {
			id: Uuid::new_v4(),
			path_prefix: path_prefix.to_string(),
			priority,
			sort_order,
		}
	}

	#[test]
	fn sort_order_breaks_ties_deterministically() {
		// Two preferences with equal prefix length and priority resolve via
		// `sort_order` rather than the preferences' random `id`s; run twice
		// with the arguments in opposite order to rule out iteration-order
		// dependence creeping back in.
		let a = preference("/root", 10, 0);
		let b = preference("/root", 10, 5);
		assert_eq!(path_priority_score("/root/photo.jpg", &[a.clone(), b.clone()]), 10);
		assert_eq!(path_priority_score("/root/photo.jpg", &[b, a]), 10);
	}

	#[test]
	fn clear_winner_is_picked() {
		let weak = file("/root/photo_a.jpg", None, false);
		let strong = file("/root/deep/nested/very/long/path/photo_b.jpg", Some(6), true);
		let strong_id = strong.id;
		let outcome = auto_select(&[weak, strong], "/root", &[], Utc::now(), DEFAULT_CONFLICT_THRESHOLD);
		match outcome {
			AutoSelectOutcome::Picked { file_id, margin } => {
				assert_eq!(file_id, strong_id);
				assert!(margin >= DEFAULT_CONFLICT_THRESHOLD);
			}
			other => panic!("expected a clear winner, got {other:?}"),
		}
	}
}
