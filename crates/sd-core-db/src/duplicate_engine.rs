//! Batch ingestion, duplicate-group linkage, and the group lifecycle
//! (spec §4.4.1, §4.4.4, §4.5). Grounded in the teacher's
//! `sd-core-location-scan`'s scan-then-upsert shape, generalized from a
//! single walk's file-path table to the distributed batch/event model this
//! spec describes.

use chrono::{DateTime, Utc};
use sea_orm::{
	sea_query::OnConflict, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
	EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
	cleaner_job, cleaner_job_file, duplicate_group, enums::HiddenCategory, hidden_folder,
	hidden_size_rule, indexed_file, selection_preference, CleanerJobCategory, CleanerJobFileStatus,
	CleanerJobStatus, DuplicateGroupStatus,
};
use crate::error::{Error, Result};
use crate::scoring::{self, AutoSelectOutcome};

/// A single file descriptor submitted by the discovery worker in a batch
/// (spec §4.3, §4.4.1). The hash is computed by the worker before upload.
#[derive(Debug, Clone)]
pub struct IngestDescriptor {
	pub path: String,
	pub basename: String,
	pub extension: Option<String>,
	pub file_hash: String,
	pub size_bytes: i64,
	pub fs_created_at: DateTime<Utc>,
	pub fs_modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
	Created,
	Updated,
	Unchanged,
}

#[derive(Debug, Clone)]
pub struct IngestRowResult {
	pub path: String,
	pub file_id: Uuid,
	pub outcome: IngestOutcome,
	/// Set when this file's ingest should raise a `FileDiscovered` event —
	/// new rows, or rows whose hash changed (spec §4.4.1 step (c)).
	pub should_publish: bool,
	pub file_hash: String,
	pub size_bytes: i64,
}

#[derive(Debug, Default)]
pub struct BatchIngestResult {
	pub rows: Vec<IngestRowResult>,
	pub created: u32,
	pub updated: u32,
	pub unchanged: u32,
	pub failed: u32,
}

/// Ingests one batch under a single serializable transaction per
/// descriptor (spec §4.4.1): the event publish is left to the caller, who
/// must defer it until after this function returns successfully so no
/// consumer observes an uncommitted row.
pub async fn ingest_batch(
	db: &DatabaseConnection,
	scan_directory_id: Uuid,
	descriptors: Vec<IngestDescriptor>,
	now: DateTime<Utc>,
) -> Result<BatchIngestResult> {
	let mut result = BatchIngestResult::default();

	for descriptor in descriptors {
		let txn = db.begin_with_config(Some(sea_orm::IsolationLevel::Serializable), None).await?;

		let existing = indexed_file::Entity::find()
			.filter(indexed_file::Column::ScanDirectoryId.eq(scan_directory_id))
			.filter(indexed_file::Column::Path.eq(descriptor.path.clone()))
			.one(&txn)
			.await?;

		let (file_id, outcome, hash_changed, old_hash) = match &existing {
			None => (Uuid::new_v4(), IngestOutcome::Created, true, None),
			Some(row) => {
				let changed = row.file_hash != descriptor.file_hash;
				(
					row.id,
					if changed { IngestOutcome::Updated } else { IngestOutcome::Unchanged },
					changed,
					Some(row.file_hash.clone()),
				)
			}
		};

		let model = indexed_file::ActiveModel {
			id: Set(file_id),
			scan_directory_id: Set(scan_directory_id),
			path: Set(descriptor.path.clone()),
			basename: Set(descriptor.basename.clone()),
			extension: Set(descriptor.extension.clone()),
			file_hash: Set(descriptor.file_hash.clone()),
			size_bytes: Set(descriptor.size_bytes),
			fs_created_at: Set(descriptor.fs_created_at),
			fs_modified_at: Set(descriptor.fs_modified_at),
			indexed_at: Set(now),
			retry_count: Set(0),
			is_original: Set(existing.as_ref().map(|r| r.is_original).unwrap_or(false)),
			is_deleted: Set(false),
			..Default::default()
		};

		indexed_file::Entity::insert(model)
			.on_conflict(
				OnConflict::column(indexed_file::Column::Id)
					.update_columns([
						indexed_file::Column::FileHash,
						indexed_file::Column::SizeBytes,
						indexed_file::Column::FsCreatedAt,
						indexed_file::Column::FsModifiedAt,
						indexed_file::Column::IndexedAt,
						indexed_file::Column::Basename,
						indexed_file::Column::Extension,
					])
					.to_owned(),
			)
			.exec(&txn)
			.await?;

		if existing.is_none() {
			if let Some((category, rule_id)) =
				matching_hidden_rule(&txn, &descriptor.path, descriptor.size_bytes).await?
			{
				let mut active: indexed_file::ActiveModel = indexed_file::ActiveModel {
					id: Set(file_id),
					..Default::default()
				};
				active.hidden = Set(true);
				active.hidden_category = Set(Some(category));
				active.hidden_rule_id = Set(Some(rule_id));
				active.update(&txn).await?;
			}
		}

		if hash_changed {
			if let Some(previous_hash) = &old_hash {
				resync_group_for_hash(&txn, previous_hash).await?;
			}
			resync_group_for_hash(&txn, &descriptor.file_hash).await?;
		}

		txn.commit().await?;

		match outcome {
			IngestOutcome::Created => result.created += 1,
			IngestOutcome::Updated => result.updated += 1,
			IngestOutcome::Unchanged => result.unchanged += 1,
		}
		result.rows.push(IngestRowResult {
			path: descriptor.path,
			file_id,
			outcome,
			should_publish: hash_changed,
			file_hash: descriptor.file_hash,
			size_bytes: descriptor.size_bytes,
		});
	}

	Ok(result)
}

/// Checks a newly ingested file's path and size against the operator's
/// hidden-folder / hidden-size rules (spec §3 `HiddenFolder`/`HiddenSizeRule`).
/// Folder rules are checked first; the first matching prefix wins.
async fn matching_hidden_rule(
	txn: &sea_orm::DatabaseTransaction,
	path: &str,
	size_bytes: i64,
) -> Result<Option<(HiddenCategory, Uuid)>> {
	let folders = hidden_folder::Entity::find().all(txn).await?;
	if let Some(folder) = folders.iter().find(|f| path.starts_with(f.path_prefix.as_str())) {
		return Ok(Some((HiddenCategory::Folder, folder.id)));
	}

	let size_rules = hidden_size_rule::Entity::find().all(txn).await?;
	if let Some(rule) = size_rules.iter().find(|r| size_bytes <= r.max_size_bytes) {
		return Ok(Some((HiddenCategory::Size, rule.id)));
	}

	Ok(None)
}

/// Recomputes the duplicate-group row for `hash`: creates it if two or
/// more live, non-hidden files now share it; updates counters if it
/// already exists; tears it down (and unlinks members) if the live count
/// has fallen below two.
pub(crate) async fn resync_group_for_hash(
	txn: &sea_orm::DatabaseTransaction,
	hash: &str,
) -> Result<()> {
	let live_members = indexed_file::Entity::find()
		.filter(indexed_file::Column::FileHash.eq(hash))
		.filter(indexed_file::Column::IsDeleted.eq(false))
		.filter(indexed_file::Column::Hidden.eq(false))
		.all(txn)
		.await?;

	let existing_group = duplicate_group::Entity::find()
		.filter(duplicate_group::Column::FileHash.eq(hash))
		.one(txn)
		.await?;

	if live_members.len() < 2 {
		if let Some(group) = existing_group {
			unlink_group_members(txn, group.id).await?;
			duplicate_group::Entity::delete_by_id(group.id).exec(txn).await?;
		}
		return Ok(());
	}

	let total_size: i64 = live_members.iter().map(|f| f.size_bytes).sum();
	let file_count = i32::try_from(live_members.len()).unwrap_or(i32::MAX);

	let group_id = match existing_group {
		Some(group) => {
			// A previously `cleaned` group that sees a new duplicate
			// reopens to `pending` (spec §4.5).
			let status = if group.status == DuplicateGroupStatus::Cleaned {
				DuplicateGroupStatus::Pending
			} else {
				group.status
			};
			let mut active: duplicate_group::ActiveModel = group.clone().into();
			active.file_count = Set(file_count);
			active.total_size_bytes = Set(total_size);
			active.status = Set(status);
			active.update(txn).await?;
			group.id
		}
		None => {
			let id = Uuid::new_v4();
			let review_order = duplicate_group::Entity::find().count(txn).await?;
			let model = duplicate_group::ActiveModel {
				id: Set(id),
				file_hash: Set(hash.to_string()),
				file_count: Set(file_count),
				total_size_bytes: Set(total_size),
				status: Set(DuplicateGroupStatus::Pending),
				original_file_id: Set(None),
				auto_select_margin: Set(None),
				review_session_id: Set(None),
				review_order: Set(i32::try_from(review_order).unwrap_or(i32::MAX)),
				created_at: Set(Utc::now()),
				resolved_at: Set(None),
			};
			model.insert(txn).await?;
			id
		}
	};

	for member in live_members {
		if member.duplicate_group_id != Some(group_id) {
			let mut active: indexed_file::ActiveModel = member.into();
			active.duplicate_group_id = Set(Some(group_id));
			active.update(txn).await?;
		}
	}

	Ok(())
}

async fn unlink_group_members(txn: &sea_orm::DatabaseTransaction, group_id: Uuid) -> Result<()> {
	let members = indexed_file::Entity::find()
		.filter(indexed_file::Column::DuplicateGroupId.eq(group_id))
		.all(txn)
		.await?;
	for member in members {
		let mut active: indexed_file::ActiveModel = member.into();
		active.duplicate_group_id = Set(None);
		active.is_original = Set(false);
		active.update(txn).await?;
	}
	Ok(())
}

/// Applies a `MetadataExtracted` completion event; idempotent over
/// redelivery since it is a set of named columns keyed by `file_id`
/// (spec §4.4.3).
pub async fn apply_metadata_extracted(
	db: &DatabaseConnection,
	file_id: Uuid,
	success: bool,
	error_message: Option<String>,
	width: Option<i32>,
	height: Option<i32>,
	capture_time: Option<DateTime<Utc>>,
	camera_make: Option<String>,
	camera_model: Option<String>,
	gps_latitude: Option<f64>,
	gps_longitude: Option<f64>,
	iso: Option<i32>,
	aperture: Option<String>,
	shutter_speed: Option<String>,
	orientation: Option<i16>,
) -> Result<()> {
	let row = indexed_file::Entity::find_by_id(file_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("indexed file {file_id}")))?;
	let mut active: indexed_file::ActiveModel = row.into();

	if success {
		active.width = Set(width);
		active.height = Set(height);
		active.capture_time = Set(capture_time);
		active.camera_make = Set(camera_make);
		active.camera_model = Set(camera_model);
		active.gps_latitude = Set(gps_latitude);
		active.gps_longitude = Set(gps_longitude);
		active.iso = Set(iso);
		active.aperture = Set(aperture);
		active.shutter_speed = Set(shutter_speed);
		active.orientation = Set(orientation);
		active.metadata_error = Set(None);
	} else {
		active.metadata_error = Set(error_message);
		active.retry_count = Set(active.retry_count.clone().unwrap() + 1);
	}

	active.update(db).await?;
	Ok(())
}

/// Applies a `ThumbnailGenerated` completion event. The object key is
/// deterministic per hash, so redelivery overwrites identically
/// (spec §4.4.3, §4.6).
pub async fn apply_thumbnail_generated(
	db: &DatabaseConnection,
	file_id: Uuid,
	success: bool,
	error_message: Option<String>,
	thumbnail_object_key: Option<String>,
) -> Result<()> {
	let row = indexed_file::Entity::find_by_id(file_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("indexed file {file_id}")))?;
	let mut active: indexed_file::ActiveModel = row.into();

	if success {
		active.thumbnail_object_key = Set(thumbnail_object_key);
		active.thumbnail_error = Set(None);
	} else {
		active.thumbnail_error = Set(error_message);
		active.retry_count = Set(active.retry_count.clone().unwrap() + 1);
	}

	active.update(db).await?;
	Ok(())
}

/// Applies a successful, non-dry-run archive completion (spec §3 lifecycle:
/// "moves to `archived` only via a completed CleanerJobFile in non-dry-run
/// mode"): flips the file's `is_deleted`/`archive_path`/`archived_at` and
/// resyncs its group so `fileCount`/`totalSize` drop the now-archived file
/// (spec §8 invariant 3). Idempotent over redelivery — the second
/// application just overwrites the same three columns and resyncs again.
pub async fn apply_archive_result(
	db: &DatabaseConnection,
	file_id: Uuid,
	archive_path: String,
	archived_at: DateTime<Utc>,
) -> Result<()> {
	let row = indexed_file::Entity::find_by_id(file_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("indexed file {file_id}")))?;
	let hash = row.file_hash.clone();

	let mut active: indexed_file::ActiveModel = row.into();
	active.is_deleted = Set(true);
	active.archive_path = Set(Some(archive_path));
	active.archived_at = Set(Some(archived_at));
	active.update(db).await?;

	let txn = db.begin().await?;
	resync_group_for_hash(&txn, &hash).await?;
	txn.commit().await?;
	Ok(())
}

#[derive(Debug, Clone)]
pub struct GroupPage {
	pub groups: Vec<duplicate_group::Model>,
	pub page: u64,
	pub total_pages: u64,
}

/// `listGroups(page, filter)`. `filter` matches against the group's hash
/// prefix; pass `None` for no filter.
pub async fn list_groups(
	db: &DatabaseConnection,
	page: u64,
	page_size: u64,
	filter: Option<&str>,
) -> Result<GroupPage> {
	let mut query = duplicate_group::Entity::find().order_by_asc(duplicate_group::Column::CreatedAt);
	if let Some(prefix) = filter {
		query = query.filter(duplicate_group::Column::FileHash.starts_with(prefix));
	}
	let paginator = query.paginate(db, page_size);
	let total_pages = paginator.num_pages().await?;
	let groups = paginator.fetch_page(page).await?;
	Ok(GroupPage { groups, page, total_pages })
}

/// `getGroup(id)` — the group with its live members sorted by path
/// ascending (spec §4.4.4).
pub async fn get_group(
	db: &DatabaseConnection,
	group_id: Uuid,
) -> Result<(duplicate_group::Model, Vec<indexed_file::Model>)> {
	let group = duplicate_group::Entity::find_by_id(group_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("duplicate group {group_id}")))?;
	let members = indexed_file::Entity::find()
		.filter(indexed_file::Column::DuplicateGroupId.eq(group_id))
		.filter(indexed_file::Column::IsDeleted.eq(false))
		.order_by_asc(indexed_file::Column::Path)
		.all(db)
		.await?;
	Ok((group, members))
}

/// `setOriginal(groupId, fileId)` (spec §4.4.4, §4.5): marks `fileId`
/// original, clears the flag on siblings, transitions the group to
/// `validated`.
pub async fn set_original(db: &DatabaseConnection, group_id: Uuid, file_id: Uuid) -> Result<()> {
	let group = duplicate_group::Entity::find_by_id(group_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("duplicate group {group_id}")))?;

	let members = indexed_file::Entity::find()
		.filter(indexed_file::Column::DuplicateGroupId.eq(group_id))
		.all(db)
		.await?;

	if !members.iter().any(|m| m.id == file_id) {
		return Err(Error::Validation(format!(
			"file {file_id} is not a member of group {group_id}"
		)));
	}

	for member in members {
		let is_original = member.id == file_id;
		if member.is_original != is_original {
			let mut active: indexed_file::ActiveModel = member.into();
			active.is_original = Set(is_original);
			active.update(db).await?;
		}
	}

	let mut active: duplicate_group::ActiveModel = group.into();
	active.status = Set(DuplicateGroupStatus::Validated);
	active.original_file_id = Set(Some(file_id));
	active.auto_select_margin = Set(None);
	active.resolved_at = Set(Some(Utc::now()));
	active.update(db).await?;

	Ok(())
}

/// `autoSelectOriginal(groupId, rules)` (spec §4.4.4): scores every live
/// member, tentatively picks the best, or leaves the group `pending` with
/// a conflict marker if the top two scores are too close.
pub async fn auto_select_original(
	db: &DatabaseConnection,
	group_id: Uuid,
	scan_root: &str,
	conflict_threshold: i32,
) -> Result<AutoSelectOutcome> {
	let (group, members) = get_group(db, group_id).await?;
	let preferences = selection_preference::Entity::find().all(db).await?;
	let now = Utc::now();

	let outcome = scoring::auto_select(&members, scan_root, &preferences, now, conflict_threshold);

	match outcome {
		AutoSelectOutcome::Picked { file_id, margin } => {
			let mut active: duplicate_group::ActiveModel = group.into();
			active.status = Set(DuplicateGroupStatus::AutoSelected);
			active.original_file_id = Set(Some(file_id));
			active.auto_select_margin = Set(Some(margin));
			active.update(db).await?;
		}
		AutoSelectOutcome::Conflict { .. } | AutoSelectOutcome::NoMembers => {
			// Leave the group `pending`; nothing to persist.
		}
	}

	Ok(outcome)
}

#[derive(Debug, Default)]
pub struct AutoSelectAllCounters {
	pub picked: u32,
	pub conflicts: u32,
	pub skipped_empty: u32,
}

/// `autoSelectAll(rules)`: runs `autoSelectOriginal` over every
/// unresolved (`pending`) group, each scored against its own first live
/// member's scan directory since groups can span more than one.
pub async fn auto_select_all(
	db: &DatabaseConnection,
	conflict_threshold: i32,
) -> Result<AutoSelectAllCounters> {
	use crate::entities::scan_directory;

	let pending_groups = duplicate_group::Entity::find()
		.filter(duplicate_group::Column::Status.eq(DuplicateGroupStatus::Pending))
		.all(db)
		.await?;

	let mut counters = AutoSelectAllCounters::default();
	for group in pending_groups {
		let members = indexed_file::Entity::find()
			.filter(indexed_file::Column::DuplicateGroupId.eq(group.id))
			.filter(indexed_file::Column::IsDeleted.eq(false))
			.all(db)
			.await?;
		let Some(first) = members.first() else {
			counters.skipped_empty += 1;
			continue;
		};
		let scan_root = scan_directory::Entity::find_by_id(first.scan_directory_id)
			.one(db)
			.await?
			.map(|d| d.path)
			.unwrap_or_default();

		match auto_select_original(db, group.id, &scan_root, conflict_threshold).await? {
			AutoSelectOutcome::Picked { .. } => counters.picked += 1,
			AutoSelectOutcome::Conflict { .. } => counters.conflicts += 1,
			AutoSelectOutcome::NoMembers => counters.skipped_empty += 1,
		}
	}
	Ok(counters)
}

/// `queueForDeletion(groupId)` (spec §4.4.4, §4.5): the group must be
/// `validated`; creates a pending `CleanerJob` with one file-row per
/// live member except the original, and transitions the group to
/// `cleaning`.
pub async fn queue_for_deletion(
	db: &DatabaseConnection,
	group_id: Uuid,
) -> Result<cleaner_job::Model> {
	let (group, members) = get_group(db, group_id).await?;

	if group.status != DuplicateGroupStatus::Validated {
		return Err(Error::Conflict(format!(
			"group {group_id} must be validated before queueing for deletion (is {:?})",
			group.status
		)));
	}
	let Some(original_file_id) = group.original_file_id else {
		return Err(Error::Validation(format!(
			"validated group {group_id} has no original file set"
		)));
	};

	let to_delete: Vec<_> = members.into_iter().filter(|m| m.id != original_file_id).collect();

	let job_id = Uuid::new_v4();
	let job = cleaner_job::ActiveModel {
		id: Set(job_id),
		status: Set(CleanerJobStatus::Pending),
		category: Set(CleanerJobCategory::HashDuplicate),
		// Whether this run is a dry run is decided by the archive worker's own
		// boot-time config (spec §9), not known here at queue time;
		// `complete_cleaner_job` corrects this column once the per-file
		// `was_dry_run` reports are in.
		dry_run: Set(false),
		total_count: Set(i32::try_from(to_delete.len()).unwrap_or(i32::MAX)),
		succeeded_count: Set(0),
		failed_count: Set(0),
		skipped_count: Set(0),
		source_group_id: Set(Some(group_id)),
		created_at: Set(Utc::now()),
		completed_at: Set(None),
	};
	let job = job.insert(db).await?;

	for member in &to_delete {
		let file_row = cleaner_job_file::ActiveModel {
			id: Set(Uuid::new_v4()),
			job_id: Set(job_id),
			file_id: Set(member.id),
			status: Set(CleanerJobFileStatus::Pending),
			archive_path: Set(None),
			error: Set(None),
			was_dry_run: Set(false),
		};
		file_row.insert(db).await?;
	}

	let mut active: duplicate_group::ActiveModel = group.into();
	active.status = Set(DuplicateGroupStatus::Cleaning);
	active.update(db).await?;

	Ok(job)
}

/// Folds the per-file outcomes of a completed `CleanerJob` back onto the
/// job and its originating group (spec §4.5: `cleaning -jobOk-> cleaned`,
/// `cleaning -jobFail-> cleaned` on partial failure is not a valid
/// transition — any failure routes to `cleaningFailed`).
pub async fn complete_cleaner_job(db: &DatabaseConnection, job_id: Uuid) -> Result<()> {
	let job = cleaner_job::Entity::find_by_id(job_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("cleaner job {job_id}")))?;

	let files = cleaner_job_file::Entity::find()
		.filter(cleaner_job_file::Column::JobId.eq(job_id))
		.all(db)
		.await?;

	let succeeded = files.iter().filter(|f| f.status == CleanerJobFileStatus::Deleted).count();
	let failed = files.iter().filter(|f| f.status == CleanerJobFileStatus::Failed).count();
	let skipped = files.iter().filter(|f| f.status == CleanerJobFileStatus::Skipped).count();
	let all_settled = succeeded + failed + skipped == files.len();

	if !all_settled {
		return Err(Error::Conflict(format!("job {job_id} still has files in flight")));
	}

	let job_status = if failed > 0 { CleanerJobStatus::Failed } else { CleanerJobStatus::Completed };
	// A job is a dry run if every settled file reported back as one; mixed
	// dry-run/real results never happen in practice (the archive worker's
	// dry-run knob is boot-time and applies to every command it processes).
	let was_dry_run = !files.is_empty() && files.iter().all(|f| f.was_dry_run);

	let mut active: cleaner_job::ActiveModel = job.clone().into();
	active.status = Set(job_status);
	active.dry_run = Set(was_dry_run);
	active.succeeded_count = Set(i32::try_from(succeeded).unwrap_or(i32::MAX));
	active.failed_count = Set(i32::try_from(failed).unwrap_or(i32::MAX));
	active.skipped_count = Set(i32::try_from(skipped).unwrap_or(i32::MAX));
	active.completed_at = Set(Some(Utc::now()));
	active.update(db).await?;

	if let Some(group_id) = job.source_group_id {
		if let Some(group) = duplicate_group::Entity::find_by_id(group_id).one(db).await? {
			// Spec §8 scenario 5: a dry-run clean reports success on every
			// file but must leave the group `validated`, not `cleaned` —
			// nothing was actually archived.
			let group_status = if failed > 0 {
				DuplicateGroupStatus::CleaningFailed
			} else if was_dry_run {
				DuplicateGroupStatus::Validated
			} else {
				DuplicateGroupStatus::Cleaned
			};
			let mut active: duplicate_group::ActiveModel = group.into();
			active.status = Set(group_status);
			active.update(db).await?;
		}
	}

	Ok(())
}

/// `cleaningFailed -retry-> cleaning` (spec §4.5): re-arms every failed
/// file-row in the job for another attempt and re-opens the group.
pub async fn retry_cleaning(db: &DatabaseConnection, group_id: Uuid) -> Result<()> {
	let group = duplicate_group::Entity::find_by_id(group_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("duplicate group {group_id}")))?;

	if group.status != DuplicateGroupStatus::CleaningFailed {
		return Err(Error::Conflict(format!(
			"group {group_id} is not in cleaningFailed (is {:?})",
			group.status
		)));
	}

	let jobs = cleaner_job::Entity::find()
		.filter(cleaner_job::Column::SourceGroupId.eq(group_id))
		.order_by_desc(cleaner_job::Column::CreatedAt)
		.all(db)
		.await?;
	if let Some(latest) = jobs.into_iter().next() {
		let failed_files = cleaner_job_file::Entity::find()
			.filter(cleaner_job_file::Column::JobId.eq(latest.id))
			.filter(cleaner_job_file::Column::Status.eq(CleanerJobFileStatus::Failed))
			.all(db)
			.await?;
		for file in failed_files {
			let mut active: cleaner_job_file::ActiveModel = file.into();
			active.status = Set(CleanerJobFileStatus::Pending);
			active.error = Set(None);
			active.update(db).await?;
		}
		let mut active: cleaner_job::ActiveModel = latest.into();
		active.status = Set(CleanerJobStatus::Pending);
		active.completed_at = Set(None);
		active.update(db).await?;
	}

	let mut active: duplicate_group::ActiveModel = group.into();
	active.status = Set(DuplicateGroupStatus::Cleaning);
	active.update(db).await?;

	Ok(())
}

/// Marks a file hidden by a folder or size rule, or manually; recomputes
/// its group's live count via [`resync_group_for_hash`] semantics since
/// hidden files don't count toward `fileCount`.
pub async fn set_hidden(
	db: &DatabaseConnection,
	file_id: Uuid,
	hidden: bool,
	category: Option<HiddenCategory>,
	rule_id: Option<Uuid>,
) -> Result<()> {
	let row = indexed_file::Entity::find_by_id(file_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("indexed file {file_id}")))?;
	let hash = row.file_hash.clone();

	let mut active: indexed_file::ActiveModel = row.into();
	active.hidden = Set(hidden);
	active.hidden_category = Set(category);
	active.hidden_rule_id = Set(rule_id);
	active.update(db).await?;

	let txn = db.begin().await?;
	resync_group_for_hash(&txn, &hash).await?;
	txn.commit().await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use sea_orm::ActiveModelTrait;
	use uuid::Uuid;

	async fn seed_scan_directory(db: &DatabaseConnection) -> Uuid {
		use crate::entities::scan_directory;
		let id = Uuid::new_v4();
		scan_directory::ActiveModel {
			id: Set(id),
			path: Set("/root".to_string()),
			enabled: Set(true),
			last_scanned_at: Set(None),
			file_count: Set(0),
			created_at: Set(Utc::now()),
		}
		.insert(db)
		.await
		.unwrap();
		id
	}

	fn descriptor(path: &str, hash: &str) -> IngestDescriptor {
		let now = Utc::now();
		IngestDescriptor {
			path: path.to_string(),
			basename: path.rsplit('/').next().unwrap_or(path).to_string(),
			extension: Some("jpg".to_string()),
			file_hash: hash.to_string(),
			size_bytes: 100,
			fs_created_at: now,
			fs_modified_at: now,
		}
	}

	#[tokio::test]
	async fn single_file_no_duplicate_creates_no_group() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		let result = ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		assert_eq!(result.created, 1);
		assert!(result.rows[0].should_publish);

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		assert!(groups.is_empty());
	}

	#[tokio::test]
	async fn two_files_sharing_a_hash_form_a_group() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();
		ingest_batch(&db, scan_dir, vec![descriptor("/root/b.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		assert_eq!(groups.len(), 1);
		assert_eq!(groups[0].file_count, 2);
		assert_eq!(groups[0].status, DuplicateGroupStatus::Pending);
	}

	#[tokio::test]
	async fn set_original_validates_the_group() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();
		ingest_batch(&db, scan_dir, vec![descriptor("/root/b.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		let group_id = groups[0].id;
		let (_, members) = get_group(&db, group_id).await.unwrap();
		let keeper = members[0].id;

		set_original(&db, group_id, keeper).await.unwrap();

		let (group, members) = get_group(&db, group_id).await.unwrap();
		assert_eq!(group.status, DuplicateGroupStatus::Validated);
		assert_eq!(group.original_file_id, Some(keeper));
		assert!(members.iter().find(|m| m.id == keeper).unwrap().is_original);
	}

	#[tokio::test]
	async fn queue_for_deletion_requires_validated_group() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();
		ingest_batch(&db, scan_dir, vec![descriptor("/root/b.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		let group_id = groups[0].id;

		let err = queue_for_deletion(&db, group_id).await.unwrap_err();
		assert!(matches!(err, Error::Conflict(_)));
	}

	#[tokio::test]
	async fn queue_for_deletion_excludes_the_original() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();
		ingest_batch(&db, scan_dir, vec![descriptor("/root/b.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		let group_id = groups[0].id;
		let (_, members) = get_group(&db, group_id).await.unwrap();
		let keeper = members[0].id;
		set_original(&db, group_id, keeper).await.unwrap();

		let job = queue_for_deletion(&db, group_id).await.unwrap();
		let files = cleaner_job_file::Entity::find()
			.filter(cleaner_job_file::Column::JobId.eq(job.id))
			.all(&db)
			.await
			.unwrap();
		assert_eq!(files.len(), 1);
		assert_ne!(files[0].file_id, keeper);

		let (group, _) = get_group(&db, group_id).await.unwrap();
		assert_eq!(group.status, DuplicateGroupStatus::Cleaning);
	}

	#[tokio::test]
	async fn apply_archive_result_flips_file_and_shrinks_group() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();
		ingest_batch(&db, scan_dir, vec![descriptor("/root/b.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		let group_id = groups[0].id;
		let (_, members) = get_group(&db, group_id).await.unwrap();
		let keeper = members[0].id;
		let archived = members[1].id;
		set_original(&db, group_id, keeper).await.unwrap();

		let archived_at = Utc::now();
		apply_archive_result(&db, archived, "/trash/a/b.jpg".to_string(), archived_at)
			.await
			.unwrap();

		let row = indexed_file::Entity::find_by_id(archived).one(&db).await.unwrap().unwrap();
		assert!(row.is_deleted);
		assert_eq!(row.archive_path, Some("/trash/a/b.jpg".to_string()));
		assert_eq!(row.archived_at, Some(archived_at));

		// Only one live member remains, so the group no longer qualifies as a
		// duplicate and is torn down rather than left at `fileCount` 1.
		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		assert!(groups.is_empty());
	}

	#[tokio::test]
	async fn dry_run_clean_leaves_group_validated_not_cleaned() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();
		ingest_batch(&db, scan_dir, vec![descriptor("/root/b.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		let group_id = groups[0].id;
		let (_, members) = get_group(&db, group_id).await.unwrap();
		let keeper = members[0].id;
		set_original(&db, group_id, keeper).await.unwrap();

		let job = queue_for_deletion(&db, group_id).await.unwrap();
		let files = cleaner_job_file::Entity::find()
			.filter(cleaner_job_file::Column::JobId.eq(job.id))
			.all(&db)
			.await
			.unwrap();
		for file in files {
			let mut active: cleaner_job_file::ActiveModel = file.into();
			active.status = Set(CleanerJobFileStatus::Deleted);
			active.was_dry_run = Set(true);
			active.update(&db).await.unwrap();
		}

		complete_cleaner_job(&db, job.id).await.unwrap();

		let job = cleaner_job::Entity::find_by_id(job.id).one(&db).await.unwrap().unwrap();
		assert!(job.dry_run);
		assert_eq!(job.status, CleanerJobStatus::Completed);

		let (group, _) = get_group(&db, group_id).await.unwrap();
		assert_eq!(group.status, DuplicateGroupStatus::Validated);
	}

	#[tokio::test]
	async fn real_clean_transitions_group_to_cleaned() {
		let db = crate::test_support::in_memory_db().await;
		let scan_dir = seed_scan_directory(&db).await;

		ingest_batch(&db, scan_dir, vec![descriptor("/root/a.jpg", "H1")], Utc::now())
			.await
			.unwrap();
		ingest_batch(&db, scan_dir, vec![descriptor("/root/b.jpg", "H1")], Utc::now())
			.await
			.unwrap();

		let groups = duplicate_group::Entity::find().all(&db).await.unwrap();
		let group_id = groups[0].id;
		let (_, members) = get_group(&db, group_id).await.unwrap();
		let keeper = members[0].id;
		set_original(&db, group_id, keeper).await.unwrap();

		let job = queue_for_deletion(&db, group_id).await.unwrap();
		let files = cleaner_job_file::Entity::find()
			.filter(cleaner_job_file::Column::JobId.eq(job.id))
			.all(&db)
			.await
			.unwrap();
		for file in files {
			let mut active: cleaner_job_file::ActiveModel = file.into();
			active.status = Set(CleanerJobFileStatus::Deleted);
			active.was_dry_run = Set(false);
			active.update(&db).await.unwrap();
		}

		complete_cleaner_job(&db, job.id).await.unwrap();

		let job = cleaner_job::Entity::find_by_id(job.id).one(&db).await.unwrap().unwrap();
		assert!(!job.dry_run);

		let (group, _) = get_group(&db, group_id).await.unwrap();
		assert_eq!(group.status, DuplicateGroupStatus::Cleaned);
	}
}
