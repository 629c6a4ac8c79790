//! File listing, lookup and aggregate statistics for `GET /files*` (spec
//! §6.1). Kept separate from [`crate::duplicate_engine`] since these are
//! read-mostly queries with no group-lifecycle side effects.

use chrono::{DateTime, Utc};
use sea_orm::{
	ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::indexed_file;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct FileListFilter {
	pub scan_directory_id: Option<Uuid>,
	pub has_duplicates: Option<bool>,
	pub modified_after: Option<DateTime<Utc>>,
	pub modified_before: Option<DateTime<Utc>>,
	/// Case-insensitive substring match against `path`.
	pub search: Option<String>,
	/// `None` means "don't filter on hidden"; `Some(false)` is the UI default.
	pub hidden: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct FilePage {
	pub files: Vec<indexed_file::Model>,
	pub page: u64,
	pub total_pages: u64,
}

pub async fn list_files(
	db: &DatabaseConnection,
	filter: &FileListFilter,
	page: u64,
	page_size: u64,
) -> Result<FilePage> {
	let mut query = indexed_file::Entity::find()
		.filter(indexed_file::Column::IsDeleted.eq(false))
		.order_by_asc(indexed_file::Column::Path);

	if let Some(scan_directory_id) = filter.scan_directory_id {
		query = query.filter(indexed_file::Column::ScanDirectoryId.eq(scan_directory_id));
	}
	if let Some(has_duplicates) = filter.has_duplicates {
		query = query.filter(indexed_file::Column::DuplicateGroupId.is_not_null().eq(has_duplicates));
	}
	if let Some(after) = filter.modified_after {
		query = query.filter(indexed_file::Column::FsModifiedAt.gte(after));
	}
	if let Some(before) = filter.modified_before {
		query = query.filter(indexed_file::Column::FsModifiedAt.lte(before));
	}
	if let Some(hidden) = filter.hidden {
		query = query.filter(indexed_file::Column::Hidden.eq(hidden));
	}
	if let Some(search) = &filter.search {
		query = query.filter(
			Condition::any()
				.add(indexed_file::Column::Path.contains(search))
				.add(indexed_file::Column::Basename.contains(search)),
		);
	}

	let paginator = query.paginate(db, page_size);
	let total_pages = paginator.num_pages().await?;
	let files = paginator.fetch_page(page).await?;
	Ok(FilePage { files, page, total_pages })
}

pub async fn get_file(db: &DatabaseConnection, file_id: Uuid) -> Result<indexed_file::Model> {
	indexed_file::Entity::find_by_id(file_id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("indexed file {file_id}")))
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FileStats {
	pub total_files: u64,
	pub total_size_bytes: i64,
	pub hidden_files: u64,
	pub files_with_errors: u64,
	pub duplicate_groups: u64,
}

pub async fn stats(db: &DatabaseConnection) -> Result<FileStats> {
	use crate::entities::duplicate_group;
	use sea_orm::sea_query::{Expr, Func};
	use sea_orm::{FromQueryResult, QuerySelect};

	#[derive(FromQueryResult)]
	struct Totals {
		total_files: i64,
		total_size_bytes: Option<i64>,
		hidden_files: i64,
		files_with_errors: i64,
	}

	let totals = indexed_file::Entity::find()
		.filter(indexed_file::Column::IsDeleted.eq(false))
		.select_only()
		.column_as(Expr::col(indexed_file::Column::Id).count(), "total_files")
		.column_as(Func::sum(Expr::col(indexed_file::Column::SizeBytes)), "total_size_bytes")
		.column_as(
			Expr::col(indexed_file::Column::Hidden).eq(true).count(),
			"hidden_files",
		)
		.column_as(
			Expr::col(indexed_file::Column::MetadataError)
				.is_not_null()
				.count(),
			"files_with_errors",
		)
		.into_model::<Totals>()
		.one(db)
		.await?
		.unwrap_or(Totals { total_files: 0, total_size_bytes: None, hidden_files: 0, files_with_errors: 0 });

	let duplicate_groups = duplicate_group::Entity::find().count(db).await?;

	Ok(FileStats {
		total_files: totals.total_files.max(0) as u64,
		total_size_bytes: totals.total_size_bytes.unwrap_or(0),
		hidden_files: totals.hidden_files.max(0) as u64,
		files_with_errors: totals.files_with_errors.max(0) as u64,
		duplicate_groups,
	})
}

/// What `POST /files/reprocess` selects for re-submission (spec §4.3
/// `reprocess`, scenario 6).
#[derive(Debug, Clone)]
pub enum ReprocessFilter {
	MissingThumbnail,
	MissingMetadata,
	Failed,
	FileIds(Vec<Uuid>),
}

pub async fn files_for_reprocess(
	db: &DatabaseConnection,
	filter: &ReprocessFilter,
) -> Result<Vec<indexed_file::Model>> {
	let base = indexed_file::Entity::find().filter(indexed_file::Column::IsDeleted.eq(false));

	let files = match filter {
		ReprocessFilter::MissingThumbnail => {
			base.filter(indexed_file::Column::ThumbnailObjectKey.is_null()).all(db).await?
		}
		ReprocessFilter::MissingMetadata => {
			base.filter(indexed_file::Column::CaptureTime.is_null()).all(db).await?
		}
		ReprocessFilter::Failed => base
			.filter(
				Condition::any()
					.add(indexed_file::Column::MetadataError.is_not_null())
					.add(indexed_file::Column::ThumbnailError.is_not_null()),
			)
			.all(db)
			.await?,
		ReprocessFilter::FileIds(ids) => {
			base.filter(indexed_file::Column::Id.is_in(ids.clone())).all(db).await?
		}
	};
	Ok(files)
}
