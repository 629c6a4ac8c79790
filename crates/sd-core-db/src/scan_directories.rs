//! CRUD for `ScanDirectory` (spec §3, §6.1 `/scan-directories*`). Mutated
//! only by the ingestion service, per §3's invariant — there is no worker
//! write path to this table.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::scan_directory;
use crate::error::{Error, Result};

pub async fn list(db: &DatabaseConnection) -> Result<Vec<scan_directory::Model>> {
	Ok(scan_directory::Entity::find().all(db).await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<scan_directory::Model> {
	scan_directory::Entity::find_by_id(id)
		.one(db)
		.await?
		.ok_or_else(|| Error::NotFound(format!("scan directory {id}")))
}

/// `path` must be absolute (spec §6.1 `POST /scan-directories` 400) and
/// unique (409 on conflict).
pub async fn create(db: &DatabaseConnection, path: String, enabled: bool) -> Result<scan_directory::Model> {
	if !path.starts_with('/') {
		return Err(Error::Validation(format!("scan directory path '{path}' must be absolute")));
	}
	if scan_directory::Entity::find()
		.filter(scan_directory::Column::Path.eq(path.clone()))
		.one(db)
		.await?
		.is_some()
	{
		return Err(Error::Conflict(format!("scan directory '{path}' already exists")));
	}

	let model = scan_directory::ActiveModel {
		id: Set(Uuid::new_v4()),
		path: Set(path),
		enabled: Set(enabled),
		last_scanned_at: Set(None),
		file_count: Set(0),
		created_at: Set(Utc::now()),
	};
	Ok(model.insert(db).await?)
}

pub async fn update(
	db: &DatabaseConnection,
	id: Uuid,
	enabled: Option<bool>,
) -> Result<scan_directory::Model> {
	let row = get(db, id).await?;
	let mut active: scan_directory::ActiveModel = row.into();
	if let Some(enabled) = enabled {
		active.enabled = Set(enabled);
	}
	Ok(active.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<()> {
	get(db, id).await?;
	scan_directory::Entity::delete_by_id(id).exec(db).await?;
	Ok(())
}

pub async fn mark_last_scanned(db: &DatabaseConnection, id: Uuid) -> Result<()> {
	let row = get(db, id).await?;
	let mut active: scan_directory::ActiveModel = row.into();
	active.last_scanned_at = Set(Some(Utc::now()));
	active.update(db).await?;
	Ok(())
}

/// Denormalized `file_count` maintenance, called after a batch ingest
/// commits (spec §3 `ScanDirectory.file_count`).
pub async fn recount_files(db: &DatabaseConnection, id: Uuid) -> Result<()> {
	use crate::entities::indexed_file;
	use sea_orm::PaginatorTrait;

	let count = indexed_file::Entity::find()
		.filter(indexed_file::Column::ScanDirectoryId.eq(id))
		.filter(indexed_file::Column::IsDeleted.eq(false))
		.count(db)
		.await?;

	let row = get(db, id).await?;
	let mut active: scan_directory::ActiveModel = row.into();
	active.file_count = Set(count as i64);
	active.update(db).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn path_must_be_absolute() {
		let db = crate::test_support::in_memory_db().await;
		let err = create(&db, "relative/path".to_string(), true).await.unwrap_err();
		assert!(matches!(err, Error::Validation(_)));
	}

	#[tokio::test]
	async fn duplicate_path_conflicts() {
		let db = crate::test_support::in_memory_db().await;
		create(&db, "/r".to_string(), true).await.unwrap();
		let err = create(&db, "/r".to_string(), true).await.unwrap_err();
		assert!(matches!(err, Error::Conflict(_)));
	}
}
