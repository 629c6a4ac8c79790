//! Per-file progress within a `CleanerJob` (spec §3 `CleanerJobFile`).

use sea_orm::entity::prelude::*;

use super::enums::CleanerJobFileStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cleaner_job_files")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	pub job_id: Uuid,
	pub file_id: Uuid,
	pub status: CleanerJobFileStatus,
	pub archive_path: Option<String>,
	pub error: Option<String>,
	/// Mirrors the wire-level `DeleteResult.was_dry_run` reported by the
	/// archive worker; `complete_cleaner_job` reads this to decide whether
	/// the owning group may advance to `cleaned`.
	pub was_dry_run: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::cleaner_job::Entity",
		from = "Column::JobId",
		to = "super::cleaner_job::Column::Id"
	)]
	CleanerJob,
	#[sea_orm(
		belongs_to = "super::indexed_file::Entity",
		from = "Column::FileId",
		to = "super::indexed_file::Column::Id"
	)]
	IndexedFile,
}

impl Related<super::cleaner_job::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::CleanerJob.def()
	}
}

impl Related<super::indexed_file::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::IndexedFile.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
