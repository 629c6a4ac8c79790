//! A batch deletion/archival job dispatched to the archive worker
//! (spec §3 `CleanerJob`, §4.7).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::enums::{CleanerJobCategory, CleanerJobStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cleaner_jobs")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	pub status: CleanerJobStatus,
	pub category: CleanerJobCategory,
	pub dry_run: bool,
	pub total_count: i32,
	pub succeeded_count: i32,
	pub failed_count: i32,
	pub skipped_count: i32,
	/// The group this job was raised from, if it was a single-group
	/// `queueForDeletion` rather than a bulk `autoSelectAll` sweep.
	pub source_group_id: Option<Uuid>,
	pub created_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::cleaner_job_file::Entity")]
	CleanerJobFile,
}

impl Related<super::cleaner_job_file::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::CleanerJobFile.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
