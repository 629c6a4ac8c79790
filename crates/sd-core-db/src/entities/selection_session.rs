//! The single active manual-review session (spec §4.4.5). At most one row
//! may have `status = active` at a time; enforced in
//! `crate::review_session`, not by a database constraint, since SQLite has
//! no partial-unique-index support portable to Postgres without a migration
//! fork.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::enums::SelectionSessionStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "selection_sessions")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	pub status: SelectionSessionStatus,
	pub created_at: DateTime<Utc>,
	pub resumed_at: Option<DateTime<Utc>>,
	pub completed_at: Option<DateTime<Utc>>,
	pub proposed_count: i32,
	pub validated_count: i32,
	pub skipped_count: i32,
	pub current_group_id: Option<Uuid>,
	pub last_activity_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::duplicate_group::Entity")]
	DuplicateGroup,
}

impl Related<super::duplicate_group::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::DuplicateGroup.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
