//! A set of `IndexedFile`s sharing content identity (spec §3
//! `DuplicateGroup`, §4.5 state machine).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::enums::DuplicateGroupStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "duplicate_groups")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	#[sea_orm(unique)]
	pub file_hash: String,
	pub file_count: i32,
	pub total_size_bytes: i64,
	pub status: DuplicateGroupStatus,
	pub original_file_id: Option<Uuid>,
	/// Score gap between the top two candidates at the time `original_file_id`
	/// was last set by auto-selection; `None` once an operator has validated
	/// or manually overridden the pick.
	pub auto_select_margin: Option<i32>,
	pub review_session_id: Option<Uuid>,
	/// Review ordering integer (spec §3 `DuplicateGroup`: "review ordering
	/// integer") — the order a selection session walks pending groups in,
	/// distinct from `created_at` so operators can reorder the queue
	/// independently of discovery order. Assigned sequentially at group
	/// creation.
	pub review_order: i32,
	pub created_at: DateTime<Utc>,
	pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::indexed_file::Entity")]
	IndexedFile,
	#[sea_orm(
		belongs_to = "super::selection_session::Entity",
		from = "Column::ReviewSessionId",
		to = "super::selection_session::Column::Id"
	)]
	SelectionSession,
}

impl Related<super::indexed_file::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::IndexedFile.def()
	}
}

impl Related<super::selection_session::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::SelectionSession.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
