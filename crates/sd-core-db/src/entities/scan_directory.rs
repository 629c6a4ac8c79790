//! A root directory the discovery workers scan (spec §3 `ScanDirectory`).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scan_directories")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	#[sea_orm(unique)]
	pub path: String,
	pub enabled: bool,
	pub last_scanned_at: Option<DateTime<Utc>>,
	pub file_count: i64,
	pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::indexed_file::Entity")]
	IndexedFile,
}

impl Related<super::indexed_file::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::IndexedFile.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
