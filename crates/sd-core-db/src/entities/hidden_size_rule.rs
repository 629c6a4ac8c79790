//! An operator-configured size threshold below which files are excluded
//! from duplicate review (spec §4.4.4 exclusion rules) — e.g. hiding
//! thumbnails/icons under 10KB that would otherwise pollute groups.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hidden_size_rules")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	/// Files with `size_bytes <= max_size_bytes` are hidden by this rule.
	pub max_size_bytes: i64,
	pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
