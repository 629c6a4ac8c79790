//! Operator-configured path priority used by the auto-select scoring
//! algorithm (spec §4.4.4 step 1).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "selection_preferences")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,
	/// Path prefix this preference matches against, e.g. `/photos/originals`.
	pub path_prefix: String,
	/// Higher wins; preferences are evaluated longest-prefix-match first,
	/// then by this field.
	pub priority: i32,
	/// Tie-break when prefix length and priority are both equal (spec §3
	/// `SelectionPreference`: "sort order (tie-break)"). Operator-controlled,
	/// lower wins.
	pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
