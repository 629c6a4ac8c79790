//! A single indexed file (spec §3 `IndexedFile`): one row per
//! `(scan_directory, path)`. Content identity (`file_hash` + `size_bytes`),
//! extracted media metadata, hidden/deletion status, and duplicate-group
//! linkage all live here rather than being split across join tables — this
//! mirrors the teacher's `file_path` model in `core/crates/shared-types`,
//! which also keeps cas_id, size, and per-path metadata on one row.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::enums::HiddenCategory;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "indexed_files")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,

	pub scan_directory_id: Uuid,
	#[sea_orm(column_type = "Text")]
	pub path: String,
	pub basename: String,
	pub extension: Option<String>,

	/// Full-file content hash (blake3), together with `size_bytes` the
	/// identity of the physical content (spec §3 invariant).
	pub file_hash: String,
	pub size_bytes: i64,

	pub fs_created_at: DateTime<Utc>,
	pub fs_modified_at: DateTime<Utc>,
	pub indexed_at: DateTime<Utc>,

	// Media metadata (populated by the metadata worker; all absent until
	// `MetadataExtracted` is processed).
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub capture_time: Option<DateTime<Utc>>,
	pub camera_make: Option<String>,
	pub camera_model: Option<String>,
	pub gps_latitude: Option<f64>,
	pub gps_longitude: Option<f64>,
	pub iso: Option<i32>,
	pub aperture: Option<String>,
	pub shutter_speed: Option<String>,
	pub orientation: Option<i16>,
	pub metadata_error: Option<String>,

	// Thumbnail (populated by the thumbnail worker).
	pub thumbnail_object_key: Option<String>,
	pub thumbnail_error: Option<String>,

	pub retry_count: i32,

	// Duplicate-group linkage.
	pub duplicate_group_id: Option<Uuid>,
	pub is_original: bool,

	// Hidden status (spec §4.4.4 exclusion rules).
	pub hidden: bool,
	pub hidden_category: Option<HiddenCategory>,
	pub hidden_rule_id: Option<Uuid>,

	// Deletion / archive status (spec §4.7).
	pub is_deleted: bool,
	pub archive_path: Option<String>,
	pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::scan_directory::Entity",
		from = "Column::ScanDirectoryId",
		to = "super::scan_directory::Column::Id"
	)]
	ScanDirectory,
	#[sea_orm(
		belongs_to = "super::duplicate_group::Entity",
		from = "Column::DuplicateGroupId",
		to = "super::duplicate_group::Column::Id"
	)]
	DuplicateGroup,
}

impl Related<super::scan_directory::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::ScanDirectory.def()
	}
}

impl Related<super::duplicate_group::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::DuplicateGroup.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
