use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Duplicate-group lifecycle (spec §4.5 — the only valid transitions are
/// enumerated there and enforced in `crate::duplicates::transition`, not by
/// the storage layer itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DuplicateGroupStatus {
	#[sea_orm(string_value = "pending")]
	Pending,
	#[sea_orm(string_value = "auto_selected")]
	AutoSelected,
	#[sea_orm(string_value = "validated")]
	Validated,
	#[sea_orm(string_value = "cleaning")]
	Cleaning,
	#[sea_orm(string_value = "cleaned")]
	Cleaned,
	#[sea_orm(string_value = "cleaning_failed")]
	CleaningFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SelectionSessionStatus {
	#[sea_orm(string_value = "active")]
	Active,
	#[sea_orm(string_value = "paused")]
	Paused,
	#[sea_orm(string_value = "completed")]
	Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CleanerJobStatus {
	#[sea_orm(string_value = "pending")]
	Pending,
	#[sea_orm(string_value = "in_progress")]
	InProgress,
	#[sea_orm(string_value = "completed")]
	Completed,
	#[sea_orm(string_value = "failed")]
	Failed,
	#[sea_orm(string_value = "cancelled")]
	Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CleanerJobCategory {
	#[sea_orm(string_value = "hash_duplicate")]
	HashDuplicate,
	#[sea_orm(string_value = "near_duplicate")]
	NearDuplicate,
	#[sea_orm(string_value = "manual")]
	Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CleanerJobFileStatus {
	#[sea_orm(string_value = "pending")]
	Pending,
	#[sea_orm(string_value = "uploading")]
	Uploading,
	#[sea_orm(string_value = "uploaded")]
	Uploaded,
	#[sea_orm(string_value = "deleting")]
	Deleting,
	#[sea_orm(string_value = "deleted")]
	Deleted,
	#[sea_orm(string_value = "failed")]
	Failed,
	#[sea_orm(string_value = "skipped")]
	Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum HiddenCategory {
	#[sea_orm(string_value = "folder")]
	Folder,
	#[sea_orm(string_value = "size")]
	Size,
	#[sea_orm(string_value = "manual")]
	Manual,
}
