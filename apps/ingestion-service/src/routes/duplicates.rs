//! `/duplicates*` handlers (spec §6.1 rows 13-18, §4.4.4).

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use chrono::{DateTime, Utc};
use sd_core_db::{duplicate_engine, entities::DuplicateGroupStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::routes::files::FileDto;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DuplicateGroupDto {
	pub id: Uuid,
	pub file_hash: String,
	pub file_count: i32,
	pub total_size_bytes: i64,
	pub status: DuplicateGroupStatus,
	pub original_file_id: Option<Uuid>,
	pub auto_select_margin: Option<i32>,
	pub created_at: DateTime<Utc>,
	pub resolved_at: Option<DateTime<Utc>>,
}

impl From<sd_core_db::entities::duplicate_group::Model> for DuplicateGroupDto {
	fn from(m: sd_core_db::entities::duplicate_group::Model) -> Self {
		Self {
			id: m.id,
			file_hash: m.file_hash,
			file_count: m.file_count,
			total_size_bytes: m.total_size_bytes,
			status: m.status,
			original_file_id: m.original_file_id,
			auto_select_margin: m.auto_select_margin,
			created_at: m.created_at,
			resolved_at: m.resolved_at,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
	pub filter: Option<String>,
	pub page: Option<u64>,
	pub page_size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct GroupPageDto {
	pub groups: Vec<DuplicateGroupDto>,
	pub page: u64,
	pub total_pages: u64,
}

pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<GroupPageDto>> {
	let page = duplicate_engine::list_groups(
		&state.db,
		q.page.unwrap_or(0),
		q.page_size.unwrap_or(50),
		q.filter.as_deref(),
	)
	.await?;
	Ok(Json(GroupPageDto {
		groups: page.groups.into_iter().map(DuplicateGroupDto::from).collect(),
		page: page.page,
		total_pages: page.total_pages,
	}))
}

#[derive(Debug, Serialize)]
pub struct GroupWithFilesDto {
	#[serde(flatten)]
	pub group: DuplicateGroupDto,
	pub files: Vec<FileDto>,
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<GroupWithFilesDto>> {
	let (group, members) = duplicate_engine::get_group(&state.db, id).await?;
	Ok(Json(GroupWithFilesDto {
		group: DuplicateGroupDto::from(group),
		files: members.into_iter().map(FileDto::from).collect(),
	}))
}

#[derive(Debug, Deserialize)]
pub struct SetOriginalBody {
	pub file_id: Uuid,
}

pub async fn set_original(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
	Json(body): Json<SetOriginalBody>,
) -> ApiResult<StatusCode> {
	duplicate_engine::set_original(&state.db, id, body.file_id).await?;
	Ok(StatusCode::OK)
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum AutoSelectResponse {
	Picked { file_id: Uuid, margin: i32 },
	Conflict { top_score: i32, margin: i32 },
	NoMembers,
}

/// `POST /duplicates/{id}/auto-select`: 409 when the top two scores are
/// too close to call (spec §4.4.4); the caller must resolve manually.
pub async fn auto_select(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<AutoSelectResponse>)> {
	let scan_root = root_for_group(&state, id).await?;
	let outcome = duplicate_engine::auto_select_original(
		&state.db,
		id,
		&scan_root,
		state.config.duplicate_engine.conflict_threshold,
	)
	.await?;

	let (status, body) = match outcome {
		sd_core_db::scoring::AutoSelectOutcome::Picked { file_id, margin } => {
			(StatusCode::OK, AutoSelectResponse::Picked { file_id, margin })
		}
		sd_core_db::scoring::AutoSelectOutcome::Conflict { top_score, margin } => {
			(StatusCode::CONFLICT, AutoSelectResponse::Conflict { top_score, margin })
		}
		sd_core_db::scoring::AutoSelectOutcome::NoMembers => {
			(StatusCode::OK, AutoSelectResponse::NoMembers)
		}
	};
	Ok((status, Json(body)))
}

#[derive(Debug, Serialize)]
pub struct AutoSelectAllResponse {
	pub picked: u32,
	pub conflicts: u32,
	pub skipped_empty: u32,
}

pub async fn auto_select_all(State(state): State<AppState>) -> ApiResult<Json<AutoSelectAllResponse>> {
	let counters = duplicate_engine::auto_select_all(
		&state.db,
		state.config.duplicate_engine.conflict_threshold,
	)
	.await?;
	Ok(Json(AutoSelectAllResponse {
		picked: counters.picked,
		conflicts: counters.conflicts,
		skipped_empty: counters.skipped_empty,
	}))
}

pub async fn delete_non_originals(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
	duplicate_engine::queue_for_deletion(&state.db, id).await?;
	Ok(StatusCode::ACCEPTED)
}

async fn root_for_group(state: &AppState, group_id: Uuid) -> ApiResult<String> {
	let (_, members) = duplicate_engine::get_group(&state.db, group_id).await?;
	let Some(first) = members.first() else {
		return Err(ApiError::NotFound(format!("group {group_id} has no members")));
	};
	let directory = sd_core_db::scan_directories::get(&state.db, first.scan_directory_id).await?;
	Ok(directory.path)
}
