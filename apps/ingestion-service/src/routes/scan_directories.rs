//! `/scan-directories*` handlers (spec §6.1 rows 7-12).

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use chrono::{DateTime, Utc};
use sd_core_db::scan_directories;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScanDirectoryDto {
	pub id: Uuid,
	pub path: String,
	pub enabled: bool,
	pub last_scanned_at: Option<DateTime<Utc>>,
	pub file_count: i64,
	pub created_at: DateTime<Utc>,
}

impl From<sd_core_db::entities::scan_directory::Model> for ScanDirectoryDto {
	fn from(m: sd_core_db::entities::scan_directory::Model) -> Self {
		Self {
			id: m.id,
			path: m.path,
			enabled: m.enabled,
			last_scanned_at: m.last_scanned_at,
			file_count: m.file_count,
			created_at: m.created_at,
		}
	}
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ScanDirectoryDto>>> {
	let rows = scan_directories::list(&state.db).await?;
	Ok(Json(rows.into_iter().map(ScanDirectoryDto::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateScanDirectoryBody {
	pub path: String,
	#[serde(default = "default_true")]
	pub enabled: bool,
}

fn default_true() -> bool {
	true
}

pub async fn create(
	State(state): State<AppState>,
	Json(body): Json<CreateScanDirectoryBody>,
) -> ApiResult<(StatusCode, Json<ScanDirectoryDto>)> {
	let row = scan_directories::create(&state.db, body.path, body.enabled).await?;
	Ok((StatusCode::CREATED, Json(ScanDirectoryDto::from(row))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateScanDirectoryBody {
	pub enabled: Option<bool>,
}

pub async fn update(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
	Json(body): Json<UpdateScanDirectoryBody>,
) -> ApiResult<Json<ScanDirectoryDto>> {
	let row = scan_directories::update(&state.db, id, body.enabled).await?;
	Ok(Json(ScanDirectoryDto::from(row)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
	scan_directories::delete(&state.db, id).await?;
	Ok(StatusCode::NO_CONTENT)
}

/// `POST /scan-directories/{id}/scan`: tells every connected discovery
/// worker to start a scan of this root (spec §6.2 `TriggerScan`).
pub async fn trigger_scan(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
	let directory = scan_directories::get(&state.db, id).await?;
	let command = sd_hub_protocol::ServerCommand::TriggerScan { scan_directory_id: id, path: directory.path };
	state.hub.broadcast(sd_hub_protocol::WorkerKind::Discovery, command).await;
	Ok(StatusCode::ACCEPTED)
}

pub async fn mark_last_scanned(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
	scan_directories::mark_last_scanned(&state.db, id).await?;
	Ok(StatusCode::NO_CONTENT)
}
