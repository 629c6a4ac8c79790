//! `/files*` handlers (spec §6.1 rows 1-6, §4.4.1, §4.4.3).

use axum::{
	extract::{Path, Query, State},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use chrono::{DateTime, Utc};
use sd_core_db::{
	duplicate_engine::{self, IngestDescriptor},
	files::{self, FileListFilter, ReprocessFilter},
	scan_directories,
};
use sd_hub_protocol::ServerCommand;
use sd_object_store::THUMBNAILS_BUCKET;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::publish::publish_discovered;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
	#[serde(rename = "directory")]
	pub scan_directory_id: Option<Uuid>,
	pub has_duplicates: Option<bool>,
	pub modified_after: Option<DateTime<Utc>>,
	pub modified_before: Option<DateTime<Utc>>,
	pub search: Option<String>,
	pub hidden: Option<bool>,
	pub page: Option<u64>,
	pub page_size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FileDto {
	pub id: Uuid,
	pub scan_directory_id: Uuid,
	pub path: String,
	pub basename: String,
	pub extension: Option<String>,
	pub file_hash: String,
	pub size_bytes: i64,
	pub fs_modified_at: DateTime<Utc>,
	pub indexed_at: DateTime<Utc>,
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
	pub metadata_error: Option<String>,
	pub has_thumbnail: bool,
	pub thumbnail_error: Option<String>,
	pub retry_count: i32,
	pub duplicate_group_id: Option<Uuid>,
	pub is_original: bool,
	pub hidden: bool,
}

impl From<sd_core_db::entities::indexed_file::Model> for FileDto {
	fn from(m: sd_core_db::entities::indexed_file::Model) -> Self {
		Self {
			id: m.id,
			scan_directory_id: m.scan_directory_id,
			path: m.path,
			basename: m.basename,
			extension: m.extension,
			file_hash: m.file_hash,
			size_bytes: m.size_bytes,
			fs_modified_at: m.fs_modified_at,
			indexed_at: m.indexed_at,
			width: m.width,
			height: m.height,
			capture_time: m.capture_time,
			camera_make: m.camera_make,
			camera_model: m.camera_model,
			gps_latitude: m.gps_latitude,
			gps_longitude: m.gps_longitude,
			iso: m.iso,
			aperture: m.aperture,
			shutter_speed: m.shutter_speed,
			metadata_error: m.metadata_error,
			has_thumbnail: m.thumbnail_object_key.is_some(),
			thumbnail_error: m.thumbnail_error,
			retry_count: m.retry_count,
			duplicate_group_id: m.duplicate_group_id,
			is_original: m.is_original,
			hidden: m.hidden,
		}
	}
}

#[derive(Debug, Serialize)]
pub struct FilePageDto {
	pub files: Vec<FileDto>,
	pub page: u64,
	pub total_pages: u64,
}

pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<FilePageDto>> {
	let filter = FileListFilter {
		scan_directory_id: q.scan_directory_id,
		has_duplicates: q.has_duplicates,
		modified_after: q.modified_after,
		modified_before: q.modified_before,
		search: q.search,
		hidden: q.hidden,
	};
	let page = files::list_files(&state.db, &filter, q.page.unwrap_or(0), q.page_size.unwrap_or(50)).await?;
	Ok(Json(FilePageDto {
		files: page.files.into_iter().map(FileDto::from).collect(),
		page: page.page,
		total_pages: page.total_pages,
	}))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<FileDto>> {
	let file = files::get_file(&state.db, id).await?;
	Ok(Json(FileDto::from(file)))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<files::FileStats>> {
	Ok(Json(files::stats(&state.db).await?))
}

pub async fn thumbnail(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Response> {
	let file = files::get_file(&state.db, id).await?;
	let Some(key) = file.thumbnail_object_key else {
		return Err(ApiError::NotFound(format!("file {id} has no thumbnail yet")));
	};
	let bytes = state
		.object_store
		.get(THUMBNAILS_BUCKET, &key)
		.await
		.map_err(|error| ApiError::NotFound(format!("thumbnail object missing: {error}")))?;
	Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

/// Streams the original bytes by asking a connected discovery worker to
/// read the path back over the hub (spec §6.1 `/files/{id}/content`); the
/// original is never itself persisted in the object store, only scratch
/// copies the processing workers consume and delete.
pub async fn content(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Response> {
	let file = files::get_file(&state.db, id).await?;

	let Some(result) = state.hub.request_file_content(id, file.path.clone()).await else {
		return Ok(StatusCode::SERVICE_UNAVAILABLE.into_response());
	};

	if !result.success {
		let message = result.error.unwrap_or_else(|| "worker could not read the file".to_string());
		return Err(ApiError::NotFound(message));
	}

	let data = result.data.unwrap_or_default();
	let content_type = guess_content_type(file.extension.as_deref());
	Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

fn guess_content_type(extension: Option<&str>) -> &'static str {
	match extension.map(str::to_ascii_lowercase).as_deref() {
		Some("jpg") | Some("jpeg") => "image/jpeg",
		Some("png") => "image/png",
		Some("gif") => "image/gif",
		Some("heic") | Some("heif") => "image/heic",
		Some("webp") => "image/webp",
		_ => "application/octet-stream",
	}
}

#[derive(Debug, Deserialize)]
pub struct BatchDescriptor {
	pub path: String,
	pub basename: String,
	pub extension: Option<String>,
	pub file_hash: String,
	pub size_bytes: i64,
	pub fs_created_at: DateTime<Utc>,
	pub fs_modified_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BatchIngestBody {
	pub scan_directory_id: Uuid,
	pub files: Vec<BatchDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct BatchIngestResponseRow {
	pub path: String,
	pub file_id: Uuid,
	pub outcome: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BatchIngestResponse {
	pub created: u32,
	pub updated: u32,
	pub unchanged: u32,
	pub failed: u32,
	pub rows: Vec<BatchIngestResponseRow>,
}

/// `POST /files/batch` (spec §4.4.1): upsert, re-link duplicate groups,
/// commit, *then* fan out `FileDiscovered` for every new/hash-changed row.
pub async fn batch_ingest(
	State(state): State<AppState>,
	Json(body): Json<BatchIngestBody>,
) -> ApiResult<Json<BatchIngestResponse>> {
	let descriptors = body
		.files
		.into_iter()
		.map(|d| IngestDescriptor {
			path: d.path,
			basename: d.basename,
			extension: d.extension,
			file_hash: d.file_hash,
			size_bytes: d.size_bytes,
			fs_created_at: d.fs_created_at,
			fs_modified_at: d.fs_modified_at,
		})
		.collect();

	let result =
		duplicate_engine::ingest_batch(&state.db, body.scan_directory_id, descriptors, Utc::now()).await?;

	publish_discovered(&state.bus, body.scan_directory_id, &result).await;
	scan_directories::recount_files(&state.db, body.scan_directory_id).await?;

	Ok(Json(BatchIngestResponse {
		created: result.created,
		updated: result.updated,
		unchanged: result.unchanged,
		failed: result.failed,
		rows: result
			.rows
			.iter()
			.map(|r| BatchIngestResponseRow {
				path: r.path.clone(),
				file_id: r.file_id,
				outcome: match r.outcome {
					duplicate_engine::IngestOutcome::Created => "created",
					duplicate_engine::IngestOutcome::Updated => "updated",
					duplicate_engine::IngestOutcome::Unchanged => "unchanged",
				},
			})
			.collect(),
	}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", tag = "filter")]
pub enum ReprocessBody {
	MissingThumbnail,
	MissingMetadata,
	Failed,
	FileIds { file_ids: Vec<Uuid> },
}

#[derive(Debug, Serialize)]
pub struct ReprocessResponse {
	pub requested: usize,
}

/// `POST /files/reprocess` (spec §8 scenario 6): sends one `ReprocessFile`
/// hub command per matched file; the discovery worker re-submits it as a
/// one-item batch once it reads it back off disk.
pub async fn reprocess(
	State(state): State<AppState>,
	Json(body): Json<ReprocessBody>,
) -> ApiResult<(StatusCode, Json<ReprocessResponse>)> {
	let filter = match body {
		ReprocessBody::MissingThumbnail => ReprocessFilter::MissingThumbnail,
		ReprocessBody::MissingMetadata => ReprocessFilter::MissingMetadata,
		ReprocessBody::Failed => ReprocessFilter::Failed,
		ReprocessBody::FileIds { file_ids } => ReprocessFilter::FileIds(file_ids),
	};

	let matched = files::files_for_reprocess(&state.db, &filter).await?;
	for file in &matched {
		let command = ServerCommand::ReprocessFile { file_id: file.id, path: file.path.clone() };
		state.hub.broadcast(sd_hub_protocol::WorkerKind::Discovery, command).await;
	}

	Ok((StatusCode::ACCEPTED, Json(ReprocessResponse { requested: matched.len() })))
}
