//! WebSocket upgrade handlers for the two control-channel endpoints
//! (spec §6.2): `/hubs/indexer?indexerId=<id>&hostname=<h>` and
//! `/hubs/cleaner?cleanerId=<id>&hostname=<h>`.

use axum::{
	extract::{ws::WebSocketUpgrade, Query, State},
	response::Response,
};
use sd_hub_protocol::{WorkerKind, WorkerReport};
use serde::Deserialize;

use crate::hub::drive_connection;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IndexerQuery {
	#[serde(rename = "indexerId")]
	pub indexer_id: String,
	pub hostname: String,
}

pub async fn indexer_upgrade(
	State(state): State<AppState>,
	Query(q): Query<IndexerQuery>,
	ws: WebSocketUpgrade,
) -> Response {
	ws.on_upgrade(move |socket| async move {
		drive_connection(socket, state.hub.clone(), q.indexer_id, q.hostname, WorkerKind::Discovery, {
			let state = state.clone();
			move |report| handle_report(state.clone(), report)
		})
		.await;
	})
}

#[derive(Debug, Deserialize)]
pub struct CleanerQuery {
	#[serde(rename = "cleanerId")]
	pub cleaner_id: String,
	pub hostname: String,
}

pub async fn cleaner_upgrade(
	State(state): State<AppState>,
	Query(q): Query<CleanerQuery>,
	ws: WebSocketUpgrade,
) -> Response {
	ws.on_upgrade(move |socket| async move {
		drive_connection(socket, state.hub.clone(), q.cleaner_id, q.hostname, WorkerKind::Archive, {
			let state = state.clone();
			move |report| handle_report(state.clone(), report)
		})
		.await;
	})
}

/// Applies a worker's asynchronous status/result report to the database,
/// outside of the HTTP request cycle that originated the underlying job
/// (spec §4.4.6 "acts as both command target and status source").
fn handle_report(state: AppState, report: WorkerReport) {
	tokio::spawn(async move {
		if let Err(error) = apply_report(&state, report).await {
			tracing::error!(%error, "failed to apply hub worker report");
		}
	});
}

async fn apply_report(state: &AppState, report: WorkerReport) -> anyhow::Result<()> {
	match report {
		WorkerReport::ReportStatus(_) => {
			// Live status is held in memory by the connection only (spec
			// §5 "Heartbeat status updates... never persisted"); nothing
			// to do here beyond what `drive_connection` already logs.
		}
		WorkerReport::ReportDeleteProgress { job_id, file_id, phase } => {
			tracing::info!(%job_id, %file_id, ?phase, "delete progress");
		}
		WorkerReport::ReportDeleteComplete(result) => {
			apply_delete_result(state, result).await?;
		}
		WorkerReport::ReportJobComplete { job_id, succeeded, failed, skipped } => {
			tracing::info!(%job_id, succeeded, failed, skipped, "cleaner job complete");
			sd_core_db::duplicate_engine::complete_cleaner_job(&state.db, job_id).await?;
		}
		WorkerReport::ReportFileContent { .. } => {
			// Handled inline by `drive_connection` before this callback runs.
		}
	}
	Ok(())
}

async fn apply_delete_result(
	state: &AppState,
	result: sd_hub_protocol::DeleteResult,
) -> anyhow::Result<()> {
	use sd_core_db::entities::{cleaner_job_file, CleanerJobFileStatus};
	use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

	let row = cleaner_job_file::Entity::find()
		.filter(cleaner_job_file::Column::JobId.eq(result.job_id))
		.filter(cleaner_job_file::Column::FileId.eq(result.file_id))
		.one(&state.db)
		.await?;

	let Some(row) = row else {
		tracing::warn!(job_id = %result.job_id, file_id = %result.file_id, "delete result for unknown job file");
		return Ok(());
	};

	let status = if result.skipped {
		CleanerJobFileStatus::Skipped
	} else if result.success {
		CleanerJobFileStatus::Deleted
	} else {
		CleanerJobFileStatus::Failed
	};

	let file_id = result.file_id;
	let archive_path = result.archive_path.clone();

	let mut active: cleaner_job_file::ActiveModel = row.into();
	active.status = Set(status);
	active.archive_path = Set(result.archive_path);
	active.error = Set(result.error);
	active.was_dry_run = Set(result.was_dry_run);
	active.update(&state.db).await?;

	// Only a real, non-dry-run, non-skipped delete actually archived
	// anything on disk — flip the source file's row only then (spec §3
	// lifecycle, §8 invariant 3).
	if result.success && !result.skipped && !result.was_dry_run {
		if let Some(archive_path) = archive_path {
			sd_core_db::duplicate_engine::apply_archive_result(&state.db, file_id, archive_path, chrono::Utc::now())
				.await?;
		}
	}

	Ok(())
}
