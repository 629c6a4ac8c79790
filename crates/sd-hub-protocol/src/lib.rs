//! Typed message set for the control channel (spec §4.4.6, §6.2): the
//! persistent, multiplexed, bidirectional connection between the ingestion
//! service and each connected discovery/archive worker.
//!
//! The channel is framed as newline-delimited JSON over a WebSocket
//! (`axum`'s upgrade on the server side, `tokio-tungstenite` on the worker
//! side) — any transport with reliable ordered delivery, automatic
//! reconnection and typed dispatch satisfies spec §9's requirement here.
//! The message set is closed: an unknown `method` on deserialize is a
//! protocol error, not silently ignored (spec §6.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type JobId = Uuid;
pub type FileId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
	Discovery,
	Archive,
}

/// The cleaner-job category a delete command belongs to (mirrors
/// `CleanerJob.category`, spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CleanerCategory {
	HashDuplicate,
	NearDuplicate,
	Manual,
}

/// Discovery worker aggregate state (spec §4.3 "Progress and control").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryState {
	Idle,
	Scanning,
	Processing,
	Reprocessing,
	Paused,
	Error,
	Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryStatus {
	pub hostname: String,
	pub state: DiscoveryState,
	pub current_directory: Option<String>,
	pub files_processed: u64,
	pub files_per_second: f64,
	pub bytes_per_second: f64,
	pub estimated_seconds_remaining: Option<u64>,
	pub pending_directories: Vec<String>,
	pub last_error: Option<String>,
	pub reported_at: DateTime<Utc>,
}

/// Phase reported while an archive worker processes a single delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePhase {
	Verifying,
	Moving,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResult {
	pub job_id: JobId,
	pub file_id: FileId,
	pub success: bool,
	pub was_dry_run: bool,
	pub skipped: bool,
	pub archive_path: Option<String>,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileCommand {
	pub job_id: JobId,
	pub file_id: FileId,
	pub path: String,
	pub hash: String,
	pub size: u64,
	pub category: CleanerCategory,
}

/// Error taxonomy shared end-to-end (spec §7), surfaced over the hub as a
/// typed field rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	NotFound,
	Conflict,
	Validation,
	Io,
	Network,
	Decode,
	Policy,
	Cancelled,
}

/// Server → worker commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum ServerCommand {
	DeleteFile(DeleteFileCommand),
	DeleteFiles {
		job_id: JobId,
		files: Vec<DeleteFileCommand>,
	},
	CancelJob {
		job_id: JobId,
	},
	SetDryRun {
		enabled: bool,
	},
	RequestStatus,
	// Discovery-worker-only commands.
	ReprocessFile {
		file_id: FileId,
		path: String,
	},
	TriggerScan {
		scan_directory_id: Uuid,
		path: String,
	},
	Pause,
	Resume,
	Cancel,
	/// `GET /files/{id}/content`'s server-side half of the worker tunnel
	/// (spec §6.1): rather than stream bytes through the object store (the
	/// original is never uploaded there, only a hash), ask whichever
	/// discovery worker still has the path mounted to read it back.
	RequestFileContent {
		request_id: Uuid,
		file_id: FileId,
		path: String,
	},
}

/// Worker → server status/result reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum WorkerReport {
	ReportStatus(DiscoveryStatus),
	ReportDeleteProgress {
		job_id: JobId,
		file_id: FileId,
		phase: DeletePhase,
	},
	ReportDeleteComplete(DeleteResult),
	ReportJobComplete {
		job_id: JobId,
		succeeded: u32,
		failed: u32,
		skipped: u32,
	},
	ReportFileContent {
		request_id: Uuid,
		success: bool,
		data: Option<Vec<u8>>,
		error: Option<String>,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_command_round_trips_through_json() {
		let cmd = ServerCommand::DeleteFile(DeleteFileCommand {
			job_id: Uuid::nil(),
			file_id: Uuid::nil(),
			path: "/r/a.jpg".into(),
			hash: "abc".into(),
			size: 100,
			category: CleanerCategory::HashDuplicate,
		});
		let json = serde_json::to_string(&cmd).unwrap();
		let back: ServerCommand = serde_json::from_str(&json).unwrap();
		match back {
			ServerCommand::DeleteFile(d) => assert_eq!(d.path, "/r/a.jpg"),
			_ => panic!("wrong variant"),
		}
	}

	#[test]
	fn unknown_method_is_rejected() {
		let json = r#"{"method":"doSomethingUnspecified"}"#;
		let result: Result<ServerCommand, _> = serde_json::from_str(json);
		assert!(result.is_err());
	}
}
