//! Per-command delete logic (spec §4.7): verify, archive, report. A single
//! `DeleteFileCommand` is processed to completion before the next is
//! started — the cleaner is intentionally not concurrent like the
//! discovery worker's hash/upload pool, since archiving is a filesystem
//! mutation and ordering/atomicity matter more than throughput here.

use std::path::{Path, PathBuf};

use sd_hub_protocol::{DeleteFileCommand, DeletePhase, DeleteResult, JobId, WorkerReport};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{mover, verify};

/// Derives the path a file is archived to under `trash_root`. The hub only
/// carries the file's absolute path (spec §6.2's `DeleteFileCommand` has no
/// scan-root/relative-path field — deriving one would require the archive
/// worker to know about `ScanDirectory` rows, which spec §3 reserves to the
/// ingestion service), so the absolute path's structure (minus its root
/// component) is mirrored under `trash_root` directly.
fn archive_relative_path(absolute_path: &Path) -> PathBuf {
	absolute_path.strip_prefix("/").unwrap_or(absolute_path).to_path_buf()
}

async fn process_one(
	command: &DeleteFileCommand,
	trash_root: &Path,
	dry_run: bool,
	reports: &mpsc::Sender<WorkerReport>,
) -> DeleteResult {
	let source = Path::new(&command.path);

	let _ = reports
		.send(WorkerReport::ReportDeleteProgress {
			job_id: command.job_id,
			file_id: command.file_id,
			phase: DeletePhase::Verifying,
		})
		.await;

	match verify::hashes_match(source, &command.hash).await {
		Ok(true) => {}
		Ok(false) => {
			warn!(path = %command.path, "skipping delete: on-disk hash no longer matches");
			return DeleteResult {
				job_id: command.job_id,
				file_id: command.file_id,
				success: false,
				was_dry_run: dry_run,
				skipped: true,
				archive_path: None,
				error: Some("hash mismatch".to_string()),
			};
		}
		Err(error) => {
			warn!(path = %command.path, %error, "skipping delete: file unreadable");
			return DeleteResult {
				job_id: command.job_id,
				file_id: command.file_id,
				success: false,
				was_dry_run: dry_run,
				skipped: true,
				archive_path: Some(error.to_string()),
				error: Some(error.to_string()),
			};
		}
	}

	if dry_run {
		info!(path = %command.path, "dry run: would archive file");
		return DeleteResult {
			job_id: command.job_id,
			file_id: command.file_id,
			success: true,
			was_dry_run: true,
			skipped: false,
			archive_path: None,
			error: None,
		};
	}

	let _ = reports
		.send(WorkerReport::ReportDeleteProgress {
			job_id: command.job_id,
			file_id: command.file_id,
			phase: DeletePhase::Moving,
		})
		.await;

	let relative_path = archive_relative_path(source);
	match mover::archive_file(source, trash_root, &relative_path).await {
		Ok(archived) => DeleteResult {
			job_id: command.job_id,
			file_id: command.file_id,
			success: true,
			was_dry_run: false,
			skipped: false,
			archive_path: Some(archived.display().to_string()),
			error: None,
		},
		Err(error) => DeleteResult {
			job_id: command.job_id,
			file_id: command.file_id,
			success: false,
			was_dry_run: false,
			skipped: false,
			archive_path: None,
			error: Some(error.to_string()),
		},
	}
}

pub async fn delete_file(
	command: DeleteFileCommand,
	trash_root: &Path,
	dry_run: bool,
	reports: &mpsc::Sender<WorkerReport>,
) {
	let result = process_one(&command, trash_root, dry_run, reports).await;
	let _ = reports.send(WorkerReport::ReportDeleteComplete(result)).await;
}

/// Runs a batch of deletes sequentially, honoring `cancelled` between
/// files (spec §4.7 "cancellation stops issuing further moves but lets the
/// in-flight one finish"). Always emits exactly one `ReportJobComplete`.
pub async fn delete_files(
	job_id: JobId,
	files: Vec<DeleteFileCommand>,
	trash_root: &Path,
	dry_run: bool,
	reports: &mpsc::Sender<WorkerReport>,
	cancelled: &std::sync::Arc<std::sync::atomic::AtomicBool>,
) {
	let mut succeeded = 0u32;
	let mut failed = 0u32;
	let mut skipped = 0u32;

	for command in files {
		if cancelled.load(std::sync::atomic::Ordering::Relaxed) {
			info!(%job_id, "job cancelled, stopping before next file");
			break;
		}

		let result = process_one(&command, trash_root, dry_run, reports).await;
		if result.skipped {
			skipped += 1;
		} else if result.success {
			succeeded += 1;
		} else {
			failed += 1;
		}
		let _ = reports.send(WorkerReport::ReportDeleteComplete(result)).await;
	}

	let _ = reports.send(WorkerReport::ReportJobComplete { job_id, succeeded, failed, skipped }).await;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn absolute_path_is_mirrored_without_root_component() {
		let relative = archive_relative_path(Path::new("/var/photos/2020/a.jpg"));
		assert_eq!(relative, PathBuf::from("var/photos/2020/a.jpg"));
	}

	#[tokio::test]
	async fn dry_run_reports_success_without_touching_file() {
		let dir = tempfile::tempdir().unwrap();
		let trash = tempfile::tempdir().unwrap();
		let source = dir.path().join("a.jpg");
		std::fs::write(&source, b"content").unwrap();
		let hash = blake3::hash(b"content").to_hex().to_string();

		let (tx, mut rx) = mpsc::channel(8);
		let command = DeleteFileCommand {
			job_id: uuid::Uuid::nil(),
			file_id: uuid::Uuid::nil(),
			path: source.display().to_string(),
			hash,
			size: 7,
			category: sd_hub_protocol::CleanerCategory::Manual,
		};

		delete_file(command, trash.path(), true, &tx).await;
		drop(tx);

		let mut saw_complete = false;
		while let Some(report) = rx.recv().await {
			if let WorkerReport::ReportDeleteComplete(result) = report {
				assert!(result.success);
				assert!(result.was_dry_run);
				saw_complete = true;
			}
		}
		assert!(saw_complete);
		assert!(source.exists());
	}

	#[tokio::test]
	async fn hash_mismatch_is_skipped_not_archived() {
		let dir = tempfile::tempdir().unwrap();
		let trash = tempfile::tempdir().unwrap();
		let source = dir.path().join("a.jpg");
		std::fs::write(&source, b"changed").unwrap();

		let (tx, mut rx) = mpsc::channel(8);
		let command = DeleteFileCommand {
			job_id: uuid::Uuid::nil(),
			file_id: uuid::Uuid::nil(),
			path: source.display().to_string(),
			hash: blake3::hash(b"original").to_hex().to_string(),
			size: 8,
			category: sd_hub_protocol::CleanerCategory::HashDuplicate,
		};

		delete_file(command, trash.path(), false, &tx).await;
		drop(tx);

		while let Some(report) = rx.recv().await {
			if let WorkerReport::ReportDeleteComplete(result) = report {
				assert!(result.skipped);
				assert!(!result.success);
			}
		}
		assert!(source.exists());
	}
}
