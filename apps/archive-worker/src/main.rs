//! Bootstraps the archive worker (spec §4.7): connects to the control
//! channel and processes delete commands sequentially until shut down.

mod commands;
mod config;
mod hub_client;
mod mover;
mod verify;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use sd_hub_protocol::WorkerReport;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::AppConfig;
use crate::hub_client::CleanerCommand;

const COMMAND_QUEUE_CAPACITY: usize = 16;
const REPORT_QUEUE_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,archive_worker=debug".into()),
		)
		.init();

	let config = AppConfig::load()?;
	let hub_url = config.hub_url();
	let trash_root = PathBuf::from(&config.trash_root);
	let dry_run = config.dry_run;

	tokio::fs::create_dir_all(&trash_root).await?;

	let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
	let (report_tx, report_rx) = mpsc::channel(REPORT_QUEUE_CAPACITY);
	let cancelled = Arc::new(AtomicBool::new(false));

	info!(hub_url, %dry_run, "archive worker starting");

	let processing_task = tokio::spawn(process_commands(command_rx, trash_root, dry_run, report_tx, cancelled.clone()));
	let hub_task =
		tokio::spawn(hub_client::run(hub_url, config.hostname.clone(), dry_run, command_tx, cancelled, report_rx));

	let mut shutdown = Box::pin(shutdown_signal());
	tokio::select! {
		_ = &mut shutdown => {
			info!("shutdown signal received");
		}
		_ = processing_task => {
			info!("command processor exited");
		}
		_ = hub_task => {
			info!("hub client exited");
		}
	}

	Ok(())
}

async fn process_commands(
	mut commands: mpsc::Receiver<CleanerCommand>,
	trash_root: PathBuf,
	dry_run: bool,
	reports: mpsc::Sender<WorkerReport>,
	cancelled: Arc<AtomicBool>,
) {
	while let Some(command) = commands.recv().await {
		match command {
			CleanerCommand::DeleteFile(file) => {
				commands::delete_file(file, &trash_root, dry_run, &reports).await;
			}
			CleanerCommand::DeleteFiles { job_id, files } => {
				commands::delete_files(job_id, files, &trash_root, dry_run, &reports, &cancelled).await;
			}
			CleanerCommand::CancelJob { .. } => {
				// Cancellation is observed cooperatively inside `delete_files`
				// via the shared flag; a lone `CancelJob` with no matching
				// in-flight batch has nothing to do.
			}
		}
	}
}

async fn shutdown_signal() {
	let ctrl_c = async {
		tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
