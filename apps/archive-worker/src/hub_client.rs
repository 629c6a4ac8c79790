//! Control-channel client (spec §4.4.6, §6.2), the archive-worker
//! counterpart of the discovery worker's hub client: connects to
//! `/hubs/cleaner`, dispatches delete/cancel/dry-run commands to the
//! processing task and forwards its reports back over the socket. Same
//! fixed reconnect schedule: 1s, 5s, 10s, 30s, 60s, then holds at 60s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use sd_hub_protocol::{ServerCommand, WorkerReport};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

pub enum CleanerCommand {
	DeleteFile(sd_hub_protocol::DeleteFileCommand),
	DeleteFiles { job_id: sd_hub_protocol::JobId, files: Vec<sd_hub_protocol::DeleteFileCommand> },
	CancelJob { job_id: sd_hub_protocol::JobId },
}

const RECONNECT_SCHEDULE: &[Duration] = &[
	Duration::from_secs(1),
	Duration::from_secs(5),
	Duration::from_secs(10),
	Duration::from_secs(30),
	Duration::from_secs(60),
];

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

pub async fn run(
	hub_url: String,
	hostname: String,
	dry_run_configured: bool,
	commands: mpsc::Sender<CleanerCommand>,
	cancelled: Arc<AtomicBool>,
	mut reports: mpsc::Receiver<WorkerReport>,
) {
	let mut attempt = 0usize;
	loop {
		match connect_and_drive(&hub_url, &hostname, dry_run_configured, &commands, &cancelled, &mut reports).await {
			Ok(()) => {
				info!("hub connection closed cleanly");
				attempt = 0;
			}
			Err(error) => warn!(%error, "hub connection dropped"),
		}

		let delay = RECONNECT_SCHEDULE[attempt.min(RECONNECT_SCHEDULE.len() - 1)];
		attempt += 1;
		info!(delay_secs = delay.as_secs(), "reconnecting to hub");
		tokio::time::sleep(delay).await;
	}
}

async fn connect_and_drive(
	hub_url: &str,
	hostname: &str,
	dry_run_configured: bool,
	commands: &mpsc::Sender<CleanerCommand>,
	cancelled: &Arc<AtomicBool>,
	reports: &mut mpsc::Receiver<WorkerReport>,
) -> anyhow::Result<()> {
	let (stream, _response) = tokio_tungstenite::connect_async(hub_url).await?;
	let (mut sink, mut source) = stream.split();
	info!(%hostname, "connected to control channel");

	let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
	heartbeat.tick().await;

	loop {
		tokio::select! {
			report = reports.recv() => {
				match report {
					Some(report) => send_report(&mut sink, &report).await?,
					None => return Ok(()),
				}
			}
			_ = heartbeat.tick() => {
				// The cleaner has no push-based status analogue to the
				// discovery worker's `DiscoveryStatus`; a `RequestStatus`
				// round trip is server-initiated, so the heartbeat here
				// just keeps the connection alive.
			}
			message = source.next() => {
				match message {
					Some(Ok(Message::Text(text))) => {
						handle_server_message(&text, dry_run_configured, commands, cancelled).await;
					}
					Some(Ok(Message::Close(_))) | None => return Ok(()),
					Some(Err(error)) => return Err(error.into()),
					_ => {}
				}
			}
		}
	}
}

async fn send_report(
	sink: &mut (impl Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
	report: &WorkerReport,
) -> anyhow::Result<()> {
	let text = serde_json::to_string(report)?;
	sink.send(Message::Text(text)).await?;
	Ok(())
}

async fn handle_server_message(
	text: &str,
	dry_run_configured: bool,
	commands: &mpsc::Sender<CleanerCommand>,
	cancelled: &Arc<AtomicBool>,
) {
	let command: ServerCommand = match serde_json::from_str(text) {
		Ok(command) => command,
		Err(error) => {
			warn!(%error, "rejecting unparseable/unknown hub command");
			return;
		}
	};

	match command {
		ServerCommand::DeleteFile(delete) => {
			cancelled.store(false, Ordering::Relaxed);
			let _ = commands.send(CleanerCommand::DeleteFile(delete)).await;
		}
		ServerCommand::DeleteFiles { job_id, files } => {
			cancelled.store(false, Ordering::Relaxed);
			let _ = commands.send(CleanerCommand::DeleteFiles { job_id, files }).await;
		}
		ServerCommand::CancelJob { job_id } => {
			cancelled.store(true, Ordering::Relaxed);
			let _ = commands.send(CleanerCommand::CancelJob { job_id }).await;
		}
		ServerCommand::SetDryRun { enabled } => {
			// Dry-run is a boot-time-only setting for this worker (DESIGN.md
			// Open Question decision); acknowledge by logging, don't apply it.
			info!(requested = enabled, configured = dry_run_configured, "ignoring runtime dry-run change");
		}
		ServerCommand::RequestStatus => {
			// The cleaner doesn't maintain a continuous status stream; a
			// dedicated status report type would be needed to answer this
			// meaningfully, so it's a no-op here.
		}
		ServerCommand::ReprocessFile { .. }
		| ServerCommand::TriggerScan { .. }
		| ServerCommand::Pause
		| ServerCommand::Resume
		| ServerCommand::Cancel
		| ServerCommand::RequestFileContent { .. } => {
			// Discovery-worker-only commands; this connection is registered
			// as `WorkerKind::Archive` so the hub never routes them here.
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reconnect_schedule_holds_at_last_entry() {
		assert_eq!(RECONNECT_SCHEDULE[10.min(RECONNECT_SCHEDULE.len() - 1)], Duration::from_secs(60));
	}
}
