//! Control-channel client (spec §4.4.6, §6.2): maintains a single
//! long-lived WebSocket connection to `/hubs/indexer`, pushing status
//! reports out and dispatching server commands to the scan engine.
//! Reconnects with the exponential schedule the spec fixes: 1s, 5s, 10s,
//! 30s, 60s, then holds at 60s.

use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use sd_hub_protocol::{ServerCommand, WorkerReport};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::engine::{ContentReadResult, EngineCommand};

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
	engine_commands: mpsc::Sender<EngineCommand>,
	mut status: watch::Receiver<sd_hub_protocol::DiscoveryStatus>,
) {
	let mut attempt = 0usize;
	loop {
		let outcome = connect_and_drive(&hub_url, &engine_commands, &mut status).await;
		let _ = engine_commands.send(EngineCommand::SetConnected(false)).await;
		match outcome {
			Ok(()) => {
				info!("hub connection closed cleanly");
				attempt = 0;
			}
			Err(error) => {
				warn!(%error, "hub connection dropped");
			}
		}

		let delay = RECONNECT_SCHEDULE[attempt.min(RECONNECT_SCHEDULE.len() - 1)];
		attempt += 1;
		info!(delay_secs = delay.as_secs(), "reconnecting to hub");
		tokio::time::sleep(delay).await;
	}
}

async fn connect_and_drive(
	hub_url: &str,
	engine_commands: &mpsc::Sender<EngineCommand>,
	status: &mut watch::Receiver<sd_hub_protocol::DiscoveryStatus>,
) -> anyhow::Result<()> {
	let (stream, _response) = tokio_tungstenite::connect_async(hub_url).await?;
	let (mut sink, mut source) = stream.split();
	info!("connected to control channel");
	let _ = engine_commands.send(EngineCommand::SetConnected(true)).await;

	// Resend a full status immediately on (re)connect, per spec §4.4.6
	// "on reconnect it is expected to resend a full status immediately".
	send_status(&mut sink, &status.borrow()).await?;

	let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
	heartbeat.tick().await; // first tick fires immediately, skip it

	loop {
		tokio::select! {
			changed = status.changed() => {
				changed?;
				let snapshot = status.borrow().clone();
				send_status(&mut sink, &snapshot).await?;
			}
			_ = heartbeat.tick() => {
				let snapshot = status.borrow().clone();
				send_status(&mut sink, &snapshot).await?;
			}
			message = source.next() => {
				match message {
					Some(Ok(Message::Text(text))) => {
						handle_server_message(&text, engine_commands, &mut sink).await;
					}
					Some(Ok(Message::Close(_))) | None => return Ok(()),
					Some(Err(error)) => return Err(error.into()),
					_ => {}
				}
			}
		}
	}
}

async fn send_status(
	sink: &mut (impl Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
	status: &sd_hub_protocol::DiscoveryStatus,
) -> anyhow::Result<()> {
	let report = WorkerReport::ReportStatus(status.clone());
	let text = serde_json::to_string(&report)?;
	sink.send(Message::Text(text)).await?;
	Ok(())
}

async fn handle_server_message(
	text: &str,
	engine_commands: &mpsc::Sender<EngineCommand>,
	sink: &mut (impl Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
) {
	let command: ServerCommand = match serde_json::from_str(text) {
		Ok(command) => command,
		Err(error) => {
			warn!(%error, "rejecting unparseable/unknown hub command");
			return;
		}
	};

	let engine_command = match command {
		ServerCommand::ReprocessFile { file_id, path } => Some(EngineCommand::ReprocessFile { file_id, path }),
		ServerCommand::TriggerScan { scan_directory_id, path } => {
			Some(EngineCommand::TriggerScan { scan_directory_id, path })
		}
		ServerCommand::Pause => Some(EngineCommand::Pause),
		ServerCommand::Resume => Some(EngineCommand::Resume),
		ServerCommand::Cancel => Some(EngineCommand::Cancel),
		ServerCommand::RequestStatus => Some(EngineCommand::RequestStatus),
		ServerCommand::RequestFileContent { request_id, path, .. } => {
			let (tx, rx) = oneshot::channel();
			if engine_commands.send(EngineCommand::ReadFileContent { path, respond: tx }).await.is_err() {
				return;
			}
			if let Ok(result) = rx.await {
				respond_file_content(sink, request_id, result).await;
			}
			None
		}
		// `DeleteFile`/`DeleteFiles`/`CancelJob`/`SetDryRun` are archive-worker
		// commands; this connection is registered as `WorkerKind::Discovery`
		// so the hub never routes them here, but ignore defensively.
		ServerCommand::DeleteFile(_)
		| ServerCommand::DeleteFiles { .. }
		| ServerCommand::CancelJob { .. }
		| ServerCommand::SetDryRun { .. } => None,
	};

	if let Some(command) = engine_command {
		if engine_commands.send(command).await.is_err() {
			error!("engine command channel closed");
		}
	}
}

async fn respond_file_content(
	sink: &mut (impl Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
	request_id: uuid::Uuid,
	result: ContentReadResult,
) {
	let report = WorkerReport::ReportFileContent {
		request_id,
		success: result.success,
		data: result.data,
		error: result.error,
	};
	if let Ok(text) = serde_json::to_string(&report) {
		let _ = sink.send(Message::Text(text)).await;
	}
}
