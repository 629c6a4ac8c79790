//! The control-channel hub (spec §4.4.6, §6.2): a persistent,
//! bidirectional connection per worker, tracked in an in-memory registry so
//! commands can be dispatched by worker id or broadcast. Grounded in the
//! teacher's in-process actor registries (`crates/actors`) generalized from
//! local task supervision to remote WebSocket connections.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use sd_hub_protocol::{ServerCommand, WorkerKind, WorkerReport};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Bounded per-connection outbound queue; overflow closes the connection
/// (spec §5 backpressure).
const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// How long `GET /files/{id}/content` waits for a worker to answer a
/// `RequestFileContent` before giving up with a 503 (spec §6.1).
pub const FILE_CONTENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct WorkerConnection {
	pub worker_id: String,
	pub hostname: String,
	pub kind: WorkerKind,
	sender: mpsc::Sender<ServerCommand>,
}

impl WorkerConnection {
	pub async fn send(&self, command: ServerCommand) -> bool {
		self.sender.try_send(command).is_ok()
	}
}

#[derive(Debug)]
pub struct FileContentResult {
	pub success: bool,
	pub data: Option<Vec<u8>>,
	pub error: Option<String>,
}

#[derive(Default)]
pub struct Hub {
	connections: RwLock<HashMap<String, WorkerConnection>>,
	pending_content_requests: RwLock<HashMap<Uuid, oneshot::Sender<FileContentResult>>>,
}

impl Hub {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Asks every connected discovery worker to read `path` back (spec
	/// §6.1 `/files/{id}/content`'s worker tunnel); whichever one actually
	/// has the path mounted answers, the rest silently find nothing and
	/// never report. Returns `None` on timeout or if no discovery worker
	/// is connected at all.
	pub async fn request_file_content(
		&self,
		file_id: Uuid,
		path: String,
	) -> Option<FileContentResult> {
		let discovery_workers = self.connections_of_kind(WorkerKind::Discovery).await;
		if discovery_workers.is_empty() {
			return None;
		}

		let request_id = Uuid::new_v4();
		let (tx, rx) = oneshot::channel();
		self.pending_content_requests.write().await.insert(request_id, tx);

		let command = ServerCommand::RequestFileContent { request_id, file_id, path };
		for worker in &discovery_workers {
			worker.send(command.clone()).await;
		}

		let result = tokio::time::timeout(FILE_CONTENT_REQUEST_TIMEOUT, rx).await;
		self.pending_content_requests.write().await.remove(&request_id);
		result.ok()?.ok()
	}

	async fn complete_file_content_request(&self, request_id: Uuid, result: FileContentResult) {
		if let Some(sender) = self.pending_content_requests.write().await.remove(&request_id) {
			let _ = sender.send(result);
		}
	}

	/// `key` is the registry key (unique across worker kinds, see
	/// `connection_id`); `worker_id` is the value the worker itself reports
	/// and is what appears in logs and `WorkerConnection`.
	pub async fn register(
		&self,
		key: String,
		worker_id: String,
		hostname: String,
		kind: WorkerKind,
	) -> mpsc::Receiver<ServerCommand> {
		let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
		let connection = WorkerConnection { worker_id, hostname, kind, sender: tx };
		self.connections.write().await.insert(key, connection);
		rx
	}

	pub async fn unregister(&self, key: &str) {
		self.connections.write().await.remove(key);
	}

	/// `key` is the registry key from `connection_id`, not the bare worker id.
	pub async fn send_to(&self, key: &str, command: ServerCommand) -> bool {
		let connections = self.connections.read().await;
		match connections.get(key) {
			Some(conn) => conn.send(command).await,
			None => false,
		}
	}

	/// Broadcasts to every connected worker of `kind` (used for ambiguous
	/// reprocess routing per spec §9).
	pub async fn broadcast(&self, kind: WorkerKind, command: ServerCommand) {
		let connections = self.connections.read().await;
		for conn in connections.values().filter(|c| c.kind == kind) {
			conn.send(command.clone()).await;
		}
	}

	/// Finds the discovery-worker connections whose known scan roots
	/// contain `path`, for reprocess routing (spec §9 open question).
	pub async fn connections_of_kind(&self, kind: WorkerKind) -> Vec<WorkerConnection> {
		self.connections.read().await.values().filter(|c| c.kind == kind).cloned().collect()
	}
}

/// Drives one worker's WebSocket connection: forwards queued commands out,
/// parses inbound reports, and tears down the registry entry on
/// disconnect (spec §4.4.6 reconnection policy is the worker's
/// responsibility; this just serves one connection's lifetime).
pub async fn drive_connection(
	socket: WebSocket,
	hub: Arc<Hub>,
	worker_id: String,
	hostname: String,
	kind: WorkerKind,
	on_report: impl Fn(WorkerReport) + Send + Sync + 'static,
) {
	let (mut sink, mut stream) = futures_util::StreamExt::split(socket);
	let registry_key = connection_id(kind, &worker_id);
	let mut outbound = hub.register(registry_key.clone(), worker_id.clone(), hostname, kind).await;

	info!(worker_id, ?kind, "worker connected");

	loop {
		tokio::select! {
			command = outbound.recv() => {
				let Some(command) = command else { break };
				let Ok(text) = serde_json::to_string(&command) else { continue };
				if futures_util::SinkExt::send(&mut sink, Message::Text(text)).await.is_err() {
					break;
				}
			}
			message = futures_util::StreamExt::next(&mut stream) => {
				match message {
					Some(Ok(Message::Text(text))) => {
						match serde_json::from_str::<WorkerReport>(&text) {
							Ok(WorkerReport::ReportFileContent { request_id, success, data, error }) => {
								hub.complete_file_content_request(
									request_id,
									FileContentResult { success, data, error },
								)
								.await;
							}
							Ok(report) => on_report(report),
							Err(err) => warn!(worker_id, %err, "rejecting unknown hub message"),
						}
					}
					Some(Ok(Message::Close(_))) | None => break,
					Some(Err(err)) => {
						warn!(worker_id, %err, "hub connection error");
						break;
					}
					_ => {}
				}
			}
		}
	}

	hub.unregister(&registry_key).await;
	info!(worker_id, "worker disconnected");
}

pub fn connection_id(kind: WorkerKind, id: &str) -> String {
	format!("{kind:?}:{id}")
}
