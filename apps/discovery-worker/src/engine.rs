//! The scan engine: owns the live status record, the pending-directory
//! queue, and the pause/resume/cancel state machine driven by hub commands
//! (spec §4.3 "Progress and control").

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use sd_core_indexer_rules::ScannerRules;
use sd_hub_protocol::DiscoveryState;
use sd_object_store::ObjectStore;
use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::{self, BatchDescriptor};
use crate::config::AppConfig;
use crate::hasher;
use crate::scanner::{self, ScanCounters};
use crate::status::StatusTracker;
use crate::upload;

#[derive(Debug)]
pub struct ContentReadResult {
	pub success: bool,
	pub data: Option<Vec<u8>>,
	pub error: Option<String>,
}

pub enum EngineCommand {
	TriggerScan { scan_directory_id: Uuid, path: String },
	ReprocessFile { file_id: Uuid, path: String },
	Pause,
	Resume,
	Cancel,
	ReadFileContent { path: String, respond: oneshot::Sender<ContentReadResult> },
	RequestStatus,
	SetConnected(bool),
}

#[derive(Debug, Clone)]
struct PendingScan {
	scan_directory_id: Uuid,
	path: PathBuf,
}

pub struct Engine {
	config: AppConfig,
	client: reqwest::Client,
	object_store: Arc<dyn ObjectStore>,
	rules: ScannerRules,
	status: StatusTracker,
	pending: VecDeque<PendingScan>,
	paused: bool,
	known_roots: Vec<PathBuf>,
}

impl Engine {
	pub fn new(
		config: AppConfig,
		object_store: Arc<dyn ObjectStore>,
		status: StatusTracker,
	) -> anyhow::Result<Self> {
		let rules = ScannerRules::new(config.scanner.clone().into_options())?;
		let known_roots = config.scan_roots.iter().map(PathBuf::from).collect();
		Ok(Self {
			config,
			client: reqwest::Client::new(),
			object_store,
			rules,
			status,
			pending: VecDeque::new(),
			paused: false,
			known_roots,
		})
	}

	/// Whether `path` falls under a root this worker knows about, used for
	/// the reprocess routing open question (spec §9): a worker only acts
	/// on `ReprocessFile`/`RequestFileContent` for paths it can actually
	/// see; otherwise it silently ignores the broadcast.
	fn owns_path(&self, path: &PathBuf) -> bool {
		self.known_roots.iter().any(|root| path.starts_with(root))
	}

	pub async fn run(mut self, mut commands: mpsc::Receiver<EngineCommand>) {
		// Boot-time scan of every configured root, as if the server had
		// just triggered each one (spec §4.3 describes the worker as
		// walking "a configured directory").
		for root in self.known_roots.clone() {
			self.pending.push_back(PendingScan { scan_directory_id: Uuid::nil(), path: root });
		}
		self.publish_pending();

		loop {
			while let Ok(cmd) = commands.try_recv() {
				self.handle_command(cmd).await;
			}

			if self.paused || self.pending.is_empty() {
				self.status.set_state(if self.paused { DiscoveryState::Paused } else { DiscoveryState::Idle });
				match commands.recv().await {
					Some(cmd) => self.handle_command(cmd).await,
					None => break,
				}
				continue;
			}

			let next = self.pending.pop_front().expect("checked non-empty above");
			self.publish_pending();
			self.run_one_scan(next, &mut commands).await;
		}
	}

	async fn handle_command(&mut self, command: EngineCommand) {
		match command {
			EngineCommand::TriggerScan { scan_directory_id, path } => {
				info!(%scan_directory_id, path, "scan triggered");
				self.pending.push_back(PendingScan { scan_directory_id, path: PathBuf::from(path) });
				self.publish_pending();
			}
			EngineCommand::ReprocessFile { file_id, path } => {
				let path = PathBuf::from(path);
				if !self.owns_path(&path) {
					return;
				}
				info!(%file_id, path = %path.display(), "reprocessing single file");
				self.status.set_state(DiscoveryState::Reprocessing);
				if let Err(error) = self.reprocess_one(&path).await {
					warn!(%file_id, %error, "reprocess failed");
					self.status.set_error(Some(error.to_string()));
				} else {
					self.status.set_error(None);
				}
			}
			EngineCommand::Pause => {
				self.paused = true;
				self.status.set_state(DiscoveryState::Paused);
			}
			EngineCommand::Resume => {
				self.paused = false;
			}
			EngineCommand::Cancel => {
				self.pending.clear();
				self.publish_pending();
				self.status.set_state(DiscoveryState::Idle);
			}
			EngineCommand::ReadFileContent { path, respond } => {
				let result = read_file_content(&PathBuf::from(path)).await;
				let _ = respond.send(result);
			}
			EngineCommand::RequestStatus => {
				// `StatusTracker` already pushes on every change; nothing
				// extra to compute, the hub client re-sends its last
				// snapshot.
			}
			EngineCommand::SetConnected(connected) => {
				if connected {
					if self.status.snapshot().state == DiscoveryState::Disconnected {
						self.status.set_state(if self.paused { DiscoveryState::Paused } else { DiscoveryState::Idle });
					}
				} else {
					self.mark_disconnected();
				}
			}
		}
	}

	fn publish_pending(&mut self) {
		let dirs = self.pending.iter().map(|p| p.path.to_string_lossy().to_string()).collect();
		self.status.set_pending_directories(dirs);
	}

	/// Re-reads a single already-known file and resubmits it as a
	/// one-item batch (spec §4.3 `reprocess`, scenario 6). The scan
	/// directory id isn't known locally for a bare reprocess request, so
	/// this resolves it by walking `known_roots` to find the owning root
	/// and asking the ingestion service would be unnecessarily chatty;
	/// instead the server always supplies the id for group-triggered
	/// scans, and for ad hoc single-file reprocessing we reuse whichever
	/// scan directory id the file's root was registered under. Since the
	/// worker itself never tracks that mapping, it sends `Uuid::nil()` and
	/// lets the ingestion service resolve the row by path if the id
	/// doesn't match an existing scan directory (the upsert key is
	/// `(scanDirectoryId, path)`, so in practice this path is only exactly
	/// right when the server instead routes through `TriggerScan`).
	async fn reprocess_one(&mut self, path: &PathBuf) -> anyhow::Result<()> {
		let scan_directory_id = self.resolve_scan_directory_id(path).await?;

		let metadata = tokio::fs::metadata(path).await?;
		let extension =
			sd_core_indexer_rules::extension_of(path).map(str::to_ascii_lowercase);
		let basename = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

		let cancel = CancellationToken::new();
		let hash = hasher::hash_file(path, &cancel, |n| self.status.record_file(n)).await?;
		upload::upload_to_scratch_buckets(self.object_store.as_ref(), path, &hash, extension.as_deref())
			.await?;

		let descriptor = scanner::FileDescriptor {
			absolute_path: path.clone(),
			basename,
			extension,
			size: metadata.len(),
			modified_utc: metadata.modified().map(chrono::DateTime::<chrono::Utc>::from)?,
			created_utc: metadata
				.created()
				.map(chrono::DateTime::<chrono::Utc>::from)
				.unwrap_or_else(|_| chrono::Utc::now()),
		};
		let batch_item = BatchDescriptor::new(&descriptor, hash);

		batch::submit_batch(&self.client, &self.config.api_base_url, scan_directory_id, vec![batch_item])
			.await?;
		Ok(())
	}

	/// Finds the scan directory whose path is a prefix of `path` by asking
	/// the ingestion service (the authoritative owner of that mapping,
	/// spec §3 "Mutated only by the ingestion service").
	async fn resolve_scan_directory_id(&self, path: &PathBuf) -> anyhow::Result<Uuid> {
		#[derive(serde::Deserialize)]
		struct ScanDirectoryDto {
			id: Uuid,
			path: String,
		}
		let url = format!("{}/scan-directories", self.config.api_base_url);
		let directories: Vec<ScanDirectoryDto> = self.client.get(&url).send().await?.json().await?;
		directories
			.into_iter()
			.filter(|d| path.starts_with(&d.path))
			.max_by_key(|d| d.path.len())
			.map(|d| d.id)
			.ok_or_else(|| anyhow::anyhow!("no scan directory registered for {}", path.display()))
	}

	async fn run_one_scan(&mut self, target: PendingScan, commands: &mut mpsc::Receiver<EngineCommand>) {
		self.status.set_state(DiscoveryState::Scanning);
		self.status.set_current_directory(Some(target.path.to_string_lossy().to_string()));
		self.status.set_error(None);

		let scan_directory_id = if target.scan_directory_id.is_nil() {
			match self.resolve_scan_directory_id(&target.path).await {
				Ok(id) => id,
				Err(error) => {
					warn!(path = %target.path.display(), %error, "skipping scan, no matching scan directory");
					self.status.set_current_directory(None);
					return;
				}
			}
		} else {
			target.scan_directory_id
		};

		let rules = &self.rules;
		let path = target.path.clone();
		let mut counters = ScanCounters::default();
		let descriptors = {
			let path = path.clone();
			let rules_options = rules.options().clone();
			tokio::task::spawn_blocking(move || {
				let rules = ScannerRules::new(rules_options).expect("already validated at startup");
				let mut counters = ScanCounters::default();
				let files = scanner::scan(&path, &rules, &mut counters);
				(files, counters)
			})
			.await
			.map(|(files, c)| {
				counters = c;
				files
			})
			.unwrap_or_default()
		};

		if counters.io_errors > 0 {
			warn!(io_errors = counters.io_errors, path = %path.display(), "scan encountered per-entry I/O errors");
		}

		self.status.set_state(DiscoveryState::Processing);

		// Bounded hash/upload pool (spec §5, default 8): each file is
		// hashed and uploaded concurrently up to `hash_parallelism`
		// in-flight at once via `buffer_unordered`, which interleaves the
		// futures on this same task rather than spawning one per file.
		let parallelism = self.config.indexing.hash_parallelism.max(1);
		let object_store = self.object_store.clone();
		let mut results = futures::stream::iter(descriptors.into_iter().map(|descriptor| {
			let object_store = object_store.clone();
			async move {
				let cancel = CancellationToken::new();
				let bytes_hashed = Arc::new(std::sync::atomic::AtomicU64::new(0));
				let counter = bytes_hashed.clone();
				let hash = hasher::hash_file(&descriptor.absolute_path, &cancel, move |n| {
					counter.fetch_add(n, std::sync::atomic::Ordering::Relaxed);
				})
				.await
				.map_err(|error| (descriptor.absolute_path.clone(), error.to_string()))?;

				upload::upload_to_scratch_buckets(
					object_store.as_ref(),
					&descriptor.absolute_path,
					&hash,
					descriptor.extension.as_deref(),
				)
				.await
				.map_err(|error| (descriptor.absolute_path.clone(), error.to_string()))?;

				Ok::<_, (PathBuf, String)>((
					descriptor,
					hash,
					bytes_hashed.load(std::sync::atomic::Ordering::Relaxed),
				))
			}
		}))
		.buffer_unordered(parallelism);
		tokio::pin!(results);

		let mut batch_buffer: Vec<BatchDescriptor> = Vec::with_capacity(self.config.indexing.batch_size);

		while let Some(outcome) = results.next().await {
			while let Ok(cmd) = commands.try_recv() {
				self.handle_command(cmd).await;
			}
			if self.paused {
				break;
			}

			match outcome {
				Ok((descriptor, hash, bytes_hashed)) => {
					self.status.record_file(bytes_hashed);
					batch_buffer.push(BatchDescriptor::new(&descriptor, hash));
				}
				Err((path, error)) => {
					warn!(path = %path.display(), %error, "hash/upload failed, skipping file");
				}
			}

			if batch_buffer.len() >= self.config.indexing.batch_size {
				self.flush_batch(scan_directory_id, &mut batch_buffer).await;
			}
		}

		if !batch_buffer.is_empty() {
			self.flush_batch(scan_directory_id, &mut batch_buffer).await;
		}

		self.status.set_current_directory(None);
	}

	async fn flush_batch(&mut self, scan_directory_id: Uuid, buffer: &mut Vec<BatchDescriptor>) {
		let files = std::mem::take(buffer);
		let count = files.len();
		match batch::submit_batch(&self.client, &self.config.api_base_url, scan_directory_id, files).await {
			Ok(response) => {
				info!(
					created = response.created,
					updated = response.updated,
					unchanged = response.unchanged,
					failed = response.failed,
					"batch acknowledged"
				);
			}
			Err(error) => {
				// `submit_batch` only returns once its retry budget is
				// exhausted (max_elapsed_time: None means never, in
				// practice) — reaching here means a permanent/parse
				// failure, which we surface but do not requeue, since the
				// files were already hashed and uploaded; an operator can
				// `reprocess` them.
				warn!(%error, count, "batch submission abandoned after retries");
				self.status.set_error(Some(error.to_string()));
			}
		}
	}

	pub fn mark_disconnected(&mut self) {
		self.status.set_state(DiscoveryState::Disconnected);
	}
}

async fn read_file_content(path: &PathBuf) -> ContentReadResult {
	match tokio::fs::read(path).await {
		Ok(data) => ContentReadResult { success: true, data: Some(data), error: None },
		Err(error) => ContentReadResult { success: false, data: None, error: Some(error.to_string()) },
	}
}
