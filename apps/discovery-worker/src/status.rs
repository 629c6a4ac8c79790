//! The discovery worker's live status record (spec §4.3 "Progress and
//! control"). Held in a `watch` channel so the hub client can push a fresh
//! snapshot on every state change and on the 30-second heartbeat without
//! the scan engine needing to know anything about the transport.

use std::time::Duration;

use chrono::Utc;
use sd_hub_protocol::{DiscoveryState, DiscoveryStatus};
use sd_utils::rate::RateWindow;
use tokio::sync::watch;

const RATE_WINDOW: Duration = Duration::from_secs(10);

pub struct StatusTracker {
	hostname: String,
	state: DiscoveryState,
	current_directory: Option<String>,
	files_processed: u64,
	files_rate: RateWindow,
	bytes_rate: RateWindow,
	pending_directories: Vec<String>,
	last_error: Option<String>,
	sender: watch::Sender<DiscoveryStatus>,
}

impl StatusTracker {
	pub fn new(hostname: String) -> (Self, watch::Receiver<DiscoveryStatus>) {
		let initial = DiscoveryStatus {
			hostname: hostname.clone(),
			state: DiscoveryState::Idle,
			current_directory: None,
			files_processed: 0,
			files_per_second: 0.0,
			bytes_per_second: 0.0,
			estimated_seconds_remaining: None,
			pending_directories: Vec::new(),
			last_error: None,
			reported_at: Utc::now(),
		};
		let (sender, receiver) = watch::channel(initial);
		(
			Self {
				hostname,
				state: DiscoveryState::Idle,
				current_directory: None,
				files_processed: 0,
				files_rate: RateWindow::new(RATE_WINDOW),
				bytes_rate: RateWindow::new(RATE_WINDOW),
				pending_directories: Vec::new(),
				last_error: None,
				sender,
			},
			receiver,
		)
	}

	pub fn set_state(&mut self, state: DiscoveryState) {
		self.state = state;
		self.publish();
	}

	pub fn set_current_directory(&mut self, directory: Option<String>) {
		self.current_directory = directory;
		self.publish();
	}

	pub fn set_pending_directories(&mut self, directories: Vec<String>) {
		self.pending_directories = directories;
		self.publish();
	}

	pub fn record_file(&mut self, bytes: u64) {
		self.files_processed += 1;
		self.files_rate.record(1);
		self.bytes_rate.record(bytes);
		self.publish();
	}

	pub fn set_error(&mut self, message: Option<String>) {
		self.last_error = message;
		self.publish();
	}

	/// Remaining count is an estimate from the current rate; `None` once
	/// the rate is zero (nothing in flight, or just started).
	fn estimated_seconds_remaining(files_per_second: f64, remaining_files: u64) -> Option<u64> {
		if files_per_second <= 0.0 {
			None
		} else {
			Some((remaining_files as f64 / files_per_second).round() as u64)
		}
	}

	fn publish(&mut self) {
		let files_per_second = self.files_rate.rate();
		let bytes_per_second = self.bytes_rate.rate();
		let snapshot = DiscoveryStatus {
			hostname: self.hostname.clone(),
			state: self.state,
			current_directory: self.current_directory.clone(),
			files_processed: self.files_processed,
			files_per_second,
			bytes_per_second,
			estimated_seconds_remaining: Self::estimated_seconds_remaining(
				files_per_second,
				self.pending_directories.len() as u64,
			),
			pending_directories: self.pending_directories.clone(),
			last_error: self.last_error.clone(),
			reported_at: Utc::now(),
		};
		let _ = self.sender.send(snapshot);
	}

	pub fn snapshot(&self) -> DiscoveryStatus {
		self.sender.borrow().clone()
	}
}
