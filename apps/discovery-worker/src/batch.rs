//! Batching discipline and the HTTP client for `POST /files/batch` (spec
//! §4.3 "Batching discipline", §4.4.1). A batch is only dropped from the
//! local cursor once the ingestion service has acknowledged it; a failed
//! POST is retried with exponential backoff without losing the batch.

use std::time::Duration;

use backoff::{future::retry, ExponentialBackoff};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scanner::FileDescriptor;

#[derive(Debug, Clone, Serialize)]
pub struct BatchDescriptor {
	pub path: String,
	pub basename: String,
	pub extension: Option<String>,
	pub file_hash: String,
	pub size_bytes: i64,
	pub fs_created_at: DateTime<Utc>,
	pub fs_modified_at: DateTime<Utc>,
}

impl BatchDescriptor {
	pub fn new(descriptor: &FileDescriptor, hash: String) -> Self {
		Self {
			path: descriptor.absolute_path.to_string_lossy().to_string(),
			basename: descriptor.basename.clone(),
			extension: descriptor.extension.clone(),
			file_hash: hash,
			size_bytes: descriptor.size as i64,
			fs_created_at: descriptor.created_utc,
			fs_modified_at: descriptor.modified_utc,
		}
	}
}

#[derive(Debug, Serialize)]
struct BatchIngestBody {
	scan_directory_id: Uuid,
	files: Vec<BatchDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct BatchIngestResponseRow {
	pub path: String,
	pub file_id: Uuid,
	pub outcome: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchIngestResponse {
	pub created: u32,
	pub updated: u32,
	pub unchanged: u32,
	pub failed: u32,
	pub rows: Vec<BatchIngestResponseRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("batch submission failed after retry budget: {0}")]
	Exhausted(String),
}

/// Submits one batch, retrying the whole POST with exponential backoff on
/// transient failure. Never gives up: a batch that can't be delivered
/// blocks the caller (and, transitively, the scan loop) rather than being
/// dropped, matching spec §4.3 "the worker does not advance its local
/// cursor until acknowledgement".
pub async fn submit_batch(
	client: &reqwest::Client,
	api_base_url: &str,
	scan_directory_id: Uuid,
	files: Vec<BatchDescriptor>,
) -> Result<BatchIngestResponse, Error> {
	let body = BatchIngestBody { scan_directory_id, files };
	let url = format!("{api_base_url}/files/batch");

	let policy = ExponentialBackoff {
		initial_interval: Duration::from_millis(500),
		max_interval: Duration::from_secs(30),
		max_elapsed_time: None, // per spec: block until acknowledged, don't give up
		..Default::default()
	};

	retry(policy, || {
		let client = client.clone();
		let url = url.clone();
		let body = &body;
		async move {
			let response = client.post(&url).json(body).send().await.map_err(|error| {
				tracing::warn!(%error, "batch POST failed, retrying");
				backoff::Error::transient(Error::Exhausted(error.to_string()))
			})?;

			if !response.status().is_success() {
				let status = response.status();
				return Err(backoff::Error::transient(Error::Exhausted(format!(
					"ingestion service responded {status}"
				))));
			}

			response.json::<BatchIngestResponse>().await.map_err(|error| {
				backoff::Error::permanent(Error::Exhausted(format!("malformed response body: {error}")))
			})
		}
	})
	.await
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn descriptor_carries_hash_and_timestamps_through() {
		let descriptor = FileDescriptor {
			absolute_path: "/r/a.jpg".into(),
			basename: "a.jpg".into(),
			extension: Some("jpg".into()),
			size: 100,
			modified_utc: Utc::now(),
			created_utc: Utc::now(),
		};
		let batch = BatchDescriptor::new(&descriptor, "abc123".into());
		assert_eq!(batch.path, "/r/a.jpg");
		assert_eq!(batch.file_hash, "abc123");
		assert_eq!(batch.size_bytes, 100);
	}
}
