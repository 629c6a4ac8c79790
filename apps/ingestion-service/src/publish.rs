//! The fan-out publisher (spec §4.4.2): for every file the batch-ingest
//! endpoint marks `should_publish`, raise one `FileDiscovered` event. The
//! bus fans a single publish out to both the metadata and thumbnail
//! queues, so this module never needs to know how many consumers exist.

use sd_bus::{FileDiscovered, MessageBus};
use sd_core_db::duplicate_engine::BatchIngestResult;
use sd_object_store::source_object_key;
use tracing::{info, warn};
use uuid::Uuid;

pub async fn publish_discovered(
	bus: &MessageBus,
	scan_directory_id: Uuid,
	result: &BatchIngestResult,
) {
	for row in result.rows.iter().filter(|r| r.should_publish) {
		let event = FileDiscovered {
			correlation_id: MessageBus::new_correlation_id(),
			indexed_file_id: row.file_id,
			object_key: source_object_key(&row.file_hash),
			scan_directory_id,
			file_path: row.path.clone(),
			file_hash: row.file_hash.clone(),
			file_size: row.size_bytes.max(0) as u64,
		};
		if let Err(error) = bus.publish_file_discovered(&event).await {
			warn!(file_id = %row.file_id, %error, "failed to publish FileDiscovered");
		} else {
			info!(file_id = %row.file_id, hash = %row.file_hash, "published FileDiscovered");
		}
	}
}
