//! Completion consumers (spec §4.4.3): apply `MetadataExtracted` and
//! `ThumbnailGenerated` events to their `IndexedFile` row. Both loops tolerate
//! redelivery — applying the same event twice is a no-op named-field
//! overwrite — and dead-letter once a message has been retried past the
//! configured budget, matching the failure semantics in spec §4.6.

use futures::StreamExt;
use sd_bus::{Delivery, MessageBus, MetadataExtracted, ThumbnailGenerated};
use sd_core_db::duplicate_engine;
use sea_orm::DatabaseConnection;

/// Delivery-count-plus-retry-count budget (spec §4.6 "repeated failures do
/// not spiral"): once a row's own `retry_count` reaches this many failed
/// completions, further failures dead-letter the message instead of
/// requeueing it forever.
const MAX_RETRY_COUNT: i32 = 5;

pub async fn run_metadata_extracted_consumer(bus: MessageBus, db: DatabaseConnection, prefetch: u16) {
	let stream = match bus
		.consume::<MetadataExtracted>(sd_bus::METADATA_EXTRACTED_QUEUE, "ingestion-service", prefetch)
		.await
	{
		Ok(stream) => stream,
		Err(error) => {
			tracing::error!(%error, "failed to open metadata-extracted consumer");
			return;
		}
	};
	tokio::pin!(stream);

	while let Some(delivery) = stream.next().await {
		handle_metadata_extracted(&db, delivery).await;
	}
}

async fn handle_metadata_extracted(db: &DatabaseConnection, delivery: Delivery<MetadataExtracted>) {
	let event = delivery.body.clone();
	let result = duplicate_engine::apply_metadata_extracted(
		db,
		event.indexed_file_id,
		event.success,
		event.error_message,
		event.width.map(|v| v as i32),
		event.height.map(|v| v as i32),
		event.date_taken,
		event.camera_make,
		event.camera_model,
		event.gps_latitude,
		event.gps_longitude,
		event.iso.map(|v| v as i32),
		event.aperture,
		event.shutter_speed,
		event.orientation.map(|v| v as i16),
	)
	.await;

	match result {
		Ok(()) if event.success => {
			if let Err(error) = delivery.ack().await {
				tracing::error!(%error, "failed to ack metadata-extracted delivery");
			}
		}
		Ok(()) => {
			settle_after_failure(db, event.indexed_file_id, delivery).await;
		}
		Err(sd_core_db::Error::NotFound(_)) => {
			// The file row was deleted between discovery and this
			// completion event; nothing left to apply it to.
			let _ = delivery.ack().await;
		}
		Err(error) => {
			tracing::warn!(%error, file_id = %event.indexed_file_id, "failed to apply metadata extracted event");
			let _ = delivery.nack_requeue().await;
		}
	}
}

/// After a worker-reported failure has been recorded on the row, dead-letter
/// the delivery once the row's own retry count exhausts the budget rather
/// than requeue it forever (spec §4.6).
async fn settle_after_failure<T>(db: &DatabaseConnection, file_id: uuid::Uuid, delivery: Delivery<T>) {
	use sd_core_db::entities::indexed_file;
	use sea_orm::EntityTrait;

	let retry_count = indexed_file::Entity::find_by_id(file_id)
		.one(db)
		.await
		.ok()
		.flatten()
		.map(|row| row.retry_count)
		.unwrap_or(0);

	if retry_count >= MAX_RETRY_COUNT {
		tracing::warn!(%file_id, retry_count, "dead-lettering after exhausting retry budget");
		let _ = delivery.dead_letter().await;
	} else {
		let _ = delivery.ack().await;
	}
}

pub async fn run_thumbnail_generated_consumer(bus: MessageBus, db: DatabaseConnection, prefetch: u16) {
	let stream = match bus
		.consume::<ThumbnailGenerated>(sd_bus::THUMBNAIL_GENERATED_QUEUE, "ingestion-service", prefetch)
		.await
	{
		Ok(stream) => stream,
		Err(error) => {
			tracing::error!(%error, "failed to open thumbnail-generated consumer");
			return;
		}
	};
	tokio::pin!(stream);

	while let Some(delivery) = stream.next().await {
		handle_thumbnail_generated(&db, delivery).await;
	}
}

async fn handle_thumbnail_generated(db: &DatabaseConnection, delivery: Delivery<ThumbnailGenerated>) {
	let event = delivery.body.clone();
	let result = duplicate_engine::apply_thumbnail_generated(
		db,
		event.indexed_file_id,
		event.success,
		event.error_message,
		event.thumbnail_object_key,
	)
	.await;

	match result {
		Ok(()) if event.success => {
			if let Err(error) = delivery.ack().await {
				tracing::error!(%error, "failed to ack thumbnail-generated delivery");
			}
		}
		Ok(()) => {
			settle_after_failure(db, event.indexed_file_id, delivery).await;
		}
		Err(sd_core_db::Error::NotFound(_)) => {
			let _ = delivery.ack().await;
		}
		Err(error) => {
			tracing::warn!(%error, file_id = %event.indexed_file_id, "failed to apply thumbnail generated event");
			let _ = delivery.nack_requeue().await;
		}
	}
}
