//! The thumbnail worker's per-message pipeline (spec §4.6): download,
//! resize/encode, upload to the derivative bucket, publish, delete the
//! scratch object unconditionally.

use bytes::Bytes;
use sd_bus::{Delivery, FileDiscovered, MessageBus, ThumbnailGenerated};
use sd_media::ThumbnailOptions;
use sd_object_store::{thumbnail_object_key, ObjectStore, THUMBNAILS_BUCKET, THUMBNAIL_IMAGES_BUCKET};
use tracing::warn;

pub async fn handle(
	object_store: &dyn ObjectStore,
	bus: &MessageBus,
	options: ThumbnailOptions,
	delivery: Delivery<FileDiscovered>,
) {
	let event = delivery.body.clone();

	let bytes = match object_store.get(THUMBNAIL_IMAGES_BUCKET, &event.object_key).await {
		Ok(bytes) => bytes,
		Err(sd_object_store::Error::NotFound { .. }) => {
			publish_failure(bus, &event, "source object missing from thumbnail-images bucket").await;
			let _ = delivery.ack().await;
			return;
		}
		Err(error) => {
			warn!(file_id = %event.indexed_file_id, %error, "transient failure downloading source object");
			let _ = delivery.nack_requeue().await;
			return;
		}
	};

	match sd_media::thumbnail::generate(&bytes, options) {
		Ok(thumbnail) => {
			let key = thumbnail_object_key(&event.file_hash);
			match object_store.put(THUMBNAILS_BUCKET, &key, Bytes::from(thumbnail), "image/jpeg").await {
				Ok(()) => publish_success(bus, &event, key).await,
				Err(error) => publish_failure(bus, &event, &error.to_string()).await,
			}
		}
		Err(error) => publish_failure(bus, &event, &error.to_string()).await,
	}

	if let Err(error) = object_store.delete(THUMBNAIL_IMAGES_BUCKET, &event.object_key).await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to delete scratch thumbnail-input object");
	}

	if let Err(error) = delivery.ack().await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to ack file-discovered delivery");
	}
}

async fn publish_success(bus: &MessageBus, event: &FileDiscovered, thumb_key: String) {
	let message = ThumbnailGenerated {
		correlation_id: event.correlation_id,
		indexed_file_id: event.indexed_file_id,
		object_key: event.object_key.clone(),
		success: true,
		error_message: None,
		thumbnail_object_key: Some(thumb_key),
	};
	if let Err(error) = bus.publish_thumbnail_generated(&message).await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to publish thumbnail-generated event");
	}
}

async fn publish_failure(bus: &MessageBus, event: &FileDiscovered, error_message: &str) {
	let message = ThumbnailGenerated {
		correlation_id: event.correlation_id,
		indexed_file_id: event.indexed_file_id,
		object_key: event.object_key.clone(),
		success: false,
		error_message: Some(error_message.to_string()),
		thumbnail_object_key: None,
	};
	if let Err(error) = bus.publish_thumbnail_generated(&message).await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to publish thumbnail-generated failure event");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
		let image = image::DynamicImage::new_rgb8(width, height);
		let mut buf = Vec::new();
		image
			.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)
			.unwrap();
		buf
	}

	#[test]
	fn generate_downscales_within_configured_bounds() {
		let bytes = jpeg_bytes(900, 450);
		let options = ThumbnailOptions { max_width: 300, max_height: 300, jpeg_quality: 85 };
		let thumb = sd_media::thumbnail::generate(&bytes, options).unwrap();
		let decoded = image::load_from_memory(&thumb).unwrap();
		use image::GenericImageView;
		let (w, h) = decoded.dimensions();
		assert!(w <= 300 && h <= 300);
	}
}
