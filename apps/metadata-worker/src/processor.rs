//! The metadata worker's per-message pipeline (spec §4.6): download, decode
//! EXIF, publish, delete the scratch object unconditionally.

use std::io::Write;

use sd_bus::{Delivery, FileDiscovered, MessageBus, MetadataExtracted};
use sd_object_store::{ObjectStore, METADATA_IMAGES_BUCKET};
use tracing::warn;

pub async fn handle(
	object_store: &dyn ObjectStore,
	bus: &MessageBus,
	delivery: Delivery<FileDiscovered>,
) {
	let event = delivery.body.clone();

	let bytes = match object_store.get(METADATA_IMAGES_BUCKET, &event.object_key).await {
		Ok(bytes) => bytes,
		Err(sd_object_store::Error::NotFound { .. }) => {
			publish_failure(bus, &event, "source object missing from metadata-images bucket").await;
			let _ = delivery.ack().await;
			return;
		}
		Err(error) => {
			warn!(file_id = %event.indexed_file_id, %error, "transient failure downloading source object");
			let _ = delivery.nack_requeue().await;
			return;
		}
	};

	let outcome = extract(&bytes);

	match outcome {
		Ok(metadata) => publish_success(bus, &event, metadata).await,
		Err(error) => publish_failure(bus, &event, &error.to_string()).await,
	}

	if let Err(error) = object_store.delete(METADATA_IMAGES_BUCKET, &event.object_key).await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to delete scratch metadata object");
	}

	if let Err(error) = delivery.ack().await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to ack file-discovered delivery");
	}
}

fn extract(bytes: &[u8]) -> Result<sd_media::ExifMetadata, sd_media::exif::Error> {
	let mut scratch = tempfile::NamedTempFile::new().map_err(|e| {
		sd_media::exif::Error::Io(std::path::PathBuf::from("<tempfile>"), e)
	})?;
	scratch
		.write_all(bytes)
		.map_err(|e| sd_media::exif::Error::Io(scratch.path().to_path_buf(), e))?;
	sd_media::exif::extract(scratch.path())
}

async fn publish_success(bus: &MessageBus, event: &FileDiscovered, metadata: sd_media::ExifMetadata) {
	let message = MetadataExtracted {
		correlation_id: event.correlation_id,
		indexed_file_id: event.indexed_file_id,
		object_key: event.object_key.clone(),
		success: true,
		error_message: None,
		width: metadata.width,
		height: metadata.height,
		date_taken: metadata.date_taken,
		camera_make: metadata.camera_make,
		camera_model: metadata.camera_model,
		gps_latitude: metadata.gps_latitude,
		gps_longitude: metadata.gps_longitude,
		iso: metadata.iso,
		aperture: metadata.aperture,
		shutter_speed: metadata.shutter_speed,
		orientation: metadata.orientation,
	};
	if let Err(error) = bus.publish_metadata_extracted(&message).await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to publish metadata-extracted event");
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
	fn extracts_dimensions_from_plain_jpeg_bytes() {
		let bytes = jpeg_bytes(64, 32);
		let metadata = extract(&bytes).unwrap();
		assert_eq!(metadata.width, Some(64));
		assert_eq!(metadata.height, Some(32));
		assert!(!metadata.has_any_field());
	}
}

async fn publish_failure(bus: &MessageBus, event: &FileDiscovered, error_message: &str) {
	let message = MetadataExtracted {
		correlation_id: event.correlation_id,
		indexed_file_id: event.indexed_file_id,
		object_key: event.object_key.clone(),
		success: false,
		error_message: Some(error_message.to_string()),
		width: None,
		height: None,
		date_taken: None,
		camera_make: None,
		camera_model: None,
		gps_latitude: None,
		gps_longitude: None,
		iso: None,
		aperture: None,
		shutter_speed: None,
		orientation: None,
	};
	if let Err(error) = bus.publish_metadata_extracted(&message).await {
		warn!(file_id = %event.indexed_file_id, %error, "failed to publish metadata-extracted failure event");
	}
}
