use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every bus message carries these three fields (spec §6.3) so consumers can
/// reconcile redeliveries without relying on ordering between queues.
pub trait Envelope {
	fn correlation_id(&self) -> Uuid;
	fn indexed_file_id(&self) -> Uuid;
	fn object_key(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiscovered {
	pub correlation_id: Uuid,
	pub indexed_file_id: Uuid,
	pub object_key: String,
	pub scan_directory_id: Uuid,
	pub file_path: String,
	pub file_hash: String,
	pub file_size: u64,
}

impl Envelope for FileDiscovered {
	fn correlation_id(&self) -> Uuid {
		self.correlation_id
	}
	fn indexed_file_id(&self) -> Uuid {
		self.indexed_file_id
	}
	fn object_key(&self) -> &str {
		&self.object_key
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataExtracted {
	pub correlation_id: Uuid,
	pub indexed_file_id: Uuid,
	pub object_key: String,
	pub success: bool,
	pub error_message: Option<String>,
	pub width: Option<u32>,
	pub height: Option<u32>,
	pub date_taken: Option<DateTime<Utc>>,
	pub camera_make: Option<String>,
	pub camera_model: Option<String>,
	pub gps_latitude: Option<f64>,
	pub gps_longitude: Option<f64>,
	pub iso: Option<u32>,
	pub aperture: Option<String>,
	pub shutter_speed: Option<String>,
	pub orientation: Option<u16>,
}

impl Envelope for MetadataExtracted {
	fn correlation_id(&self) -> Uuid {
		self.correlation_id
	}
	fn indexed_file_id(&self) -> Uuid {
		self.indexed_file_id
	}
	fn object_key(&self) -> &str {
		&self.object_key
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailGenerated {
	pub correlation_id: Uuid,
	pub indexed_file_id: Uuid,
	pub object_key: String,
	pub success: bool,
	pub error_message: Option<String>,
	pub thumbnail_object_key: Option<String>,
}

impl Envelope for ThumbnailGenerated {
	fn correlation_id(&self) -> Uuid {
		self.correlation_id
	}
	fn indexed_file_id(&self) -> Uuid {
		self.indexed_file_id
	}
	fn object_key(&self) -> &str {
		&self.object_key
	}
}
