//! Layered configuration (spec §6.5), same precedence order as the
//! ingestion service: built-in defaults, optional config file, environment,
//! CLI overrides.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioConfig {
	pub endpoint: String,
	pub access_key: String,
	pub secret_key: String,
	pub use_ssl: bool,
	pub region: String,
}

impl Default for MinioConfig {
	fn default() -> Self {
		Self {
			endpoint: "localhost:9000".to_string(),
			access_key: "minioadmin".to_string(),
			secret_key: "minioadmin".to_string(),
			use_ssl: false,
			region: "us-east-1".to_string(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
	pub host: String,
	pub username: String,
	pub password: String,
}

impl Default for BusConfig {
	fn default() -> Self {
		Self { host: "localhost".to_string(), username: "guest".to_string(), password: "guest".to_string() }
	}
}

impl BusConfig {
	pub fn amqp_url(&self) -> String {
		format!("amqp://{}:{}@{}:5672/%2f", self.username, self.password, self.host)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
	pub max_width: u32,
	pub max_height: u32,
	pub jpeg_quality: u8,
}

impl Default for ThumbnailConfig {
	fn default() -> Self {
		let defaults = sd_media::ThumbnailOptions::default();
		Self {
			max_width: defaults.max_width,
			max_height: defaults.max_height,
			jpeg_quality: defaults.jpeg_quality,
		}
	}
}

impl From<&ThumbnailConfig> for sd_media::ThumbnailOptions {
	fn from(cfg: &ThumbnailConfig) -> Self {
		Self { max_width: cfg.max_width, max_height: cfg.max_height, jpeg_quality: cfg.jpeg_quality }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	pub minio: MinioConfig,
	pub bus: BusConfig,
	pub thumbnail: ThumbnailConfig,
	pub prefetch: u16,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			minio: MinioConfig::default(),
			bus: BusConfig::default(),
			thumbnail: ThumbnailConfig::default(),
			prefetch: 8,
		}
	}
}

#[derive(Parser, Debug)]
#[command(name = "thumbnail-worker", about = "Thumbnail generation worker")]
struct Args {
	#[arg(long, env = "THUMBNAIL_WORKER_CONFIG_FILE")]
	config_file: Option<PathBuf>,

	#[arg(long, env = "PREFETCH")]
	prefetch: Option<u16>,
}

impl AppConfig {
	pub fn load() -> anyhow::Result<Self> {
		let args = Args::parse();

		let mut builder =
			config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

		if let Some(path) = &args.config_file {
			builder = builder.add_source(config::File::from(path.clone()));
		}

		builder = builder.add_source(config::Environment::with_prefix("THUMBNAIL_WORKER").separator("__"));

		let mut cfg: AppConfig = builder.build()?.try_deserialize()?;

		if let Some(prefetch) = args.prefetch {
			cfg.prefetch = prefetch;
		}

		Ok(cfg)
	}
}
