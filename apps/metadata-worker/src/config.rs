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
pub struct AppConfig {
	pub minio: MinioConfig,
	pub bus: BusConfig,
	/// `lapin` consumer prefetch, the concurrency ceiling for this worker
	/// (spec §5 "each processing worker uses a consumer concurrency equal
	/// to its queue's prefetch limit").
	pub prefetch: u16,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self { minio: MinioConfig::default(), bus: BusConfig::default(), prefetch: 8 }
	}
}

#[derive(Parser, Debug)]
#[command(name = "metadata-worker", about = "EXIF extraction worker")]
struct Args {
	#[arg(long, env = "METADATA_WORKER_CONFIG_FILE")]
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

		builder = builder.add_source(config::Environment::with_prefix("METADATA_WORKER").separator("__"));

		let mut cfg: AppConfig = builder.build()?.try_deserialize()?;

		if let Some(prefetch) = args.prefetch {
			cfg.prefetch = prefetch;
		}

		Ok(cfg)
	}
}
