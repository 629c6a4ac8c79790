//! Layered configuration (spec §6.5): built-in defaults, then an optional
//! config file, then environment variables, then CLI overrides — the same
//! precedence order the teacher's worker binaries use via the `config`
//! crate, generalized here across all five knob groups the spec names.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
	pub supported_extensions: Vec<String>,
	pub excluded_dirs: Vec<String>,
	pub skip_hidden: bool,
	pub follow_symlinks: bool,
	pub max_depth: usize,
}

impl Default for ScannerConfig {
	fn default() -> Self {
		let defaults = sd_core_indexer_rules::ScannerOptions::default();
		Self {
			supported_extensions: defaults.supported_extensions,
			excluded_dirs: defaults.excluded_dirs,
			skip_hidden: defaults.skip_hidden,
			follow_symlinks: defaults.follow_symlinks,
			max_depth: defaults.max_depth,
		}
	}
}

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
pub struct DuplicateEngineConfig {
	pub conflict_threshold: i32,
	pub page_size: u64,
}

impl Default for DuplicateEngineConfig {
	fn default() -> Self {
		Self { conflict_threshold: sd_core_db::scoring::DEFAULT_CONFLICT_THRESHOLD, page_size: 50 }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	pub bind_addr: String,
	pub database_url: String,
	pub scanner: ScannerConfig,
	pub minio: MinioConfig,
	pub bus: BusConfig,
	pub duplicate_engine: DuplicateEngineConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			bind_addr: "0.0.0.0:7420".to_string(),
			database_url: "sqlite://ingestion.db?mode=rwc".to_string(),
			scanner: ScannerConfig::default(),
			minio: MinioConfig::default(),
			bus: BusConfig::default(),
			duplicate_engine: DuplicateEngineConfig::default(),
		}
	}
}

#[derive(Parser, Debug)]
#[command(name = "ingestion-service", about = "Ingestion and control-plane service")]
struct Args {
	/// Optional TOML config file layered over built-in defaults.
	#[arg(long, env = "INGESTION_CONFIG_FILE")]
	config_file: Option<PathBuf>,

	#[arg(long, env = "BIND_ADDR")]
	bind_addr: Option<String>,

	#[arg(long, env = "CONNECTION_STRING")]
	database_url: Option<String>,
}

impl AppConfig {
	pub fn load() -> anyhow::Result<Self> {
		let args = Args::parse();

		let mut builder = config::Config::builder()
			.add_source(config::Config::try_from(&AppConfig::default())?);

		if let Some(path) = &args.config_file {
			builder = builder.add_source(config::File::from(path.clone()));
		}

		builder = builder.add_source(
			config::Environment::with_prefix("INGESTION").separator("__"),
		);

		let mut cfg: AppConfig = builder.build()?.try_deserialize()?;

		if let Some(bind_addr) = args.bind_addr {
			cfg.bind_addr = bind_addr;
		}
		if let Some(database_url) = args.database_url {
			cfg.database_url = database_url;
		}

		Ok(cfg)
	}
}
