//! Layered configuration (spec §6.5): built-in defaults, optional config
//! file, environment variables, CLI overrides — same precedence order as
//! the other binaries in this workspace.

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

impl ScannerConfig {
	pub fn into_options(self) -> sd_core_indexer_rules::ScannerOptions {
		sd_core_indexer_rules::ScannerOptions {
			supported_extensions: self.supported_extensions,
			excluded_dirs: self.excluded_dirs,
			skip_hidden: self.skip_hidden,
			follow_symlinks: self.follow_symlinks,
			max_depth: self.max_depth,
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

/// Spec §6.5 `IndexingOptions`: batch size, hash/upload parallelism, and
/// (not implemented here — see DESIGN.md) the legacy single-node mode flag,
/// which this rewrite never supports since every deployment runs the
/// processing workers as separate processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
	pub batch_size: usize,
	pub hash_parallelism: usize,
	/// Bound on batches queued for POST before the scanner pauses itself
	/// (spec §4.3 "additional batches queue up to a bounded buffer, beyond
	/// which the scanner pauses until drain").
	pub pending_batch_buffer: usize,
}

impl Default for IndexingConfig {
	fn default() -> Self {
		Self { batch_size: 250, hash_parallelism: 8, pending_batch_buffer: 16 }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	pub api_base_url: String,
	pub hostname: String,
	pub indexer_id: String,
	pub scan_roots: Vec<String>,
	pub scanner: ScannerConfig,
	pub indexing: IndexingConfig,
	pub minio: MinioConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base_url: "http://localhost:7420".to_string(),
			hostname: default_hostname(),
			indexer_id: uuid::Uuid::new_v4().to_string(),
			scan_roots: Vec::new(),
			scanner: ScannerConfig::default(),
			indexing: IndexingConfig::default(),
			minio: MinioConfig::default(),
		}
	}
}

fn default_hostname() -> String {
	std::env::var("HOSTNAME").unwrap_or_else(|_| "discovery-worker".to_string())
}

impl AppConfig {
	pub fn hub_url(&self) -> String {
		let base = self.api_base_url.replacen("http://", "ws://", 1).replacen("https://", "wss://", 1);
		format!("{base}/hubs/indexer?indexerId={}&hostname={}", self.indexer_id, self.hostname)
	}
}

#[derive(Parser, Debug)]
#[command(name = "discovery-worker", about = "Filesystem discovery and hashing worker")]
struct Args {
	#[arg(long, env = "DISCOVERY_WORKER_CONFIG_FILE")]
	config_file: Option<PathBuf>,

	#[arg(long, env = "API_BASE_URL")]
	api_base_url: Option<String>,

	/// Comma-separated list of absolute scan-root paths this worker walks.
	#[arg(long, env = "SCAN_ROOTS", value_delimiter = ',')]
	scan_roots: Option<Vec<String>>,
}

impl AppConfig {
	pub fn load() -> anyhow::Result<Self> {
		let args = Args::parse();

		let mut builder =
			config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

		if let Some(path) = &args.config_file {
			builder = builder.add_source(config::File::from(path.clone()));
		}

		builder = builder.add_source(config::Environment::with_prefix("DISCOVERY").separator("__"));

		let mut cfg: AppConfig = builder.build()?.try_deserialize()?;

		if let Some(api_base_url) = args.api_base_url {
			cfg.api_base_url = api_base_url;
		}
		if let Some(scan_roots) = args.scan_roots {
			cfg.scan_roots = scan_roots;
		}

		Ok(cfg)
	}
}
