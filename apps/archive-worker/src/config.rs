//! Layered configuration (spec §6.5). `DryRunEnabled` is read once at
//! startup and never changed afterwards — the hub's `SetDryRun` command is
//! accepted and logged but has no effect (spec §9 "Dry-run semantics
//! boundary", DESIGN.md).

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	pub api_base_url: String,
	pub hostname: String,
	pub cleaner_id: String,
	/// Root directory under which archived files are relocated, preserving
	/// their relative path under the scan root (spec §6.4).
	pub trash_root: String,
	pub dry_run: bool,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base_url: "http://localhost:7420".to_string(),
			hostname: default_hostname(),
			cleaner_id: uuid::Uuid::new_v4().to_string(),
			trash_root: "/var/lib/photo-pipeline/trash".to_string(),
			dry_run: false,
		}
	}
}

fn default_hostname() -> String {
	std::env::var("HOSTNAME").unwrap_or_else(|_| "archive-worker".to_string())
}

impl AppConfig {
	pub fn hub_url(&self) -> String {
		let base = self.api_base_url.replacen("http://", "ws://", 1).replacen("https://", "wss://", 1);
		format!("{base}/hubs/cleaner?cleanerId={}&hostname={}", self.cleaner_id, self.hostname)
	}
}

#[derive(Parser, Debug)]
#[command(name = "archive-worker", about = "Cleaner/archive worker")]
struct Args {
	#[arg(long, env = "ARCHIVE_WORKER_CONFIG_FILE")]
	config_file: Option<PathBuf>,

	#[arg(long, env = "API_BASE_URL")]
	api_base_url: Option<String>,

	#[arg(long, env = "TRASH_ROOT")]
	trash_root: Option<String>,

	#[arg(long, env = "DRY_RUN_ENABLED")]
	dry_run: Option<bool>,
}

impl AppConfig {
	pub fn load() -> anyhow::Result<Self> {
		let args = Args::parse();

		let mut builder =
			config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

		if let Some(path) = &args.config_file {
			builder = builder.add_source(config::File::from(path.clone()));
		}

		builder = builder.add_source(config::Environment::with_prefix("ARCHIVE").separator("__"));

		let mut cfg: AppConfig = builder.build()?.try_deserialize()?;

		if let Some(api_base_url) = args.api_base_url {
			cfg.api_base_url = api_base_url;
		}
		if let Some(trash_root) = args.trash_root {
			cfg.trash_root = trash_root;
		}
		if let Some(dry_run) = args.dry_run {
			cfg.dry_run = dry_run;
		}

		Ok(cfg)
	}
}
