//! Bootstraps the discovery worker (spec §4.3): connects the object store
//! and the control channel, then walks its configured scan roots and any
//! hub-triggered scans until shut down.

mod batch;
mod config;
mod engine;
mod hasher;
mod hub_client;
mod scanner;
mod status;
mod upload;

use std::sync::Arc;

use sd_object_store::{ObjectStore, S3Config, S3ObjectStore};
use tokio::sync::mpsc;
use tracing::info;

use crate::config::AppConfig;
use crate::engine::Engine;
use crate::status::StatusTracker;

const ENGINE_COMMAND_QUEUE_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,discovery_worker=debug".into()),
		)
		.init();

	let config = AppConfig::load()?;

	let object_store = S3ObjectStore::new(&S3Config {
		endpoint: config.minio.endpoint.clone(),
		access_key: config.minio.access_key.clone(),
		secret_key: config.minio.secret_key.clone(),
		use_ssl: config.minio.use_ssl,
		region: config.minio.region.clone(),
	});
	object_store.ensure_bucket(sd_object_store::METADATA_IMAGES_BUCKET).await?;
	object_store.ensure_bucket(sd_object_store::THUMBNAIL_IMAGES_BUCKET).await?;
	let object_store: Arc<dyn ObjectStore> = Arc::new(object_store);

	let (status_tracker, status_rx) = StatusTracker::new(config.hostname.clone());
	let hub_url = config.hub_url();

	let engine = Engine::new(config, object_store, status_tracker)?;
	let (engine_tx, engine_rx) = mpsc::channel(ENGINE_COMMAND_QUEUE_CAPACITY);

	info!(hub_url, "discovery worker starting");

	let engine_task = tokio::spawn(engine.run(engine_rx));
	let hub_task = tokio::spawn(hub_client::run(hub_url, engine_tx, status_rx));

	let mut shutdown = Box::pin(shutdown_signal());
	tokio::select! {
		_ = &mut shutdown => {
			info!("shutdown signal received");
		}
		_ = engine_task => {
			info!("scan engine exited");
		}
		_ = hub_task => {
			info!("hub client exited");
		}
	}

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
