//! Bootstraps the ingestion / control-plane service (spec §4.4): runs
//! migrations, connects the bus/object-store/hub, spawns the completion
//! consumers, then serves the REST + WebSocket surface (§6.1, §6.2) until a
//! shutdown signal arrives.

mod config;
mod consumers;
mod error;
mod hub;
mod publish;
mod routes;
mod state;
mod trace;

use std::sync::Arc;

use sd_object_store::{ObjectStore, S3Config, S3ObjectStore, METADATA_IMAGES_BUCKET, THUMBNAILS_BUCKET, THUMBNAIL_IMAGES_BUCKET};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::{config::AppConfig, hub::Hub, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,ingestion_service=debug".into()),
		)
		.init();

	let config = AppConfig::load()?;

	let db = Database::connect(&config.database_url).await?;
	sd_core_db::Migrator::up(&db, None).await?;
	info!("database migrations applied");

	let bus = sd_bus::MessageBus::connect(&config.bus.amqp_url()).await?;
	info!("connected to message bus");

	let object_store = S3ObjectStore::new(&S3Config {
		endpoint: config.minio.endpoint.clone(),
		access_key: config.minio.access_key.clone(),
		secret_key: config.minio.secret_key.clone(),
		use_ssl: config.minio.use_ssl,
		region: config.minio.region.clone(),
	});
	for bucket in [METADATA_IMAGES_BUCKET, THUMBNAIL_IMAGES_BUCKET, THUMBNAILS_BUCKET] {
		object_store.ensure_bucket(bucket).await?;
	}
	info!("object store buckets ready");

	let hub = Hub::new();

	let state = AppState {
		db: db.clone(),
		bus: Arc::new(bus.clone()),
		object_store: Arc::new(object_store),
		hub,
		config: Arc::new(config.clone()),
	};

	tokio::spawn(consumers::run_metadata_extracted_consumer(bus.clone(), db.clone(), 8));
	tokio::spawn(consumers::run_thumbnail_generated_consumer(bus.clone(), db.clone(), 8));

	let app = routes::build(state);

	let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
	info!(addr = %config.bind_addr, "ingestion service listening");

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	Ok(())
}

/// Waits for either Ctrl-C or a platform SIGTERM so the drain-then-close
/// contract in spec §5 ("workers shut down cleanly by draining in-flight
/// consumer messages then closing the hub connection") can be honored by
/// whatever orchestrator stops this process.
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

	info!("shutdown signal received, draining in-flight work");
}
