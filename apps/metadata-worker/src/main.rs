//! Bootstraps the metadata worker (spec §4.6): connects the bus and object
//! store, then consumes `FileDiscovered` off its durable queue until shut
//! down.

mod config;
mod processor;

use futures::StreamExt;
use sd_object_store::{ObjectStore, S3Config, S3ObjectStore, METADATA_IMAGES_BUCKET};
use tracing::info;

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,metadata_worker=debug".into()),
		)
		.init();

	let config = AppConfig::load()?;

	let bus = sd_bus::MessageBus::connect(&config.bus.amqp_url()).await?;
	info!("connected to message bus");

	let object_store = S3ObjectStore::new(&S3Config {
		endpoint: config.minio.endpoint.clone(),
		access_key: config.minio.access_key.clone(),
		secret_key: config.minio.secret_key.clone(),
		use_ssl: config.minio.use_ssl,
		region: config.minio.region.clone(),
	});
	object_store.ensure_bucket(METADATA_IMAGES_BUCKET).await?;

	let stream = bus
		.consume::<sd_bus::FileDiscovered>(sd_bus::METADATA_QUEUE, "metadata-worker", config.prefetch)
		.await?;
	tokio::pin!(stream);

	info!(prefetch = config.prefetch, "metadata worker ready");

	let mut shutdown = Box::pin(shutdown_signal());
	loop {
		tokio::select! {
			delivery = stream.next() => {
				let Some(delivery) = delivery else { break };
				processor::handle(&object_store, &bus, delivery).await;
			}
			_ = &mut shutdown => {
				info!("shutdown signal received, draining in-flight deliveries");
				break;
			}
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
