//! A thin wrapper around `lapin` providing the one topic / four queues
//! topology the pipeline needs (spec §4.2), plus typed publish/consume for
//! the three envelope shapes in §6.3. Every consumer tolerates redelivery by
//! construction: callers ack only after the downstream row update commits.

mod consumer;
pub mod messages;
mod topology;

pub use consumer::Delivery;
pub use messages::{Envelope, FileDiscovered, MetadataExtracted, ThumbnailGenerated};
pub use topology::{
	FILE_DISCOVERED_EXCHANGE, METADATA_EXTRACTED_QUEUE, METADATA_QUEUE, THUMBNAIL_GENERATED_QUEUE,
	THUMBNAIL_QUEUE,
};

use futures::StreamExt;
use lapin::{
	options::{
		BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, ExchangeDeclareOptions,
		QueueBindOptions, QueueDeclareOptions,
	},
	types::FieldTable,
	BasicProperties, Connection, ConnectionProperties, ExchangeKind,
};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("bus connection error: {0}")]
	Connection(#[from] lapin::Error),
	#[error("failed to serialize bus message: {0}")]
	Serialize(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct MessageBus {
	channel: lapin::Channel,
}

impl MessageBus {
	/// Connects and declares the full topology: the `FileDiscovered` topic
	/// exchange fanning out to the metadata/thumbnail queues, plus the two
	/// single-consumer completion queues.
	#[instrument(skip(amqp_url))]
	pub async fn connect(amqp_url: &str) -> Result<Self, Error> {
		let conn = Connection::connect(amqp_url, ConnectionProperties::default()).await?;
		let channel = conn.create_channel().await?;

		channel
			.exchange_declare(
				FILE_DISCOVERED_EXCHANGE,
				ExchangeKind::Fanout,
				ExchangeDeclareOptions {
					durable: true,
					..Default::default()
				},
				FieldTable::default(),
			)
			.await?;

		for queue in [METADATA_QUEUE, THUMBNAIL_QUEUE] {
			channel
				.queue_declare(
					queue,
					QueueDeclareOptions {
						durable: true,
						..Default::default()
					},
					FieldTable::default(),
				)
				.await?;
			channel
				.queue_bind(
					queue,
					FILE_DISCOVERED_EXCHANGE,
					"",
					QueueBindOptions::default(),
					FieldTable::default(),
				)
				.await?;
		}

		for queue in [METADATA_EXTRACTED_QUEUE, THUMBNAIL_GENERATED_QUEUE] {
			channel
				.queue_declare(
					queue,
					QueueDeclareOptions {
						durable: true,
						..Default::default()
					},
					FieldTable::default(),
				)
				.await?;
		}

		info!("message bus topology ready");
		Ok(Self { channel })
	}

	async fn publish_json(
		&self,
		exchange: &str,
		routing_key: &str,
		body: &impl serde::Serialize,
	) -> Result<(), Error> {
		let payload = serde_json::to_vec(body)?;
		self.channel
			.basic_publish(
				exchange,
				routing_key,
				BasicPublishOptions::default(),
				&payload,
				BasicProperties::default().with_delivery_mode(2), // persistent
			)
			.await?
			.await?;
		Ok(())
	}

	/// Publishes once to the shared topic; the exchange fans a copy out to
	/// both durable per-worker queues (spec §4.4.2).
	pub async fn publish_file_discovered(&self, event: &FileDiscovered) -> Result<(), Error> {
		self.publish_json(FILE_DISCOVERED_EXCHANGE, "", event).await
	}

	pub async fn publish_metadata_extracted(
		&self,
		event: &MetadataExtracted,
	) -> Result<(), Error> {
		self.publish_json("", METADATA_EXTRACTED_QUEUE, event).await
	}

	pub async fn publish_thumbnail_generated(
		&self,
		event: &ThumbnailGenerated,
	) -> Result<(), Error> {
		self.publish_json("", THUMBNAIL_GENERATED_QUEUE, event).await
	}

	/// Opens a consumer on `queue` with the given prefetch limit, which acts
	/// as the bus-provided backpressure mechanism for processing workers
	/// (spec §5 "Backpressure").
	pub async fn consume<T>(
		&self,
		queue: &str,
		consumer_tag: &str,
		prefetch: u16,
	) -> Result<impl futures::Stream<Item = Delivery<T>>, Error>
	where
		T: serde::de::DeserializeOwned + Send + 'static,
	{
		self.channel
			.basic_qos(prefetch, BasicQosOptions::default())
			.await?;

		let consumer = self
			.channel
			.basic_consume(
				queue,
				consumer_tag,
				BasicConsumeOptions::default(),
				FieldTable::default(),
			)
			.await?;

		Ok(consumer.filter_map(|delivery| async move {
			let delivery = delivery.ok()?;
			match serde_json::from_slice::<T>(&delivery.data) {
				Ok(body) => Some(Delivery::new(body, delivery)),
				Err(error) => {
					tracing::error!(%error, "dropping bus message with unparseable body");
					None
				}
			}
		}))
	}

	#[must_use]
	pub fn new_correlation_id() -> Uuid {
		Uuid::new_v4()
	}
}
