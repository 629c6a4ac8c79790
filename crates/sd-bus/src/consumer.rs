use lapin::options::{BasicAckOptions, BasicNackOptions};

/// A deserialized bus message paired with its underlying delivery handle.
/// Callers must explicitly `ack`/`nack` — the body being parsed does not
/// itself acknowledge anything, so a consumer that dies mid-processing
/// leaves the message redelivered (spec §4.2 "consumers must tolerate
/// duplicate delivery").
pub struct Delivery<T> {
	pub body: T,
	inner: lapin::message::Delivery,
}

impl<T> Delivery<T> {
	pub(crate) fn new(body: T, inner: lapin::message::Delivery) -> Self {
		Self { body, inner }
	}

	/// Acknowledge successful, idempotent application of this message.
	pub async fn ack(self) -> Result<(), lapin::Error> {
		self.inner.ack(BasicAckOptions::default()).await
	}

	/// Requeue for another delivery attempt (transient failure).
	pub async fn nack_requeue(self) -> Result<(), lapin::Error> {
		self.inner
			.nack(BasicNackOptions {
				requeue: true,
				..Default::default()
			})
			.await
	}

	/// Drop without requeue — used once the delivery-count-plus-retry-count
	/// budget (spec §4.6) is exhausted.
	pub async fn dead_letter(self) -> Result<(), lapin::Error> {
		self.inner
			.nack(BasicNackOptions {
				requeue: false,
				..Default::default()
			})
			.await
	}
}
