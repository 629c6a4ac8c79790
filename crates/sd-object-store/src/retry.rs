use std::{future::Future, time::Duration};

use backoff::{future::retry, ExponentialBackoff};

use crate::Error;

/// Every object-store operation is a potential suspension point that can
/// transiently fail (spec §4.1 "all operations must be retry-safe"); this
/// wraps any such call in a bounded exponential backoff.
pub async fn with_retry<T, F, Fut>(operation: &'static str, f: F) -> Result<T, Error>
where
	F: Fn() -> Fut,
	Fut: Future<Output = Result<T, Error>>,
{
	let policy = ExponentialBackoff {
		initial_interval: Duration::from_millis(100),
		max_interval: Duration::from_secs(5),
		max_elapsed_time: Some(Duration::from_secs(30)),
		..Default::default()
	};

	retry(policy, || async {
		f().await.map_err(|error| match error {
			Error::NotFound { .. } => backoff::Error::permanent(error),
			Error::Backend(_) => {
				tracing::warn!(operation, %error, "retrying object store operation");
				backoff::Error::transient(error)
			}
		})
	})
	.await
}
