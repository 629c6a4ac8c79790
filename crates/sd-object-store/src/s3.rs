use async_trait::async_trait;
use aws_sdk_s3::{
	config::{Credentials, Region},
	error::SdkError,
	primitives::ByteStream,
	Client,
};
use bytes::Bytes;
use tracing::instrument;

use crate::{retry::with_retry, Error, ObjectStore};

#[derive(Debug, Clone)]
pub struct S3Config {
	pub endpoint: String,
	pub access_key: String,
	pub secret_key: String,
	pub use_ssl: bool,
	pub region: String,
}

#[derive(Clone)]
pub struct S3ObjectStore {
	client: Client,
}

impl S3ObjectStore {
	#[must_use]
	pub fn new(cfg: &S3Config) -> Self {
		let scheme = if cfg.use_ssl { "https" } else { "http" };
		let endpoint_url = format!("{scheme}://{}", cfg.endpoint);

		let credentials = Credentials::new(
			&cfg.access_key,
			&cfg.secret_key,
			None,
			None,
			"sd-object-store",
		);

		let s3_config = aws_sdk_s3::Config::builder()
			.region(Region::new(cfg.region.clone()))
			.endpoint_url(endpoint_url)
			.credentials_provider(credentials)
			.force_path_style(true)
			.build();

		Self {
			client: Client::from_conf(s3_config),
		}
	}
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
	#[instrument(skip(self))]
	async fn ensure_bucket(&self, bucket: &str) -> Result<(), Error> {
		with_retry("ensure_bucket", || async {
			match self.client.head_bucket().bucket(bucket).send().await {
				Ok(_) => Ok(()),
				Err(SdkError::ServiceError(e)) if e.err().is_not_found() => self
					.client
					.create_bucket()
					.bucket(bucket)
					.send()
					.await
					.map(|_| ())
					.map_err(|e| Error::Backend(e.to_string())),
				Err(e) => Err(Error::Backend(e.to_string())),
			}
		})
		.await
	}

	#[instrument(skip(self, body))]
	async fn put(
		&self,
		bucket: &str,
		key: &str,
		body: Bytes,
		content_type: &str,
	) -> Result<(), Error> {
		with_retry("put_object", || {
			let body = body.clone();
			async move {
				self.client
					.put_object()
					.bucket(bucket)
					.key(key)
					.content_type(content_type)
					.body(ByteStream::from(body))
					.send()
					.await
					.map(|_| ())
					.map_err(|e| Error::Backend(e.to_string()))
			}
		})
		.await
	}

	#[instrument(skip(self))]
	async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, Error> {
		with_retry("get_object", || async {
			let response = self
				.client
				.get_object()
				.bucket(bucket)
				.key(key)
				.send()
				.await
				.map_err(|e| match e {
					SdkError::ServiceError(ref se) if se.err().is_no_such_key() => Error::NotFound {
						bucket: bucket.to_string(),
						key: key.to_string(),
					},
					other => Error::Backend(other.to_string()),
				})?;

			response
				.body
				.collect()
				.await
				.map(|data| data.into_bytes())
				.map_err(|e| Error::Backend(e.to_string()))
		})
		.await
	}

	#[instrument(skip(self))]
	async fn delete(&self, bucket: &str, key: &str) -> Result<(), Error> {
		with_retry("delete_object", || async {
			self.client
				.delete_object()
				.bucket(bucket)
				.key(key)
				.send()
				.await
				.map(|_| ())
				.map_err(|e| Error::Backend(e.to_string()))
		})
		.await
	}
}
