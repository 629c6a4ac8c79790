//! Request-local trace id middleware (spec §6.1: "every response carries an
//! `X-Trace-Id` header set from the active trace context (or the
//! request-local identifier if none)"). `ApiError` stamps its own trace id
//! into the error envelope and header already; this layer covers the plain
//! 2xx path, which never passes through `ApiError::into_response`.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub async fn attach_trace_id(request: Request, next: Next) -> Response {
	let mut response = next.run(request).await;

	if !response.headers().contains_key("X-Trace-Id") {
		let trace_id = Uuid::new_v4();
		if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
			response.headers_mut().insert("X-Trace-Id", value);
		}
	}

	response
}
