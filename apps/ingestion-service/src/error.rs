//! REST error envelope (spec §7, §6.1): `{message, code, traceId}` on every
//! non-2xx response, with `X-Trace-Id` also set on the header.

use axum::{
	http::{HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("{0}")]
	NotFound(String),
	#[error("{0}")]
	Conflict(String),
	#[error("{0}")]
	Validation(String),
	#[error("database error: {0}")]
	Database(#[from] sea_orm::DbErr),
	#[error("internal error: {0}")]
	Internal(#[from] anyhow::Error),
}

impl From<sd_core_db::Error> for ApiError {
	fn from(err: sd_core_db::Error) -> Self {
		match err {
			sd_core_db::Error::NotFound(msg) => ApiError::NotFound(msg),
			sd_core_db::Error::Conflict(msg) => ApiError::Conflict(msg),
			sd_core_db::Error::Validation(msg) => ApiError::Validation(msg),
			sd_core_db::Error::Database(e) => ApiError::Database(e),
		}
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
	message: String,
	code: &'static str,
	trace_id: Uuid,
}

impl ApiError {
	fn code(&self) -> &'static str {
		match self {
			ApiError::NotFound(_) => "not_found",
			ApiError::Conflict(_) => "conflict",
			ApiError::Validation(_) => "validation",
			ApiError::Database(_) | ApiError::Internal(_) => "internal",
		}
	}

	fn status(&self) -> StatusCode {
		match self {
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Conflict(_) => StatusCode::CONFLICT,
			ApiError::Validation(_) => StatusCode::BAD_REQUEST,
			ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let trace_id = Uuid::new_v4();
		let status = self.status();
		tracing::error!(code = self.code(), %trace_id, "request failed: {self}");

		let body = ErrorBody { message: self.to_string(), code: self.code(), trace_id };
		let mut response = (status, Json(body)).into_response();
		if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
			response.headers_mut().insert("X-Trace-Id", value);
		}
		response
	}
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
