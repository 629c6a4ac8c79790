//! The shared error taxonomy (spec §7): every operation in this crate
//! returns one of these kinds so callers up in `apps/ingestion-service` can
//! map them onto HTTP statuses without re-deriving the classification.

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} not found")]
	NotFound(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("validation failed: {0}")]
	Validation(String),

	#[error("database error: {0}")]
	Database(#[from] sea_orm::DbErr),
}

pub type Result<T> = std::result::Result<T, Error>;
