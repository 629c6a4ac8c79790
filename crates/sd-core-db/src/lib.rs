pub mod duplicate_engine;
pub mod entities;
pub mod error;
pub mod files;
pub mod migration;
pub mod review_session;
pub mod rules;
pub mod scan_directories;
pub mod scoring;

pub use error::{Error, Result};
pub use migration::Migrator;

#[cfg(test)]
pub(crate) mod test_support {
	use sea_orm::{Database, DatabaseConnection};
	use sea_orm_migration::MigratorTrait;

	/// An in-memory SQLite database with every migration applied, for unit
	/// tests that exercise `duplicate_engine`/`review_session` without a
	/// real Postgres instance.
	pub async fn in_memory_db() -> DatabaseConnection {
		let db = Database::connect("sqlite::memory:").await.expect("open in-memory sqlite");
		crate::Migrator::up(&db, None).await.expect("run migrations");
		db
	}
}
