//! The manual review session state machine (spec §4.4.5). Grounded in the
//! teacher's `sd-core-location-scan`'s single-active-job discipline
//! (`location_scan/mod.rs` tracks at most one in-flight scan per location)
//! generalized here to "at most one active session per deployment".

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::duplicate_engine;
use crate::entities::{selection_session, SelectionSessionStatus};
use crate::error::{Error, Result};

/// `start(resumeExisting)` (spec §4.4.5): re-attaches to the single
/// `active` session if `resume_existing` is true and one exists,
/// otherwise errors if one already exists (a second concurrent session
/// would violate the single-active-session invariant), otherwise creates
/// a fresh one.
pub async fn start(db: &DatabaseConnection, resume_existing: bool) -> Result<selection_session::Model> {
	let active = find_active(db).await?;

	match (active, resume_existing) {
		(Some(session), true) => {
			let mut active: selection_session::ActiveModel = session.into();
			active.resumed_at = Set(Some(Utc::now()));
			active.last_activity_at = Set(Utc::now());
			Ok(active.update(db).await?)
		}
		(Some(_), false) => Err(Error::Conflict(
			"a review session is already active".to_string(),
		)),
		(None, _) => {
			let now = Utc::now();
			let model = selection_session::ActiveModel {
				id: Set(Uuid::new_v4()),
				status: Set(SelectionSessionStatus::Active),
				created_at: Set(now),
				resumed_at: Set(None),
				completed_at: Set(None),
				proposed_count: Set(0),
				validated_count: Set(0),
				skipped_count: Set(0),
				current_group_id: Set(None),
				last_activity_at: Set(now),
			};
			Ok(model.insert(db).await?)
		}
	}
}

async fn find_active(db: &DatabaseConnection) -> Result<Option<selection_session::Model>> {
	Ok(selection_session::Entity::find()
		.filter(selection_session::Column::Status.eq(SelectionSessionStatus::Active))
		.one(db)
		.await?)
}

async fn require_active(db: &DatabaseConnection) -> Result<selection_session::Model> {
	find_active(db)
		.await?
		.ok_or_else(|| Error::Conflict("no active review session".to_string()))
}

/// `propose(groupId, fileId)`: records the group as the session's current
/// one and triggers `setOriginal`'s side-effects on it (spec §4.4.5).
pub async fn propose(db: &DatabaseConnection, group_id: Uuid, file_id: Uuid) -> Result<()> {
	let session = require_active(db).await?;

	duplicate_engine::set_original(db, group_id, file_id).await?;

	let mut active: selection_session::ActiveModel = session.into();
	active.current_group_id = Set(Some(group_id));
	active.proposed_count = Set(active.proposed_count.clone().unwrap() + 1);
	active.last_activity_at = Set(Utc::now());
	active.update(db).await?;
	Ok(())
}

/// `validate(groupId)`: confirms the current proposal without changing
/// which file is original; only bumps the session's counters.
pub async fn validate(db: &DatabaseConnection, group_id: Uuid) -> Result<()> {
	let session = require_active(db).await?;
	if session.current_group_id != Some(group_id) {
		return Err(Error::Validation(format!(
			"group {group_id} is not the session's current group"
		)));
	}

	let mut active: selection_session::ActiveModel = session.into();
	active.validated_count = Set(active.validated_count.clone().unwrap() + 1);
	active.last_activity_at = Set(Utc::now());
	active.update(db).await?;
	Ok(())
}

/// `skip(groupId)`: moves past the group without resolving it.
pub async fn skip(db: &DatabaseConnection, group_id: Uuid) -> Result<()> {
	let session = require_active(db).await?;
	if session.current_group_id != Some(group_id) {
		return Err(Error::Validation(format!(
			"group {group_id} is not the session's current group"
		)));
	}

	let mut active: selection_session::ActiveModel = session.into();
	active.skipped_count = Set(active.skipped_count.clone().unwrap() + 1);
	active.last_activity_at = Set(Utc::now());
	active.update(db).await?;
	Ok(())
}

/// `next()`: advances the session to the next unresolved group in review
/// order, clearing `current_group_id` if none remain.
pub async fn next(db: &DatabaseConnection) -> Result<Option<Uuid>> {
	use crate::entities::{duplicate_group, DuplicateGroupStatus};
	use sea_orm::QueryOrder;

	let session = require_active(db).await?;

	let candidate = duplicate_group::Entity::find()
		.filter(duplicate_group::Column::Status.eq(DuplicateGroupStatus::Pending))
		.order_by_asc(duplicate_group::Column::ReviewOrder)
		.one(db)
		.await?;

	let next_group_id = candidate.map(|g| g.id);
	let mut active: selection_session::ActiveModel = session.into();
	active.current_group_id = Set(next_group_id);
	active.last_activity_at = Set(Utc::now());
	active.update(db).await?;

	Ok(next_group_id)
}

/// `complete()`: ends the active session.
pub async fn complete(db: &DatabaseConnection) -> Result<selection_session::Model> {
	let session = require_active(db).await?;
	let mut active: selection_session::ActiveModel = session.into();
	active.status = Set(SelectionSessionStatus::Completed);
	active.completed_at = Set(Some(Utc::now()));
	active.current_group_id = Set(None);
	Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn starting_twice_without_resume_conflicts() {
		let db = crate::test_support::in_memory_db().await;
		start(&db, false).await.unwrap();
		let err = start(&db, false).await.unwrap_err();
		assert!(matches!(err, Error::Conflict(_)));
	}

	#[tokio::test]
	async fn resume_reattaches_to_existing_session() {
		let db = crate::test_support::in_memory_db().await;
		let first = start(&db, false).await.unwrap();
		let resumed = start(&db, true).await.unwrap();
		assert_eq!(first.id, resumed.id);
		assert!(resumed.resumed_at.is_some());
	}

	#[tokio::test]
	async fn validate_requires_matching_current_group() {
		let db = crate::test_support::in_memory_db().await;
		start(&db, false).await.unwrap();
		let err = validate(&db, Uuid::new_v4()).await.unwrap_err();
		assert!(matches!(err, Error::Validation(_)));
	}

	#[tokio::test]
	async fn next_orders_by_review_order_not_created_at() {
		use crate::entities::{duplicate_group, DuplicateGroupStatus};

		let db = crate::test_support::in_memory_db().await;
		start(&db, false).await.unwrap();

		let older_but_higher_order = Uuid::new_v4();
		let newer_but_lower_order = Uuid::new_v4();

		duplicate_group::ActiveModel {
			id: Set(older_but_higher_order),
			file_hash: Set("H1".to_string()),
			file_count: Set(2),
			total_size_bytes: Set(200),
			status: Set(DuplicateGroupStatus::Pending),
			original_file_id: Set(None),
			auto_select_margin: Set(None),
			review_session_id: Set(None),
			review_order: Set(1),
			created_at: Set(Utc::now() - chrono::Duration::days(1)),
			resolved_at: Set(None),
		}
		.insert(&db)
		.await
		.unwrap();

		duplicate_group::ActiveModel {
			id: Set(newer_but_lower_order),
			file_hash: Set("H2".to_string()),
			file_count: Set(2),
			total_size_bytes: Set(200),
			status: Set(DuplicateGroupStatus::Pending),
			original_file_id: Set(None),
			auto_select_margin: Set(None),
			review_session_id: Set(None),
			review_order: Set(0),
			created_at: Set(Utc::now()),
			resolved_at: Set(None),
		}
		.insert(&db)
		.await
		.unwrap();

		let next_id = next(&db).await.unwrap();
		assert_eq!(next_id, Some(newer_but_lower_order));
	}
}
