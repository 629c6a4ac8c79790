//! CRUD for the declarative hide rules (spec §3 `HiddenFolder`/
//! `HiddenSizeRule`). New rules are applied retroactively to already-indexed
//! files; removing one unhides every file that carries it as
//! `hidden_rule_id`, then lets [`crate::duplicate_engine::resync_group_for_hash`]'s
//! caller re-resolve affected groups.

use chrono::Utc;
use sea_orm::{
	ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
	TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{hidden_folder, hidden_size_rule, indexed_file, HiddenCategory};
use crate::error::{Error, Result};

pub async fn create_hidden_folder(
	db: &DatabaseConnection,
	path_prefix: String,
) -> Result<hidden_folder::Model> {
	let model = hidden_folder::ActiveModel {
		id: Set(Uuid::new_v4()),
		path_prefix: Set(path_prefix.clone()),
		created_at: Set(Utc::now()),
	};
	let rule = model.insert(db).await?;

	let matching = indexed_file::Entity::find()
		.filter(indexed_file::Column::Path.starts_with(path_prefix.as_str()))
		.filter(indexed_file::Column::Hidden.eq(false))
		.all(db)
		.await?;
	for file in matching {
		let hash = file.file_hash.clone();
		let mut active: indexed_file::ActiveModel = file.into();
		active.hidden = Set(true);
		active.hidden_category = Set(Some(HiddenCategory::Folder));
		active.hidden_rule_id = Set(Some(rule.id));
		active.update(db).await?;
		let txn = db.begin().await?;
		crate::duplicate_engine::resync_group_for_hash(&txn, &hash).await?;
		txn.commit().await?;
	}

	Ok(rule)
}

pub async fn delete_hidden_folder(db: &DatabaseConnection, rule_id: Uuid) -> Result<()> {
	unhide_by_rule(db, rule_id).await?;
	hidden_folder::Entity::delete_by_id(rule_id).exec(db).await?;
	Ok(())
}

pub async fn create_hidden_size_rule(
	db: &DatabaseConnection,
	max_size_bytes: i64,
) -> Result<hidden_size_rule::Model> {
	let model = hidden_size_rule::ActiveModel {
		id: Set(Uuid::new_v4()),
		max_size_bytes: Set(max_size_bytes),
		created_at: Set(Utc::now()),
	};
	let rule = model.insert(db).await?;

	let matching = indexed_file::Entity::find()
		.filter(indexed_file::Column::SizeBytes.lte(max_size_bytes))
		.filter(indexed_file::Column::Hidden.eq(false))
		.all(db)
		.await?;
	for file in matching {
		let hash = file.file_hash.clone();
		let mut active: indexed_file::ActiveModel = file.into();
		active.hidden = Set(true);
		active.hidden_category = Set(Some(HiddenCategory::Size));
		active.hidden_rule_id = Set(Some(rule.id));
		active.update(db).await?;
		let txn = db.begin().await?;
		crate::duplicate_engine::resync_group_for_hash(&txn, &hash).await?;
		txn.commit().await?;
	}

	Ok(rule)
}

pub async fn delete_hidden_size_rule(db: &DatabaseConnection, rule_id: Uuid) -> Result<()> {
	unhide_by_rule(db, rule_id).await?;
	hidden_size_rule::Entity::delete_by_id(rule_id).exec(db).await?;
	Ok(())
}

async fn unhide_by_rule(db: &DatabaseConnection, rule_id: Uuid) -> Result<()> {
	let affected = indexed_file::Entity::find()
		.filter(indexed_file::Column::HiddenRuleId.eq(rule_id))
		.all(db)
		.await?;
	for file in affected {
		let hash = file.file_hash.clone();
		let mut active: indexed_file::ActiveModel = file.into();
		active.hidden = Set(false);
		active.hidden_category = Set(None);
		active.hidden_rule_id = Set(None);
		active.update(db).await?;
		let txn = db.begin().await?;
		crate::duplicate_engine::resync_group_for_hash(&txn, &hash).await?;
		txn.commit().await?;
	}
	Ok(())
}

pub async fn list_hidden_folders(db: &DatabaseConnection) -> Result<Vec<hidden_folder::Model>> {
	Ok(hidden_folder::Entity::find().all(db).await?)
}

pub async fn list_hidden_size_rules(db: &DatabaseConnection) -> Result<Vec<hidden_size_rule::Model>> {
	Ok(hidden_size_rule::Entity::find().all(db).await?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn removing_a_folder_rule_unhides_its_files() {
		let db = crate::test_support::in_memory_db().await;
		let rule = create_hidden_folder(&db, "/r/icons".to_string()).await.unwrap();
		delete_hidden_folder(&db, rule.id).await.unwrap();
		assert!(list_hidden_folders(&db).await.unwrap().is_empty());
	}
}
