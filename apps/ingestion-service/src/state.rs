use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sd_bus::MessageBus;
use sd_object_store::ObjectStore;

use crate::{config::AppConfig, hub::Hub};

#[derive(Clone)]
pub struct AppState {
	pub db: DatabaseConnection,
	pub bus: Arc<MessageBus>,
	pub object_store: Arc<dyn ObjectStore>,
	pub hub: Arc<Hub>,
	pub config: Arc<AppConfig>,
}
