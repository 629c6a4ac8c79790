//! Route wiring (spec §6.1, §6.2): one `axum::Router` assembled from the
//! per-resource handler modules, matching `apps/server`'s
//! merge-small-routers-into-one shape.

mod duplicates;
mod files;
mod hub_ws;
mod scan_directories;

use axum::{
	middleware,
	routing::{delete, get, patch, post, put},
	Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::{state::AppState, trace::attach_trace_id};

#[derive(Serialize)]
struct VersionBody {
	name: &'static str,
	version: &'static str,
}

async fn version() -> Json<VersionBody> {
	Json(VersionBody { name: env!("CARGO_PKG_NAME"), version: env!("CARGO_PKG_VERSION") })
}

async fn health() -> &'static str {
	"ok"
}

pub fn build(state: AppState) -> Router {
	Router::new()
		.route("/version", get(version))
		.route("/health", get(health))
		.route("/files", get(files::list))
		.route("/files/batch", post(files::batch_ingest))
		.route("/files/stats", get(files::stats))
		.route("/files/reprocess", post(files::reprocess))
		.route("/files/:id", get(files::get_one))
		.route("/files/:id/thumbnail", get(files::thumbnail))
		.route("/files/:id/content", get(files::content))
		.route("/scan-directories", get(scan_directories::list).post(scan_directories::create))
		.route(
			"/scan-directories/:id",
			put(scan_directories::update).delete(scan_directories::delete),
		)
		.route("/scan-directories/:id/scan", post(scan_directories::trigger_scan))
		.route(
			"/scan-directories/:id/last-scanned",
			patch(scan_directories::mark_last_scanned),
		)
		.route("/duplicates", get(duplicates::list))
		.route("/duplicates/auto-select-all", post(duplicates::auto_select_all))
		.route("/duplicates/:id", get(duplicates::get_one))
		.route("/duplicates/:id/original", put(duplicates::set_original))
		.route("/duplicates/:id/auto-select", post(duplicates::auto_select))
		.route("/duplicates/:id/non-originals", delete(duplicates::delete_non_originals))
		.route("/hubs/indexer", get(hub_ws::indexer_upgrade))
		.route("/hubs/cleaner", get(hub_ws::cleaner_upgrade))
		.layer(middleware::from_fn(attach_trace_id))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
