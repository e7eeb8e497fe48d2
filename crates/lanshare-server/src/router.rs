use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, MethodRouter};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lanshare_ledger::HistoryLog;
use lanshare_store::ArtifactStore;

use crate::handler;
use crate::state::{AppInfo, AppState};

/// Endpoints shared by the file and video stores.
fn store_routes(store: Arc<dyn ArtifactStore>, body_limit: usize) -> Router {
    Router::new()
        .route(
            "/upload",
            post(handler::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/list", get(handler::list))
        .route("/download/:name", get(handler::download))
        .route("/preview/:name", get(handler::preview))
        .route("/delete/:name", delete(handler::delete))
        .route(
            "/max_count",
            get(handler::get_store_capacity).post(handler::set_store_capacity),
        )
        .with_state(store)
}

/// Message board. Both `/api/message` and `/api/message/` reach the same
/// handlers, so the routes are flat rather than nested.
fn message_routes(history: Arc<HistoryLog>) -> Router {
    let current = || -> MethodRouter<Arc<HistoryLog>> {
        get(handler::get_message).post(handler::post_message)
    };
    Router::new()
        .route("/api/message", current())
        .route("/api/message/", current())
        .route("/api/message/history", get(handler::message_history))
        .route(
            "/api/message/max_count",
            get(handler::get_history_capacity).post(handler::set_history_capacity),
        )
        .with_state(history)
}

fn service_routes(info: Arc<AppInfo>) -> Router {
    Router::new()
        .route("/health", get(handler::health))
        .route("/info", get(handler::info))
        .with_state(info)
}

/// Build the axum router with all LanShare endpoints under `/api`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/file",
            store_routes(state.files.clone(), state.file_body_limit),
        )
        .nest(
            "/api/video",
            store_routes(state.videos.clone(), state.video_body_limit),
        )
        .merge(message_routes(state.history.clone()))
        .nest("/api", service_routes(state.info.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
