use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all brandkit endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/v1/projects",
            get(handler::list_projects).post(handler::create_project),
        )
        .route("/v1/projects/:name", axum::routing::delete(handler::delete_project))
        .route("/v1/projects/:name/assets", get(handler::list_assets))
        .route("/v1/projects/:name/references", post(handler::upload_reference))
        .route("/v1/projects/:name/imports", post(handler::import_asset))
        .route(
            "/v1/projects/:name/selection",
            put(handler::put_selection).get(handler::get_selection),
        )
        .route(
            "/v1/assets/:id",
            get(handler::get_asset).delete(handler::delete_asset),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
