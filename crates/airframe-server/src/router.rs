use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all Airframe endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/object/:type", get(handler::query_objects))
        .route(
            "/v1/object/:type/:id",
            get(handler::get_object)
                .head(handler::head_object)
                .post(handler::put_object),
        )
        .fallback(handler::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
