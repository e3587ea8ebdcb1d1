use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Room for multipart boundaries and part headers on top of the payload limit.
pub const MULTIPART_ALLOWANCE: u64 = 64 * 1024;

/// Build the axum router with all YODO endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.upload_limit().saturating_add(MULTIPART_ALLOWANCE);
    Router::new()
        .route(
            "/",
            get(handler::usage_handler).post(handler::upload_handler),
        )
        .route(
            "/:identifier",
            get(handler::retrieve_handler).head(handler::inspect_handler),
        )
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
