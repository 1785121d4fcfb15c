use axum::routing::{get, post};
use axum::Router;
use jrnl_ledger::endpoints;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::NodeState;

/// Build the axum router with all ledger node endpoints.
pub fn build_router(state: NodeState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::PROGRAM_ROUTE, get(handler::program_handler))
        .route(endpoints::SUBMIT_ROUTE, post(handler::submit_handler))
        .route(endpoints::ENTRIES_ROUTE, get(handler::entries_handler))
        .route(endpoints::ENTRY_ROUTE, get(handler::entry_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
