use std::sync::Arc;

use axum::{routing::get, Router};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use ufs_protocol::endpoints;

use crate::handler;
use crate::object::ObjectServer;

/// Build the axum router for the unary binding.
pub fn build_router(server: Arc<ObjectServer>, max_workers: usize) -> Router {
    let routes = Router::new()
        .route(endpoints::STAT, get(handler::stat_handler))
        .route(endpoints::READ, get(handler::read_handler))
        .route(endpoints::FILES, get(handler::list_handler))
        .route(endpoints::HEALTH, get(handler::health_handler))
        .with_state(server);
    with_limits(routes, max_workers)
}

/// At most `max_workers` requests are handled at once across all routes;
/// the rest wait for a slot.
pub(crate) fn with_limits(routes: Router, max_workers: usize) -> Router {
    routes
        .layer(GlobalConcurrencyLimitLayer::new(max_workers.max(1)))
        .layer(TraceLayer::new_for_http())
}
