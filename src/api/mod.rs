mod handlers;

use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::db::Database;

pub use handlers::NextWeightResponse;

pub fn create_router(db: Database) -> Router {
    create_router_with_timeout(db, DEFAULT_REQUEST_TIMEOUT)
}

pub fn create_router_with_timeout(db: Database, request_timeout: Duration) -> Router {
    let api = Router::new()
        // Lifts
        .route("/lifts", get(handlers::list_lifts).post(handlers::create_lift))
        .route("/lifts/events", get(handlers::lift_events))
        .route(
            "/lifts/{id}",
            get(handlers::get_lift)
                .put(handlers::update_lift)
                .delete(handlers::delete_lift),
        )
        .route("/lifts/{id}/history", get(handlers::get_lift_history))
        .route("/lifts/{id}/next", post(handlers::create_next_lift))
        // Sets
        .route("/lifts/{id}/sets", post(handlers::add_set))
        .route("/lifts/{id}/sets/{index}", put(handlers::record_set))
        .route(
            "/lifts/{id}/sets/{index}/next-weight",
            get(handlers::suggest_next_weight),
        )
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(db)
}
