pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{get, patch, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/feature-flags",
            post(handlers::create_flag).get(handlers::list_flags),
        )
        .route(
            "/api/feature-flags/{code}",
            get(handlers::get_flag)
                .patch(handlers::update_flag)
                .delete(handlers::delete_flag),
        )
        .route(
            "/api/feature-flags/{code}/enable",
            patch(handlers::enable_flag),
        )
        .route(
            "/api/feature-flags/{code}/disable",
            patch(handlers::disable_flag),
        )
        .with_state(state)
}
