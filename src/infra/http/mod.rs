//! HTTP transport for the flag service.

pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::ErrorReport;
use crate::infra::db::PostgresRepositories;
use crate::infra::error::InfraError;

use self::middleware::{log_responses, set_request_context};

/// Liveness probe behind `GET /health`.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> Result<(), InfraError>;
}

#[async_trait]
impl HealthProbe for PostgresRepositories {
    async fn check(&self) -> Result<(), InfraError> {
        self.health_check()
            .await
            .map_err(|err| InfraError::database(err.to_string()))
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub api: ApiState,
    pub health: Arc<dyn HealthProbe>,
}

/// Full application router: the flag API, the health probe and the shared
/// request-id and response-logging layers.
pub fn build_router(state: RouterState) -> Router {
    let health = Router::new()
        .route("/health", get(db_health))
        .with_state(state.health);

    Router::new()
        .merge(build_api_router(state.api))
        .merge(health)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(probe): State<Arc<dyn HealthProbe>>) -> Response {
    db_health_response(probe.check().await)
}

fn db_health_response(result: Result<(), InfraError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
