//! HTTP surface driven through the router with in-memory collaborators.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use flagforge::infra::error::InfraError;
use flagforge::infra::http::{ApiState, HealthProbe, RouterState, build_router};

use support::{FlakyCache, InMemoryFlags, cached_service};

#[derive(Default)]
struct SwitchProbe {
    down: AtomicBool,
}

#[async_trait]
impl HealthProbe for SwitchProbe {
    async fn check(&self) -> Result<(), InfraError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(InfraError::database("connection refused"));
        }
        Ok(())
    }
}

struct Harness {
    router: Router,
    repo: Arc<InMemoryFlags>,
    cache: Arc<FlakyCache>,
    probe: Arc<SwitchProbe>,
}

impl Harness {
    fn new() -> Self {
        let repo = InMemoryFlags::new();
        let cache = FlakyCache::new();
        let probe = Arc::new(SwitchProbe::default());
        let router = build_router(RouterState {
            api: ApiState::new(cached_service(&repo, &cache)),
            health: probe.clone(),
        });
        Self {
            router,
            repo,
            cache,
            probe,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be json")
        };
        (status, value)
    }

    async fn create(&self, code: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/feature-flags",
                Some(json!({"name": format!("Flag {code}"), "code": code})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

#[tokio::test]
async fn create_returns_created_flag() {
    let harness = Harness::new();

    let body = harness.create("checkout_v2").await;

    assert_eq!(body["code"], "checkout_v2");
    assert_eq!(body["name"], "Flag checkout_v2");
    assert_eq!(body["enabled"], false);
    assert_eq!(body["description"], Value::Null);
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn invalid_payload_is_bad_request_with_rule_hint() {
    let harness = Harness::new();

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/feature-flags",
            Some(json!({"code": ""})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert_eq!(body["error"]["hint"], "Missing required field: name");
    assert_eq!(harness.repo.len(), 0);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let harness = Harness::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/feature-flags")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .expect("request should build");

    let (status, body) = harness.dispatch(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn duplicate_code_is_conflict() {
    let harness = Harness::new();
    harness.create("search").await;

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/feature-flags",
            Some(json!({"name": "Again", "code": "search"})),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate");
}

#[tokio::test]
async fn get_unknown_code_is_not_found() {
    let harness = Harness::new();

    let (status, body) = harness
        .send(Method::GET, "/api/feature-flags/ghost", None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn enable_and_disable_round_trip() {
    let harness = Harness::new();
    harness.create("checkout_v2").await;

    let (status, body) = harness
        .send(Method::PATCH, "/api/feature-flags/checkout_v2/enable", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);

    let (_, fetched) = harness
        .send(Method::GET, "/api/feature-flags/checkout_v2", None)
        .await;
    assert_eq!(fetched["enabled"], true);

    let (status, body) = harness
        .send(Method::PATCH, "/api/feature-flags/checkout_v2/disable", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);
}

#[tokio::test]
async fn update_applies_patch() {
    let harness = Harness::new();
    harness.create("search").await;

    let (status, body) = harness
        .send(
            Method::PATCH,
            "/api/feature-flags/search",
            Some(json!({"description": "ranking v2"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "ranking v2");
    assert_eq!(body["name"], "Flag search");
}

#[tokio::test]
async fn update_with_wrong_type_is_bad_request() {
    let harness = Harness::new();
    harness.create("checkout_v2").await;

    let (status, body) = harness
        .send(
            Method::PATCH,
            "/api/feature-flags/checkout_v2",
            Some(json!({"enabled": "yes"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["hint"], "'enabled' field must be a boolean");
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let harness = Harness::new();
    harness.create("checkout_v2").await;

    let (status, body) = harness
        .send(Method::DELETE, "/api/feature-flags/checkout_v2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "deleted"}));

    let (status, _) = harness
        .send(Method::GET, "/api/feature-flags/checkout_v2", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_paginates_with_skip_and_limit() {
    let harness = Harness::new();
    for code in ["alpha", "beta", "gamma"] {
        harness.create(code).await;
    }

    let (status, body) = harness
        .send(Method::GET, "/api/feature-flags?skip=1&limit=1", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let page = body.as_array().expect("array body");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["code"], "beta");

    let (status, body) = harness.send(Method::GET, "/api/feature-flags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array body").len(), 3);
}

#[tokio::test]
async fn list_rejects_out_of_range_limits() {
    let harness = Harness::new();

    for uri in [
        "/api/feature-flags?limit=0",
        "/api/feature-flags?limit=5000",
        "/api/feature-flags?skip=-1",
    ] {
        let (status, _) = harness.send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn cache_failure_after_commit_is_server_error() {
    let harness = Harness::new();
    harness.create("search").await;
    harness.cache.fail_set.store(true, Ordering::SeqCst);

    let (status, body) = harness
        .send(Method::PATCH, "/api/feature-flags/search/enable", None)
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "cache_error");
    assert!(harness.repo.stored("search").expect("stored").enabled);
}

#[tokio::test]
async fn storage_timeout_is_service_unavailable() {
    let harness = Harness::new();
    harness.repo.fail_reads.store(true, Ordering::SeqCst);

    let (status, body) = harness
        .send(Method::GET, "/api/feature-flags/search", None)
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "db_timeout");
}

#[tokio::test]
async fn health_reflects_probe() {
    let harness = Harness::new();

    let (status, _) = harness.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    harness.probe.down.store(true, Ordering::SeqCst);
    let (status, _) = harness.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
