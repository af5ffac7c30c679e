use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::flags::FlagError;
use crate::application::pagination::PaginationError;
use crate::application::repos::RepoError;

const SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const STORAGE: &str = "storage_error";
    pub const CACHE: &str = "cache_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn with_report(mut self, error: &dyn std::error::Error) -> Self {
        self.report = Some(ErrorReport::from_error(SOURCE, self.status, error));
        self
    }
}

impl From<FlagError> for ApiError {
    fn from(err: FlagError) -> Self {
        let api = match &err {
            FlagError::Validation(validation) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid feature flag payload",
                Some(validation.message().to_string()),
            ),
            FlagError::NotFound { code } => ApiError::not_found(
                "Feature flag not found",
                Some(format!("no feature flag with code `{code}`")),
            ),
            FlagError::Cache { source, .. } => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::CACHE,
                "Cache refresh failed after the change was stored",
                Some(source.to_string()),
            ),
            FlagError::Storage { source, .. } => repo_to_api(source),
        };
        api.with_report(&err)
    }
}

fn repo_to_api(err: &RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint.clone()),
        ),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message.clone()),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::NotFound | RepoError::Persistence(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::STORAGE,
            "Persistence error",
            None,
        ),
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid pagination",
            Some(err.to_string()),
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Malformed JSON body", Some(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("Malformed query string", Some(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Shared logging middleware reads the report back out of the extensions.
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache::CacheError;
    use crate::application::validation::ValidationError;

    #[test]
    fn validation_maps_to_bad_request_with_message_hint() {
        let api = ApiError::from(FlagError::Validation(ValidationError::new(
            "'enabled' field must be a boolean",
        )));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), codes::INVALID_INPUT);
        assert_eq!(
            api.hint.as_deref(),
            Some("'enabled' field must be a boolean")
        );
    }

    #[test]
    fn storage_kinds_map_to_distinct_statuses() {
        let duplicate = ApiError::from(FlagError::Storage {
            operation: "create",
            source: RepoError::Duplicate {
                constraint: "feature_flags_code_key".into(),
            },
        });
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let timeout = ApiError::from(FlagError::Storage {
            operation: "fetch",
            source: RepoError::Timeout,
        });
        assert_eq!(timeout.status(), StatusCode::SERVICE_UNAVAILABLE);

        let other = ApiError::from(FlagError::Storage {
            operation: "fetch",
            source: RepoError::Persistence("connection reset".into()),
        });
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.code(), codes::STORAGE);
        assert!(other.hint.is_none());
    }

    #[test]
    fn cache_failure_is_a_server_error_with_chain_report() {
        let api = ApiError::from(FlagError::Cache {
            code: "checkout_v2".into(),
            source: CacheError::unavailable("backend offline"),
        });
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), codes::CACHE);

        let report = api.report.as_ref().expect("report attached");
        assert_eq!(report.messages.len(), 2);
    }
}
