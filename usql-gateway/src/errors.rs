use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use usql_client::QueryError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Create new Bad Gateway (502) with a detail message
    pub fn bad_gateway<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_GATEWAY)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail,
        });
        (status_code, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Unauthorized => ApiError::new(err, StatusCode::UNAUTHORIZED),
            QueryError::MissingEntitlements | QueryError::Denied { .. } => {
                ApiError::new(err, StatusCode::FORBIDDEN)
            }
            QueryError::AuthService { .. } => ApiError::bad_gateway(err),
            // Pass the SQL server's own rejection through to the caller
            QueryError::Execution { status, body }
                if status.is_client_error() || status.is_server_error() =>
            {
                ApiError::new(body, status)
            }
            QueryError::Execution { .. } => ApiError::bad_gateway(err),
            QueryError::Transport { .. } if err.is_timeout() => {
                ApiError::new(err, StatusCode::GATEWAY_TIMEOUT)
            }
            QueryError::Transport { .. } => ApiError::bad_gateway(err),
            QueryError::Cancelled { .. } => ApiError::new(err, StatusCode::SERVICE_UNAVAILABLE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_map_to_client_errors() {
        let err = ApiError::from(QueryError::Unauthorized);
        assert_eq!(err.status_code, StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.detail,
            "Unauthorized access - check API key or permissions"
        );

        let err = ApiError::from(QueryError::MissingEntitlements);
        assert_eq!(err.status_code, StatusCode::FORBIDDEN);

        let err = ApiError::from(QueryError::Denied {
            reason: Some("restricted".to_string()),
        });
        assert_eq!(err.status_code, StatusCode::FORBIDDEN);
        assert!(err.detail.ends_with("restricted"));
    }

    #[test]
    fn test_execution_errors_keep_upstream_status() {
        let err = ApiError::from(QueryError::Execution {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"error": "syntax"}"#.to_string(),
        });
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, r#"{"error": "syntax"}"#);

        let err = ApiError::from(QueryError::Execution {
            status: StatusCode::ACCEPTED,
            body: String::new(),
        });
        assert_eq!(err.status_code, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_failures_map_to_bad_gateway() {
        let err = ApiError::from(QueryError::AuthService {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        });
        assert_eq!(err.status_code, StatusCode::BAD_GATEWAY);

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::from(QueryError::Transport {
            service: usql_client::Service::Authorization,
            source: decode.into(),
        });
        assert_eq!(err.status_code, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_cancelled_call_maps_to_service_unavailable() {
        let err = ApiError::from(QueryError::Cancelled {
            service: usql_client::Service::SqlExecution,
        });
        assert_eq!(err.status_code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.detail, "Call to SQL execution service was cancelled");

        let err = ApiError::from(QueryError::Cancelled {
            service: usql_client::Service::Authorization,
        });
        assert_eq!(err.status_code, StatusCode::SERVICE_UNAVAILABLE);
    }
}
