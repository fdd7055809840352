use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// The remote service a request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Authorization,
    SqlExecution,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Authorization => f.write_str("authorization service"),
            Service::SqlExecution => f.write_str("SQL execution service"),
        }
    }
}

/// Failures below the HTTP status layer: the service could not be reached,
/// or what it sent back could not be interpreted.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Request(e) if e.is_timeout())
    }
}

/// Errors returned by [`QueryClient`](crate::QueryClient) operations.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Unauthorized access - check API key or permissions")]
    Unauthorized,

    #[error("Missing entitlements - no permission for fields/datasets")]
    MissingEntitlements,

    #[error("Authorization service responded with status {status}: {body}")]
    AuthService { status: StatusCode, body: String },

    #[error("Query denied by the authorization service{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Denied { reason: Option<String> },

    #[error("SQL execution service responded with status {status}: {body}")]
    Execution { status: StatusCode, body: String },

    #[error("Failed to call {service}: {source}")]
    Transport {
        service: Service,
        #[source]
        source: TransportError,
    },

    #[error("Call to {service} was cancelled")]
    Cancelled { service: Service },
}

impl QueryError {
    pub(crate) fn transport(service: Service, source: impl Into<TransportError>) -> Self {
        QueryError::Transport {
            service,
            source: source.into(),
        }
    }

    /// True when the request never got an answer (connection failure or
    /// timeout). Server rejections and responses that could not be decoded
    /// are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueryError::Transport {
                source: TransportError::Request(_),
                ..
            }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Transport { source, .. } if source.is_timeout())
    }

    /// HTTP status returned by the remote service, if it responded with one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            QueryError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            QueryError::MissingEntitlements => Some(StatusCode::FORBIDDEN),
            QueryError::AuthService { status, .. } | QueryError::Execution { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Response body carried by the error, parsed as JSON when possible.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        match self {
            QueryError::AuthService { body, .. } | QueryError::Execution { body, .. } => {
                serde_json::from_str(body).ok()
            }
            _ => None,
        }
    }
}

/// Errors raised while building a [`QueryClient`](crate::QueryClient).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("API key contains characters that are not allowed in an HTTP header")]
    InvalidApiKey,

    #[error("Invalid {service} URL '{url}': {reason}")]
    InvalidUrl {
        service: Service,
        url: String,
        reason: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
