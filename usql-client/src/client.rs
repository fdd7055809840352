use crate::builder::QueryClientBuilder;
use crate::error::{QueryError, Service};
use crate::models::{AuthorizationDecision, Query, QueryResult};
use log::{debug, error, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const VALIDATE_QUERY_PATH: &str = "validate-query/";
const EXECUTE_QUERY_PATH: &str = "execute-query/";

/// Per-call overrides applied to every request a single operation makes.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Replaces the client's per-service timeout for each request of the call
    pub timeout: Option<Duration>,
    /// Aborts the in-flight request when cancelled
    pub cancellation: Option<CancellationToken>,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Sends queries to the SQL execution service after the authorization service
/// has approved them.
///
/// The client holds only immutable configuration, so it can be cloned and
/// shared between tasks freely.
#[derive(Clone)]
pub struct QueryClient {
    pub(crate) client: Client,
    pub(crate) auth_url: Url,
    pub(crate) sql_url: Url,
    pub(crate) auth_timeout: Option<Duration>,
    pub(crate) sql_timeout: Option<Duration>,
    pub(crate) require_explicit_approval: bool,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("auth_url", &self.auth_url)
            .field("sql_url", &self.sql_url)
            .field("auth_timeout", &self.auth_timeout)
            .field("sql_timeout", &self.sql_timeout)
            .field("require_explicit_approval", &self.require_explicit_approval)
            // The HTTP client carries the API key in its default headers
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    pub fn builder(
        api_key: impl Into<String>,
        auth_url: impl Into<String>,
        sql_url: impl Into<String>,
    ) -> QueryClientBuilder {
        QueryClientBuilder::new(api_key, auth_url, sql_url)
    }

    /// Builds a client with default timeouts.
    pub fn new(
        api_key: impl Into<String>,
        auth_url: impl Into<String>,
        sql_url: impl Into<String>,
    ) -> Result<Self, crate::ConfigError> {
        Self::builder(api_key, auth_url, sql_url).build()
    }

    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    pub fn sql_url(&self) -> &Url {
        &self.sql_url
    }

    /// Asks the authorization service whether the query may run.
    pub async fn validate_query(&self, query: &Query) -> Result<AuthorizationDecision, QueryError> {
        self.validate_query_with(query, &CallOptions::default())
            .await
    }

    pub async fn validate_query_with(
        &self,
        query: &Query,
        options: &CallOptions,
    ) -> Result<AuthorizationDecision, QueryError> {
        let service = Service::Authorization;
        let url = endpoint(&self.auth_url, VALIDATE_QUERY_PATH);
        debug!("Validating query with the authorization service at: {}", url);

        let document = query
            .to_document()
            .map_err(|e| QueryError::transport(service, e))?;
        let request = with_timeout(
            self.client.post(url).json(&document),
            options.timeout.or(self.auth_timeout),
        );
        let response = send(service, request, options).await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("Authorization service rejected the API key");
                return Err(QueryError::Unauthorized);
            }
            StatusCode::FORBIDDEN => {
                warn!("API key is missing entitlements for the query's fields or datasets");
                return Err(QueryError::MissingEntitlements);
            }
            _ if !status.is_success() => {
                let body = read_text(service, response, options).await?;
                error!("Authorization service error {}: {}", status, body);
                return Err(QueryError::AuthService { status, body });
            }
            _ => {}
        }

        let body = cancellable(service, options, response.bytes())
            .await?
            .map_err(|e| QueryError::transport(service, e))?;
        let decision = AuthorizationDecision::from_body(&body, self.require_explicit_approval)
            .map_err(|e| {
                error!("Failed to parse authorization response: {}", e);
                QueryError::transport(service, e)
            })?;

        debug!("Authorization decision: approved={}", decision.is_approved());
        Ok(decision)
    }

    /// Validates the query and, only once it is approved, runs it on the SQL
    /// execution service. Every call re-validates.
    pub async fn execute_query(&self, query: &Query) -> Result<QueryResult, QueryError> {
        self.execute_query_with(query, &CallOptions::default())
            .await
    }

    pub async fn execute_query_with(
        &self,
        query: &Query,
        options: &CallOptions,
    ) -> Result<QueryResult, QueryError> {
        let decision = self.validate_query_with(query, options).await?;
        if let AuthorizationDecision::Denied { reason, .. } = decision {
            warn!(
                "Query denied by the authorization service: {}",
                reason.as_deref().unwrap_or("no reason given")
            );
            return Err(QueryError::Denied { reason });
        }

        let service = Service::SqlExecution;
        let url = endpoint(&self.sql_url, EXECUTE_QUERY_PATH);
        debug!("Executing query on the SQL execution service at: {}", url);

        let document = query
            .to_document()
            .map_err(|e| QueryError::transport(service, e))?;
        let request = with_timeout(
            self.client.post(url).json(&document),
            options.timeout.or(self.sql_timeout),
        );
        let response = send(service, request, options).await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = read_text(service, response, options).await?;
            error!("SQL execution service error {}: {}", status, body);
            return Err(QueryError::Execution { status, body });
        }

        let body = cancellable(service, options, response.bytes())
            .await?
            .map_err(|e| QueryError::transport(service, e))?;
        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to parse SQL execution response: {}", e);
            QueryError::transport(service, e)
        })
    }
}

fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}{}", base.path(), path);
    url.set_path(&joined);
    url
}

fn with_timeout(request: RequestBuilder, timeout: Option<Duration>) -> RequestBuilder {
    match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    }
}

async fn send(
    service: Service,
    request: RequestBuilder,
    options: &CallOptions,
) -> Result<Response, QueryError> {
    cancellable(service, options, request.send())
        .await?
        .map_err(|e| {
            error!("Failed to send request to {}: {}", service, e);
            QueryError::transport(service, e)
        })
}

async fn read_text(
    service: Service,
    response: Response,
    options: &CallOptions,
) -> Result<String, QueryError> {
    cancellable(service, options, response.text())
        .await?
        .map_err(|e| QueryError::transport(service, e))
}

/// Races `future` against the call's cancellation token, if any.
async fn cancellable<F: Future>(
    service: Service,
    options: &CallOptions,
    future: F,
) -> Result<F::Output, QueryError> {
    match &options.cancellation {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!("Call to {} was cancelled", service);
                Err(QueryError::Cancelled { service })
            }
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}
