use crate::QueryClient;
use crate::error::{ConfigError, Service};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A builder for configuring a [`QueryClient`].
///
/// Nothing touches the network until a query is sent; `build` only validates
/// the configuration.
pub struct QueryClientBuilder {
    api_key: String,
    auth_url: String,
    sql_url: String,
    auth_timeout: Option<Duration>,
    sql_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    require_explicit_approval: bool,
}

impl QueryClientBuilder {
    pub(crate) fn new(
        api_key: impl Into<String>,
        auth_url: impl Into<String>,
        sql_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            auth_url: auth_url.into(),
            sql_url: sql_url.into(),
            auth_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            sql_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            require_explicit_approval: false,
        }
    }

    /// Sets the timeout for validation requests. `None` waits indefinitely.
    pub fn with_auth_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Sets the timeout for execution requests. `None` waits indefinitely.
    pub fn with_sql_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sql_timeout = timeout;
        self
    }

    /// Sets the same timeout for both services.
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        self.with_auth_timeout(timeout).with_sql_timeout(timeout)
    }

    /// Sets the TCP/TLS connect timeout. `None` leaves it to the OS.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// When set, a validation response must carry an explicit approval flag
    /// before a query is executed.
    pub fn require_explicit_approval(mut self, required: bool) -> Self {
        self.require_explicit_approval = required;
        self
    }

    pub fn build(self) -> Result<QueryClient, ConfigError> {
        let auth_url = parse_base_url(Service::Authorization, &self.auth_url)?;
        let sql_url = parse_base_url(Service::SqlExecution, &self.sql_url)?;

        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ConfigError::InvalidApiKey)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut client = Client::builder().default_headers(headers);
        if let Some(timeout) = self.connect_timeout {
            client = client.connect_timeout(timeout);
        }

        Ok(QueryClient {
            client: client.build()?,
            auth_url,
            sql_url,
            auth_timeout: self.auth_timeout,
            sql_timeout: self.sql_timeout,
            require_explicit_approval: self.require_explicit_approval,
        })
    }
}

/// Parses a service base URL and makes sure its path ends with `/`, so that
/// joining `validate-query/` appends to the path instead of replacing its last
/// segment.
fn parse_base_url(service: Service, raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        service,
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("base URL must not carry a query or fragment".to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
