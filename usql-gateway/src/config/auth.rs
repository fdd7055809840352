use confique::Config;

/// Configuration for the authorization service that pre-validates queries
#[derive(Debug, Config, Clone)]
pub struct AuthServiceConfig {
    /// Base URL of the authorization service (default: http://localhost:8000)
    #[config(env = "USQL_AUTH_URL", default = "http://localhost:8000")]
    pub url: String,

    /// Timeout for validation requests in seconds, 0 waits indefinitely (default: 30)
    #[config(env = "USQL_AUTH_TIMEOUT", default = 30)]
    pub timeout: u64,
}
