use confique::Config;

/// Configuration for the SQL execution service
#[derive(Debug, Config, Clone)]
pub struct SqlServiceConfig {
    /// Base URL of the SQL execution service (default: http://localhost:8001)
    #[config(env = "USQL_SQL_URL", default = "http://localhost:8001")]
    pub url: String,

    /// Timeout for execution requests in seconds, 0 waits indefinitely (default: 30)
    #[config(env = "USQL_SQL_TIMEOUT", default = 30)]
    pub timeout: u64,
}
