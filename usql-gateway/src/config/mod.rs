use crate::config::auth::AuthServiceConfig;
use crate::config::sql::SqlServiceConfig;
use confique::Config;
use std::fmt;
use std::time::Duration;
use usql_client::{ConfigError, QueryClient};

pub mod auth;
pub mod sql;

/// Optional configuration file, layered below environment variables
const CONFIG_FILE: &str = "usql-gateway.toml";

/// Main configuration structure for the gateway
#[derive(Config, Clone)]
pub struct Settings {
    /// API key sent as a bearer token to both services - mandatory
    #[config(env = "USQL_API_KEY")]
    pub api_key: String,

    /// The port the gateway will listen to (default: 7780)
    #[config(env = "USQL_PORT", default = 7780)]
    pub port: u16,

    /// Connect timeout for both services in seconds, 0 disables it (default: 5)
    #[config(env = "USQL_CONNECT_TIMEOUT", default = 5)]
    pub connect_timeout: u64,

    /// Only execute queries whose validation response explicitly approves them
    #[config(env = "USQL_REQUIRE_EXPLICIT_APPROVAL", default = false)]
    pub require_explicit_approval: bool,

    /// Authorization service configuration
    #[config(nested)]
    pub auth: AuthServiceConfig,

    /// SQL execution service configuration
    #[config(nested)]
    pub sql: SqlServiceConfig,
}

impl Settings {
    /// Loads the settings from environment variables, falling back to the
    /// optional config file and then to the defaults
    pub fn new() -> Result<Self, confique::Error> {
        Settings::builder().env().file(CONFIG_FILE).load()
    }

    /// Builds the query client described by these settings
    pub fn query_client(&self) -> Result<QueryClient, ConfigError> {
        QueryClient::builder(&self.api_key, &self.auth.url, &self.sql.url)
            .with_auth_timeout(seconds(self.auth.timeout))
            .with_sql_timeout(seconds(self.sql.timeout))
            .with_connect_timeout(seconds(self.connect_timeout))
            .require_explicit_approval(self.require_explicit_approval)
            .build()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(
        auth_mock: &wiremock::MockServer,
        sql_mock: &wiremock::MockServer,
    ) -> Self {
        Self {
            api_key: "test_api_key".to_string(),
            port: 0, // Let the OS choose a port
            connect_timeout: 1,
            require_explicit_approval: false,
            auth: AuthServiceConfig {
                url: auth_mock.uri(),
                timeout: 1,
            },
            sql: SqlServiceConfig {
                url: sql_mock.uri(),
                timeout: 1,
            },
        }
    }
}

// The API key never reaches logs or panic messages
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .field("require_explicit_approval", &self.require_explicit_approval)
            .field("auth", &self.auth)
            .field("sql", &self.sql)
            .finish()
    }
}

/// Zero means "no timeout"
fn seconds(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}
