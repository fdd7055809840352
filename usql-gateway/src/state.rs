use crate::config::Settings;
use std::sync::Arc;
use usql_client::{ConfigError, QueryClient};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub client: Arc<QueryClient>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        let client = settings.query_client()?;
        Ok(Self {
            settings: Arc::new(settings),
            client: Arc::new(client),
        })
    }
}
