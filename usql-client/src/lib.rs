//! # usql-client
//!
//! A client for running SQL queries through the Universal SQL server, gated by
//! a separate authorization service.
//!
//! Every call to [`QueryClient::execute_query`] first posts the query to the
//! authorization service's `/validate-query/` endpoint. Only an approval lets
//! the query through to the SQL server's `/execute-query/` endpoint; any
//! rejection or transport failure is returned as a [`QueryError`] and the SQL
//! server is never contacted.
//!
//! ```no_run
//! use usql_client::{Query, QueryClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = QueryClient::new("api-key", "http://localhost:8000", "http://localhost:8001")?;
//! let query = Query::new("SELECT name FROM employees")
//!     .with_fields(["name"])
//!     .with_datasets(["hr.employees"]);
//! let result = client.execute_query(&query).await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod builder;
mod client;
pub mod error;
pub mod models;

pub use builder::QueryClientBuilder;
pub use client::{CallOptions, QueryClient};
pub use error::{ConfigError, QueryError, Service, TransportError};
pub use models::{AuthorizationDecision, Query, QueryResult};
pub use tokio_util::sync::CancellationToken;
