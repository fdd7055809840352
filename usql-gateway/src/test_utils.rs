use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Test fixture for setting up a complete test environment with mocked services.
///
/// The TestFixture starts mock servers for the authorization service and the
/// SQL execution service, points the gateway's settings at them and builds the
/// application router, so tests can drive the real handlers end to end.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     fixture
///         .add_auth_mock(Method::POST, "/validate-query/", json!({ "approved": true }), StatusCode::OK, 1)
///         .await;
///     fixture
///         .add_sql_mock(Method::POST, "/execute-query/", json!({ "rows": [] }), StatusCode::OK, 1)
///         .await;
///
///     let response = fixture.post("/execute-query", &Query::new("SELECT 1")).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration settings
    pub settings: Settings,
    /// Mock server for the authorization service
    pub auth_mock: MockServer,
    /// Mock server for the SQL execution service
    pub sql_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture with mock servers for both upstream services.
    pub async fn new() -> Self {
        // Initialize test logger
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        // Create mock servers
        let auth_mock = MockServer::start().await;
        let sql_mock = MockServer::start().await;

        // Create settings configured with mocks
        let settings = Settings::for_test_with_mocks(&auth_mock, &sql_mock);

        let state = AppState::new(settings.clone()).expect("Failed to create app state");
        let app = create_app(state);

        Self {
            app,
            settings,
            auth_mock,
            sql_mock,
        }
    }

    /// Creates a request builder with a JSON content type.
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
    }

    /// Sends a GET request to the specified URI.
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body to the specified URI.
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request through the router and collects the response.
    ///
    /// The body is parsed as JSON, defaulting to an empty object when it is
    /// empty or not JSON.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse { status, json }
    }

    /// Adds a mock route to the authorization service.
    ///
    /// Every mocked route requires the gateway's bearer credential, so a
    /// request without it falls through to wiremock's 404.
    pub async fn add_auth_mock(
        &self,
        method: Method,
        path: impl Into<String>,
        response_body: impl Serialize,
        status_code: StatusCode,
        expected_calls: u64,
    ) {
        self.mount_mock(&self.auth_mock, method, path, response_body, status_code, expected_calls)
            .await;
    }

    /// Adds a mock route to the SQL execution service.
    pub async fn add_sql_mock(
        &self,
        method: Method,
        path: impl Into<String>,
        response_body: impl Serialize,
        status_code: StatusCode,
        expected_calls: u64,
    ) {
        self.mount_mock(&self.sql_mock, method, path, response_body, status_code, expected_calls)
            .await;
    }

    async fn mount_mock(
        &self,
        server: &MockServer,
        method: Method,
        path: impl Into<String>,
        response_body: impl Serialize,
        status_code: StatusCode,
        expected_calls: u64,
    ) {
        let bearer = format!("Bearer {}", self.settings.api_key);

        Mock::given(matchers::method(method.as_str()))
            .and(matchers::path(path.into()))
            .and(matchers::header("Authorization", bearer.as_str()))
            .respond_with(ResponseTemplate::new(status_code.as_u16()).set_body_json(response_body))
            .expect(expected_calls)
            .mount(server)
            .await;
    }
}

/// Response from a test request that provides convenient access to status and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
