use crate::errors::ApiError;
use crate::openapi::QUERY_TAG;
use crate::state::AppState;
use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use http::StatusCode;
use log::{error, warn};
use usql_client::{Query, QueryError};

#[utoipa::path(
    post,
    path = "/validate-query",
    tag = QUERY_TAG,
    request_body = Query,
    responses(
        (status = 200, description = "Authorization decision for the query", body = serde_json::Value),
        (status = 401, description = "The gateway's API key was rejected"),
        (status = 403, description = "The API key lacks entitlements for the query"),
        (status = 422, description = "Invalid request payload"),
        (status = 502, description = "The authorization service failed or was unreachable")
    )
)]
pub(crate) async fn validate_query_handler(
    State(state): State<AppState>,
    Json(query): Json<Query>,
) -> Response {
    match state.client.validate_query(&query).await {
        Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
        Err(err) => {
            log_failure(&err);
            ApiError::from(err).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/execute-query",
    tag = QUERY_TAG,
    request_body = Query,
    responses(
        (status = 200, description = "Result document from the SQL execution service", body = serde_json::Value),
        (status = 401, description = "The gateway's API key was rejected"),
        (status = 403, description = "The query was not approved"),
        (status = 422, description = "Invalid request payload"),
        (status = 502, description = "An upstream service failed or was unreachable"),
        (status = 504, description = "An upstream service timed out")
    )
)]
pub(crate) async fn execute_query_handler(
    State(state): State<AppState>,
    Json(query): Json<Query>,
) -> Response {
    match state.client.execute_query(&query).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            log_failure(&err);
            ApiError::from(err).into_response()
        }
    }
}

fn log_failure(err: &QueryError) {
    if matches!(err, QueryError::Transport { .. }) {
        error!("Query failed: {}", err);
    } else {
        warn!("Query rejected: {}", err);
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/validate-query", post(validate_query_handler))
        .route("/execute-query", post(execute_query_handler))
}
