use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const QUERY_TAG: &str = "Query API";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::health_check,
        crate::api::query::validate_query_handler,
        crate::api::query::execute_query_handler,
    ),
    components(schemas(usql_client::Query)),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = QUERY_TAG, description = "Validated SQL query endpoints"),
    ),
    info(
        title = "Universal SQL Gateway API",
        description = "Runs SQL queries after the authorization service approves them",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
