use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::dispatch::Dispatcher;
use crate::api::envelope::{ApiRequest, ApiResponse};

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
}

/// `/` accepts any method and behaves like the gateway function;
/// `/invoke` takes the raw gateway envelope as JSON and returns one.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", any(handle_http))
        .route("/invoke", post(handle_envelope))
        .route("/health", get(health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_configured: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_http(
    State(state): State<ApiState>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> ApiResponse {
    let headers = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();

    let req = ApiRequest {
        http_method: Some(method.as_str().to_string()),
        query_string_parameters: Some(params),
        headers: Some(headers),
        body: (!body.is_empty()).then_some(body),
    };
    state.dispatcher.handle(&req).await
}

async fn handle_envelope(
    State(state): State<ApiState>,
    Json(req): Json<ApiRequest>,
) -> Json<ApiResponse> {
    Json(state.dispatcher.handle(&req).await)
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database_configured: state.dispatcher.is_configured(),
    })
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}
