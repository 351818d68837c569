// handlers/pages.rs - server-rendered pages and API docs

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use serde_json::Value;

use crate::docs::openapi;
use crate::error::ApiError;
use crate::state::AppState;

async fn view(state: &AppState, name: &str) -> Result<Html<String>, ApiError> {
    let path = state.config.paths.views_dir.join(name);
    tokio::fs::read_to_string(&path)
        .await
        .map(Html)
        .map_err(|e| {
            tracing::error!("Failed to read view {}: {}", path.display(), e);
            ApiError::not_found(format!("View '{}' not found", name))
        })
}

/// GET / - login page
pub async fn login_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    view(&state, "login.html").await
}

/// GET /users - user admin page, or back to login without a valid session
pub async fn users_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if state.sessions.session_from_headers(&headers).is_err() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(view(&state, "users.html").await?.into_response())
}

const SWAGGER_CSP: &str = "default-src 'self';img-src 'self' data: https:;\
script-src 'self' 'unsafe-inline' https://unpkg.com;\
style-src 'self' 'unsafe-inline' https://unpkg.com;object-src 'none'";

/// GET /api-docs - Swagger UI loads its bundle from unpkg.
pub async fn swagger_ui() -> impl IntoResponse {
    (
        [(header::CONTENT_SECURITY_POLICY, SWAGGER_CSP)],
        Html(openapi::swagger_ui_html(
            "user-portal-api docs",
            "/api-docs/openapi.json",
        )),
    )
}

/// GET /api-docs/openapi.json
pub async fn openapi_json(Extension(doc): Extension<Arc<Value>>) -> Json<Value> {
    Json(doc.as_ref().clone())
}
