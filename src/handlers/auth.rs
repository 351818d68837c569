// handlers/auth.rs - /api/auth/* handlers

use axum::{extract::State, response::Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::Payload;
use crate::docs::{ApiDoc, Schema};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login - check credentials and set the session cookie.
///
/// Input: `{ "email": "string", "password": "string" }`.
/// Output: `{}` on success, 401 `{ "error": "Login failed" }` otherwise.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Payload(body): Payload<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let token = state.auth.login(&body.email, &body.password).await?;
    let jar = jar.add(state.sessions.session_cookie(token));
    Ok((jar, Json(json!({}))))
}

/// GET /api/auth/logout - clear the session cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.add(state.sessions.cleared_cookie());
    (jar, Json(json!({})))
}

pub fn login_doc() -> ApiDoc {
    ApiDoc::new()
        .summary("Log in and receive a session cookie")
        .tag("auth")
        .body("email", Schema::string().non_nullable())
        .body("password", Schema::string().non_nullable())
        .returns(Schema::object(Vec::<(String, Schema)>::new()).non_nullable())
}

pub fn logout_doc() -> ApiDoc {
    ApiDoc::new()
        .summary("Clear the session cookie")
        .tag("auth")
        .returns(Schema::object(Vec::<(String, Schema)>::new()).non_nullable())
}
