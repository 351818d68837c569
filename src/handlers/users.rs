// handlers/users.rs - /api/users/* handlers
//
// Admin gating happens at the route group; these handlers assume it passed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::api::Payload;
use crate::docs::{ApiDoc, Schema};
use crate::error::ApiError;
use crate::models::{User, UserEnvelope};
use crate::state::AppState;
use crate::validation::Shape;

/// Contract checked on the `user` field of add/update bodies.
pub const USER_SHAPE: Shape = Shape::new("User", User::instance_of);

/// GET /api/users/all
pub async fn get_all(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = state.users.get_all().await?;
    Ok(Json(json!({ "users": users })))
}

/// POST /api/users/add
pub async fn add(
    State(state): State<AppState>,
    Payload(body): Payload<UserEnvelope>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.users.add_one(body.user).await?;
    Ok((StatusCode::CREATED, Json(json!({}))))
}

/// PUT /api/users/update
pub async fn update(
    State(state): State<AppState>,
    Payload(body): Payload<UserEnvelope>,
) -> Result<Json<Value>, ApiError> {
    state.users.update_one(body.user).await?;
    Ok(Json(json!({})))
}

/// DELETE /api/users/delete/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    // The validator has already checked this is numeric.
    let id = id
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64)
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    state.users.delete(id).await?;
    Ok(Json(json!({})))
}

fn user_schema() -> Schema {
    Schema::object([
        ("id", Schema::integer().non_nullable()),
        ("name", Schema::string().non_nullable()),
        ("email", Schema::string().non_nullable()),
        ("role", Schema::union(["standard", "admin"]).non_nullable()),
        ("password", Schema::string()),
    ])
}

pub fn get_all_doc() -> ApiDoc {
    ApiDoc::new()
        .summary("List all users")
        .tag("users")
        .returns(
            Schema::object([(
                "users",
                Schema::list(
                    Schema::object([
                        ("id", Schema::integer().non_nullable()),
                        ("name", Schema::string().non_nullable()),
                        ("email", Schema::string().non_nullable()),
                        ("role", Schema::union(["standard", "admin"]).non_nullable()),
                    ])
                    .non_nullable(),
                )
                .non_nullable(),
            )])
            .non_nullable(),
        )
}

pub fn add_doc() -> ApiDoc {
    ApiDoc::new()
        .summary("Create a user")
        .tag("users")
        .body("user", user_schema().non_nullable())
}

pub fn update_doc() -> ApiDoc {
    ApiDoc::new()
        .summary("Update a user")
        .tag("users")
        .body("user", user_schema().non_nullable())
}

pub fn delete_doc() -> ApiDoc {
    ApiDoc::new().summary("Delete a user by id").tag("users")
}
