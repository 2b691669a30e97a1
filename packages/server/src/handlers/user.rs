use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::auth::find_by_email;
use crate::models::auth::{UpdateUserRequest, UserResponse, validate_update_user_request};
use crate::models::shared::ApiResponse;
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    responses(
        (status = 200, description = "All users, without password hashes", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_users(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(ApiResponse::list(
        users.into_iter().map(UserResponse::from).collect(),
    )))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Only non-blank fields are applied. A new password is hashed before it is stored.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error or no fields (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already exists (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, by = auth_user.user_id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let payload = payload.normalized();
    if payload.is_empty() {
        return Err(AppError::Validation("No fields provided for update".into()));
    }
    validate_update_user_request(&payload)?;

    if let Some(ref email) = payload.email
        && let Some(other) = find_by_email(&state.db, email).await?
        && other.id != id
    {
        return Err(AppError::EmailTaken);
    }

    let mut active = user::ActiveModel {
        id: Unchanged(id),
        ..Default::default()
    };
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(password) = payload.password {
        let hash = hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password = Set(hash);
    }
    active.updated_at = Set(chrono::Utc::now());

    let user = active.update(&state.db).await.map_err(|e| match e {
        DbErr::RecordNotUpdated => AppError::NotFound("User not found".into()),
        e => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
            _ => AppError::from(e),
        },
    })?;

    info!(id, "User updated");
    Ok(Json(ApiResponse::with_message(
        UserResponse::from(user),
        "User updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, by = auth_user.user_id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    user::Entity::delete_by_id(id).exec(&state.db).await?;

    info!(id, "User deleted");
    Ok(Json(ApiResponse::with_message(
        UserResponse::from(user),
        "User deleted successfully",
    )))
}
