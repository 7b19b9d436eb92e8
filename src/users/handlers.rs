use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{DeleteUsersRequest, MessageResponse, Pagination, PublicUser, UpdateUserRequest},
    repo::UserChanges,
};
use crate::{
    auth::validate::{check_name, check_phone},
    error::{ApiError, FieldError},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

/// Must sit behind `require_auth`.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).delete(delete_users))
        .route("/users/:id", get(get_user).put(update_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = state
        .store
        .list(p.limit.clamp(1, 100), p.offset.max(0))
        .await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.store.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let mut errors = Vec::new();
    if payload.name.is_none() && payload.phone.is_none() {
        errors.push(FieldError::new("Nothing to update"));
    }
    if let Some(name) = &payload.name {
        check_name(name, &mut errors);
    }
    let phone = payload
        .phone
        .as_deref()
        .and_then(|raw| check_phone(raw, &mut errors));
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let changes = UserChanges {
        name: payload.name.map(|n| n.trim().to_string()),
        phone,
    };
    let user = state
        .store
        .update(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn delete_users(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteUsersRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.ids.is_empty() {
        warn!("bulk delete without ids");
        return Err(ApiError::Validation(vec![FieldError::field(
            "ids",
            "At least one id is required",
        )]));
    }

    let removed = state.store.delete_many(&payload.ids).await?;
    info!(requested = payload.ids.len(), removed, "users deleted");
    Ok(Json(MessageResponse {
        msg: format!("Deleted {} users", removed),
    }))
}
