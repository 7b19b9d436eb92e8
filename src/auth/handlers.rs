use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Extension, Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        middleware::AuthUser,
        password::{hash_password_async, verify_password_async, PasswordError},
        validate::{check_login_password, check_name, check_new_password, check_phone, check_role},
    },
    error::ApiError,
    extract::AppJson,
    state::AppState,
    users::{dto::PublicUser, repo::NewUser},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Must sit behind `require_auth`.
pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut errors = Vec::new();
    check_name(&payload.name, &mut errors);
    check_role(&payload.role, &mut errors);
    let phone = check_phone(&payload.phone, &mut errors);
    check_new_password(&payload.password, &mut errors);

    let Some(phone) = phone.filter(|_| errors.is_empty()) else {
        warn!(fields = errors.len(), "register validation failed");
        return Err(ApiError::Validation(errors));
    };

    if state.store.find_by_phone(&phone).await?.is_some() {
        warn!(phone = %phone, "phone already registered");
        return Err(ApiError::DuplicateUser);
    }

    let password_hash = hash_password_async(payload.password)
        .await
        .map_err(ApiError::internal)?;

    // A concurrent registration can still win the race; the unique index
    // turns that into DuplicateUser.
    let user = state
        .store
        .create(NewUser {
            name: payload.name.trim().to_string(),
            phone,
            password_hash,
            role: payload.role.trim().to_string(),
        })
        .await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.issue(user.id).map_err(ApiError::internal)?;

    info!(user_id = %user.id, phone = %user.phone, "user registered");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut errors = Vec::new();
    let phone = check_phone(&payload.phone, &mut errors);
    check_login_password(&payload.password, &mut errors);

    let Some(phone) = phone.filter(|_| errors.is_empty()) else {
        return Err(ApiError::Validation(errors));
    };

    let user = match state.store.find_by_phone(&phone).await? {
        Some(u) => u,
        None => {
            warn!(phone = %phone, "login unknown phone");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let ok = match verify_password_async(payload.password, user.password_hash.clone()).await {
        Ok(v) => v,
        Err(PasswordError::Format(e)) => {
            error!(user_id = %user.id, error = %e, "stored password hash is malformed");
            false
        }
        Err(e) => return Err(ApiError::internal(e)),
    };

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.issue(user.id).map_err(ApiError::internal)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

/// Returns `null` when the token is still valid but its user was deleted.
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Option<PublicUser>>, ApiError> {
    let user = state.store.find_by_id(user_id).await?;
    if user.is_none() {
        warn!(user_id = %user_id, "token subject no longer exists");
    }
    Ok(Json(user.map(PublicUser::from)))
}
