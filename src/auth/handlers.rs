use axum::{
    extract::State,
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, PasswordChangeRequest, RefreshRequest, RegisterRequest},
        error::AuthError,
        repo_types::PublicUser,
        services::NewAccount,
        validate::{validate, PASSWORD_CHANGE_RULES, REFRESH_RULES, REGISTER_RULES},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(login))
        .route("/auth/", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/register", post(register))
        .route("/auth/password", put(change_password))
        .route("/auth/deactivate", post(deactivate))
}

/// Client-side outcomes were already logged where they were decided; only server
/// failures are logged here.
fn reject(e: AuthError) -> (StatusCode, String) {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "auth request failed");
    }
    (status, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state
        .verifier
        .login(&payload.email, &payload.password)
        .await
        .map_err(reject)?;
    Ok(Json(user))
}

/// Token handling is not implemented; this only checks that both fields are present.
#[instrument(skip(payload))]
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> Result<StatusCode, (StatusCode, String)> {
    validate(
        REFRESH_RULES,
        &[
            ("token", payload.token.as_str()),
            ("refreshToken", payload.refresh_token.as_str()),
        ],
    )
    .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    validate(
        REGISTER_RULES,
        &[("email", payload.email.as_str()), ("password", payload.password.as_str())],
    )
    .map_err(reject)?;

    let user = state
        .store
        .create(NewAccount {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            second_name: payload.second_name,
        })
        .await
        .map_err(reject)?;

    info!(user_id = %user.id(), email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    validate(
        PASSWORD_CHANGE_RULES,
        &[
            ("email", payload.email.as_str()),
            ("password", payload.password.as_str()),
            ("new_password", payload.new_password.as_str()),
        ],
    )
    .map_err(reject)?;

    let user = state
        .verifier
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(reject)?;
    if !user.is_active {
        return Err(reject(AuthError::AccountDisabled));
    }

    let user = state
        .store
        .update_password(&user, payload.new_password)
        .await
        .map_err(reject)?;
    Ok(Json(user.into()))
}

/// Soft-disables the caller's own account. Records are never deleted.
#[instrument(skip(state, payload))]
pub async fn deactivate(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = state
        .verifier
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(reject)?;
    if user.is_active {
        state.store.set_active(&user, false).await.map_err(reject)?;
    }
    Ok(StatusCode::NO_CONTENT)
}
