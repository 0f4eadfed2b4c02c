//! Login, token refresh and the current session.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use saori_core::inputs::{LoginRequest, RefreshRequest};
use saori_core::models::User;
use saori_core::permissions::permission_names;
use saori_core::validation::require_text;
use saori_core::Role;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, CurrentUser};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Credenciales incorrectas";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
}

/// The signed-in user as the client keeps it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub branch_id: Option<String>,
    pub branch_name: Option<String>,
    pub permissions: Vec<&'static str>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        SessionUser {
            permissions: permission_names(user.role),
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            branch_id: user.branch_id,
            branch_name: user.branch_name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub token: String,
    pub refresh_token: String,
}

/// Signs a fresh token pair for `user`.
pub(crate) fn issue_session(state: &AppState, user: User) -> ApiResult<Session> {
    let token = state.jwt.generate_access_token(&user)?;
    let refresh_token = state.jwt.generate_refresh_token(&user)?;
    Ok(Session {
        user: user.into(),
        token,
        refresh_token,
    })
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Body(request): Body<LoginRequest>,
) -> ApiResult<Json<Session>> {
    let email = require_text(request.email.as_deref(), "email")?;
    let password = require_text(request.password.as_deref(), "password")?;

    let Some(credentials) = state.db.users().find_credentials(&email).await? else {
        warn!(%email, "Login rejected: unknown or inactive account");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };
    if !verify_password(&password, &credentials.password_hash) {
        warn!(%email, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let user = credentials.user;
    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    state.db.activity().record_login(&user.id, user_agent).await?;

    info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(Json(issue_session(&state, user)?))
}

/// Trades a refresh token for a new access token.
async fn refresh(
    State(state): State<AppState>,
    Body(request): Body<RefreshRequest>,
) -> ApiResult<Json<Value>> {
    let token = require_text(request.refresh_token.as_deref(), "refreshToken")?;
    let claims = state.jwt.validate_refresh_token(&token)?;

    let user = state
        .db
        .users()
        .get(&claims.sub)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| ApiError::Unauthorized("Usuario no encontrado o inactivo".to_string()))?;

    let token = state.jwt.generate_access_token(&user)?;
    Ok(Json(json!({ "token": token })))
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<SessionUser>> {
    let user = state
        .db
        .users()
        .get(&actor.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", actor.user_id)))?;
    Ok(Json(user.into()))
}
