//! Health check and first-run setup.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use saori_core::inputs::FirstUserRequest;
use saori_core::validation::{require_text, validate_password};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::hash_password;
use crate::error::{ApiError, ApiResult};
use crate::extract::Body;
use crate::routes::auth::{issue_session, Session};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/setup/status", get(setup_status))
        .route("/setup/first-user", post(first_user))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "database": state.db.health_check().await,
    }))
}

async fn setup_status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let requires_setup = state.db.setup().requires_setup().await?;
    Ok(Json(json!({ "requiresSetup": requires_setup })))
}

/// Creates the main branch and the first ADMIN, then signs them in.
async fn first_user(
    State(state): State<AppState>,
    Body(request): Body<FirstUserRequest>,
) -> ApiResult<Json<Session>> {
    if !state.db.setup().requires_setup().await? {
        return Err(ApiError::Conflict {
            message: "System is already initialized".to_string(),
            retryable: false,
        });
    }

    require_text(request.name.as_deref(), "name")?;
    require_text(request.email.as_deref(), "email")?;
    let password = require_text(request.password.as_deref(), "password")?;
    validate_password(&password)?;

    let hash = hash_password(&password)?;
    let user = state.db.setup().bootstrap(&request, &hash).await?;
    info!(user_id = %user.id, "First administrator created");

    Ok(Json(issue_session(&state, user)?))
}

#[cfg(test)]
mod tests {
    use crate::testing::{read_json, request, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app().await;
        let response = request(&app, "GET", "/api/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_first_user_flow() {
        let (app, _) = test_app().await;

        let status = read_json(request(&app, "GET", "/api/setup/status", None, None).await).await;
        assert_eq!(status["requiresSetup"], true);

        let short = json!({ "name": "Admin", "email": "admin@saori.local", "password": "corta" });
        let response = request(&app, "POST", "/api/setup/first-user", None, Some(short)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json!({
            "name": "Admin",
            "email": " Admin@Saori.Local ",
            "password": "admin12345",
        });
        let response = request(&app, "POST", "/api/setup/first-user", None, Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = read_json(response).await;
        assert_eq!(session["user"]["email"], "admin@saori.local");
        assert_eq!(session["user"]["role"], "ADMIN");
        assert_eq!(session["user"]["branchName"], "Sucursal Principal");
        assert!(session["token"].as_str().is_some());

        let response = request(&app, "POST", "/api/setup/first-user", None, Some(body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let status = read_json(request(&app, "GET", "/api/setup/status", None, None).await).await;
        assert_eq!(status["requiresSetup"], false);
    }
}
