//! # Saori API
//!
//! Local REST server for the Saori point-of-sale and business management
//! system.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Saori API Server                               │
//! │                                                                         │
//! │  Browser UI ───► HTTP (3001) ───► /api/* routes ───► saori-db (SQLite)  │
//! │                       │                 │                               │
//! │                  CORS + trace     CurrentUser (JWT)                     │
//! │                                   + role permission                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Read from `saori.toml` (path overridable with `SAORI_CONFIG`), then the
//! environment:
//! - `API_HOST` / `PORT` - bind address (default: 127.0.0.1:3001)
//! - `DATABASE_URL` or `SAORI_DB_PATH` - SQLite file
//! - `JWT_SECRET` - signing secret; generated and persisted when absent
//! - `JWT_ACCESS_LIFETIME_SECS` - access token lifetime (default: 28800)
//! - `JWT_REFRESH_LIFETIME_SECS` - refresh token lifetime (default: 604800)
//! - `CORS_ORIGINS` - comma separated list of allowed origins

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full application: every route under `/api`, plus tracing and
/// CORS.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/api", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for route tests: an in-memory database behind the
    //! real router.

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use axum::Router;
    use saori_core::inputs::NewUser;
    use saori_core::Role;
    use saori_db::{Database, DbConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::{hash_password, JwtManager};
    use crate::config::ApiConfig;
    use crate::state::AppState;

    pub const ADMIN_EMAIL: &str = "admin@saori.local";
    pub const ADMIN_PASSWORD: &str = "admin12345";

    const TEST_SECRET: &str = "route-tests-secret-with-at-least-32-bytes";

    pub async fn test_app() -> (Router, AppState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig::default();
        let jwt = JwtManager::new(
            TEST_SECRET,
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );
        let state = AppState::new(db, jwt, config);
        (crate::build_router(state.clone()), state)
    }

    pub async fn request(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    pub async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Runs first-run setup and returns the administrator's access token.
    pub async fn admin_token(app: &Router) -> String {
        let body = json!({ "name": "Admin", "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD });
        let response = request(app, "POST", "/api/setup/first-user", None, Some(body)).await;
        assert!(response.status().is_success(), "setup failed: {}", response.status());
        read_json(response).await["token"].as_str().unwrap().to_string()
    }

    /// Creates a user with `role` on the administrator's branch and returns
    /// `(access token, user id)`. Requires [`admin_token`] to have run.
    pub async fn token_for(state: &AppState, role: Role, email: &str) -> (String, String) {
        let admin = state
            .db
            .users()
            .find_credentials(ADMIN_EMAIL)
            .await
            .unwrap()
            .expect("administrator not bootstrapped")
            .user;
        let admin_token = state.jwt.generate_access_token(&admin).unwrap();
        let actor = state.jwt.validate_access_token(&admin_token).unwrap().actor();

        let request = NewUser {
            name: Some(format!("{} user", role.as_str())),
            email: Some(email.to_string()),
            password: Some("password123".to_string()),
            role: Some(role.as_str().to_string()),
            branch_id: None,
        };
        let hash = hash_password("password123").unwrap();
        let user = state.db.users().create(&actor, &request, &hash).await.unwrap();
        let token = state.jwt.generate_access_token(&user).unwrap();
        (token, user.id)
    }
}
