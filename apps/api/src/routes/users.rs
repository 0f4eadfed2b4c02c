//! User administration and the activity log.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use saori_core::inputs::{NewUser, PageQuery, SearchQuery, UserPatch};
use saori_core::models::User;
use saori_core::validation::{optional_text, require_text, validate_password};
use saori_core::{PageRequest, Permission};
use serde_json::{json, Value};

use crate::auth::hash_password;
use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::routes::success;
use crate::state::AppState;

const DEFAULT_LOGS_LIMIT: u32 = 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{id}", put(update).delete(remove))
        .route("/logs", get(logs))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<SearchQuery>,
) -> ApiResult<Json<Vec<User>>> {
    actor.require(Permission::UsersRead)?;
    let search = optional_text(query.search.as_deref());
    Ok(Json(state.db.users().list(search.as_deref()).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewUser>,
) -> ApiResult<Json<User>> {
    actor.require(Permission::UsersCreate)?;

    require_text(request.name.as_deref(), "name")?;
    require_text(request.email.as_deref(), "email")?;
    request.role()?;
    let password = require_text(request.password.as_deref(), "password")?;
    validate_password(&password)?;

    let hash = hash_password(&password)?;
    Ok(Json(state.db.users().create(&actor, &request, &hash).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(patch): Body<UserPatch>,
) -> ApiResult<Json<User>> {
    actor.require(Permission::UsersUpdate)?;

    let hash = match optional_text(patch.password.as_deref()) {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password(&password)?)
        }
        None => None,
    };
    Ok(Json(state.db.users().update(&actor, &id, patch, hash).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::UsersDelete)?;
    state.db.users().soft_delete(&actor, &id).await?;
    Ok(success())
}

async fn logs(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<PageQuery>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::LogsRead)?;
    let page = PageRequest::new(query.page, query.limit, DEFAULT_LOGS_LIMIT);
    let (logs, pagination) = state.db.activity().list(page).await?;
    Ok(Json(json!({ "logs": logs, "pagination": pagination })))
}
