//! CRM pipeline.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use saori_core::inputs::{LeadPatch, LeadQuery, NewLead, ReminderQuery};
use saori_core::models::Lead;
use saori_core::Permission;
use serde_json::Value;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::routes::success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list).post(create))
        .route("/leads/reminders", get(reminders))
        .route("/leads/{id}", put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<LeadQuery>,
) -> ApiResult<Json<Vec<Lead>>> {
    actor.require(Permission::LeadsRead)?;
    Ok(Json(state.db.leads().list(&query).await?))
}

/// Open leads with a follow-up due in the next `days` (default 7).
async fn reminders(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<ReminderQuery>,
) -> ApiResult<Json<Vec<Lead>>> {
    actor.require(Permission::LeadsRead)?;
    Ok(Json(state.db.leads().reminders(query.days()).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewLead>,
) -> ApiResult<Json<Lead>> {
    actor.require(Permission::LeadsCreate)?;
    Ok(Json(state.db.leads().create(&actor, request).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(patch): Body<LeadPatch>,
) -> ApiResult<Json<Lead>> {
    actor.require(Permission::LeadsUpdate)?;
    Ok(Json(state.db.leads().update(&actor, &id, patch).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::LeadsDelete)?;
    state.db.leads().delete(&actor, &id).await?;
    Ok(success())
}
