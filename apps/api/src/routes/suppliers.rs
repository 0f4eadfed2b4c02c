//! Supplier directory.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use saori_core::inputs::{NewSupplier, SearchQuery, SupplierPatch};
use saori_core::models::{Supplier, SupplierListing};
use saori_core::Permission;
use serde_json::Value;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::routes::success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list).post(create))
        .route("/suppliers/{id}", put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<SearchQuery>,
) -> ApiResult<Json<Vec<SupplierListing>>> {
    actor.require(Permission::SuppliersRead)?;
    Ok(Json(state.db.suppliers().list(query.search.as_deref()).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewSupplier>,
) -> ApiResult<Json<Supplier>> {
    actor.require(Permission::SuppliersCreate)?;
    Ok(Json(state.db.suppliers().create(&actor, request).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(patch): Body<SupplierPatch>,
) -> ApiResult<Json<Supplier>> {
    actor.require(Permission::SuppliersUpdate)?;
    Ok(Json(state.db.suppliers().update(&actor, &id, patch).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::SuppliersDelete)?;
    state.db.suppliers().delete(&actor, &id).await?;
    Ok(success())
}
