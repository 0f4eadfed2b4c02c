//! Purchase orders: creation, receiving and manual status changes.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use saori_core::inputs::{NewPurchaseOrder, PurchaseQuery, PurchaseStatusUpdate, ReceivePurchaseOrder};
use saori_core::models::{PurchaseOrder, PurchaseOrderDetail};
use saori_core::Permission;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, OptionalBody, Params};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list).post(create))
        .route("/purchases/{id}/receive", post(receive))
        .route("/purchases/{id}/status", put(update_status))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<PurchaseQuery>,
) -> ApiResult<Json<Vec<PurchaseOrderDetail>>> {
    actor.require(Permission::PurchasesRead)?;
    Ok(Json(state.db.purchases().list(&query).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewPurchaseOrder>,
) -> ApiResult<Json<PurchaseOrderDetail>> {
    actor.require(Permission::PurchasesCreate)?;
    Ok(Json(state.db.purchases().create(&actor, request).await?))
}

/// Without a body every line receives its full pending quantity.
async fn receive(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    OptionalBody(request): OptionalBody<ReceivePurchaseOrder>,
) -> ApiResult<Json<PurchaseOrderDetail>> {
    actor.require(Permission::PurchasesReceive)?;
    Ok(Json(state.db.purchases().receive(&actor, &id, request).await?))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(update): Body<PurchaseStatusUpdate>,
) -> ApiResult<Json<PurchaseOrder>> {
    actor.require(Permission::PurchasesUpdate)?;
    Ok(Json(state.db.purchases().update_status(&actor, &id, &update).await?))
}
