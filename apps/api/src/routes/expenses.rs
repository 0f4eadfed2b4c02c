//! Expenses and expense categories.

use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use saori_core::inputs::{ExpenseQuery, NewExpense};
use saori_core::models::{Expense, ExpenseCategory};
use saori_core::Permission;
use serde_json::Value;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::routes::success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list).post(create))
        .route("/expenses/{id}", delete(remove))
        .route("/expense-categories", get(categories))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<ExpenseQuery>,
) -> ApiResult<Json<Vec<Expense>>> {
    actor.require(Permission::ExpensesRead)?;
    Ok(Json(state.db.expenses().list(&query).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewExpense>,
) -> ApiResult<Json<Expense>> {
    actor.require(Permission::ExpensesCreate)?;
    Ok(Json(state.db.expenses().create(&actor, request).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::ExpensesDelete)?;
    state.db.expenses().delete(&actor, &id).await?;
    Ok(success())
}

async fn categories(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<ExpenseCategory>>> {
    actor.require(Permission::ExpensesRead)?;
    Ok(Json(state.db.expenses().categories().await?))
}
