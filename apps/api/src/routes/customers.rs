//! Customer directory.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use saori_core::inputs::{CustomerPatch, NewCustomer, SearchQuery};
use saori_core::models::{Customer, CustomerListing};
use saori_core::Permission;
use serde_json::Value;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::routes::success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/{id}", put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<SearchQuery>,
) -> ApiResult<Json<Vec<CustomerListing>>> {
    actor.require(Permission::CustomersRead)?;
    Ok(Json(state.db.customers().list(query.search.as_deref()).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewCustomer>,
) -> ApiResult<Json<Customer>> {
    actor.require(Permission::CustomersCreate)?;
    Ok(Json(state.db.customers().create(&actor, request).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(patch): Body<CustomerPatch>,
) -> ApiResult<Json<Customer>> {
    actor.require(Permission::CustomersEdit)?;
    Ok(Json(state.db.customers().update(&actor, &id, patch).await?))
}

/// Refused while the customer has sales or quotes.
async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::CustomersDelete)?;
    state.db.customers().delete(&actor, &id).await?;
    Ok(success())
}

#[cfg(test)]
mod tests {
    use crate::testing::{admin_token, read_json, request, test_app, token_for};
    use axum::http::StatusCode;
    use saori_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn test_customer_crud() {
        let (app, state) = test_app().await;
        let admin = admin_token(&app).await;
        let (seller, _) = token_for(&state, Role::Vendedor, "v@saori.local").await;

        let body = json!({ "name": "Juan Pérez", "tags": ["mayoreo"] });
        let response = request(&app, "POST", "/api/customers", Some(&seller), Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = request(&app, "POST", "/api/customers", Some(&admin), Some(body)).await;
        let id = read_json(response).await["id"].as_str().unwrap().to_string();

        let list = read_json(request(&app, "GET", "/api/customers?search=juan", Some(&seller), None).await).await;
        assert_eq!(list[0]["tags"], json!(["mayoreo"]));
        assert_eq!(list[0]["totalOrders"], 0);

        let uri = format!("/api/customers/{id}");
        let response = request(&app, "PUT", &uri, Some(&admin), Some(json!({ "phone": "5555" }))).await;
        assert_eq!(read_json(response).await["phone"], "5555");

        let response = request(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = request(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
