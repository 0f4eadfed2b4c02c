//! Product catalog and categories.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use saori_core::inputs::{NewProduct, ProductPatch, ProductQuery};
use saori_core::models::{Category, Product, ProductListing};
use saori_core::Permission;
use serde_json::Value;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::routes::success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/{id}", put(update).delete(remove))
        .route("/categories", get(categories))
}

/// Active products with stock on the caller's branch.
async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<ProductQuery>,
) -> ApiResult<Json<Vec<ProductListing>>> {
    actor.require(Permission::ProductsRead)?;
    Ok(Json(state.db.products().list(&actor, &query).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewProduct>,
) -> ApiResult<Json<Product>> {
    actor.require(Permission::ProductsCreate)?;
    Ok(Json(state.db.products().create(&actor, request).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(patch): Body<ProductPatch>,
) -> ApiResult<Json<Product>> {
    actor.require(Permission::ProductsEdit)?;
    Ok(Json(state.db.products().update(&actor, &id, patch).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::ProductsDelete)?;
    state.db.products().soft_delete(&actor, &id).await?;
    Ok(success())
}

async fn categories(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<Category>>> {
    actor.require(Permission::ProductsRead)?;
    Ok(Json(state.db.products().categories().await?))
}

#[cfg(test)]
mod tests {
    use crate::testing::{admin_token, read_json, request, test_app, token_for};
    use axum::http::StatusCode;
    use saori_core::Role;
    use serde_json::json;

    async fn create_product(app: &axum::Router, token: &str) -> String {
        let body = json!({ "name": "Mouse Inalámbrico", "code": "ACC-001", "priceCents": 49_900 });
        let response = request(app, "POST", "/api/products", Some(token), Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_seller_cannot_delete_products() {
        let (app, state) = test_app().await;
        let admin = admin_token(&app).await;
        let (seller, _) = token_for(&state, Role::Vendedor, "v@saori.local").await;
        let id = create_product(&app, &admin).await;

        let uri = format!("/api/products/{id}");
        let response = request(&app, "DELETE", &uri, Some(&seller), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = read_json(response).await;
        assert_eq!(body["required"], "products:delete");

        let product = state.db.products().get(&id).await.unwrap().unwrap();
        assert!(product.active);
        assert_eq!(product.price_cents, 49_900);

        // Sellers still see the catalog.
        let response = request(&app, "GET", "/api/products", Some(&seller), None).await;
        assert_eq!(read_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_edit_and_soft_delete() {
        let (app, state) = test_app().await;
        let admin = admin_token(&app).await;
        let id = create_product(&app, &admin).await;
        let uri = format!("/api/products/{id}");

        let response = request(&app, "PUT", &uri, Some(&admin), Some(json!({ "priceCents": 45_000 }))).await;
        assert_eq!(read_json(response).await["priceCents"], 45_000);

        let response = request(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.db.products().get(&id).await.unwrap().unwrap().active);

        let response = request(&app, "GET", "/api/products?search=mouse", Some(&admin), None).await;
        assert!(read_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_name_is_rejected() {
        let (app, _) = test_app().await;
        let admin = admin_token(&app).await;
        let response = request(&app, "POST", "/api/products", Some(&admin), Some(json!({ "priceCents": 100 }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
