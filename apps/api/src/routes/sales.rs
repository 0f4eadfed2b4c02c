//! Point of sale: direct sales, history and the daily cut.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use saori_core::inputs::{NewSale, SaleQuery};
use saori_core::Permission;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list).post(create))
        .route("/sales/daily", get(daily))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<SaleQuery>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::SalesRead)?;
    let (sales, pagination) = state.db.sales().list(&query).await?;
    Ok(Json(json!({ "sales": sales, "pagination": pagination })))
}

/// The caller's own sales for the current UTC day.
async fn daily(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::SalesRead)?;
    let (sales, summary) = state.db.sales().daily(&actor).await?;
    Ok(Json(json!({ "sales": sales, "summary": summary })))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewSale>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::SalesCreate)?;
    let sale = state.db.sales().create(&actor, request).await?;
    Ok(Json(json!({ "success": true, "sale": sale })))
}

#[cfg(test)]
mod tests {
    use crate::testing::{admin_token, read_json, request, test_app, token_for};
    use axum::http::StatusCode;
    use saori_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn test_cash_sale_through_the_api() {
        let (app, state) = test_app().await;
        let admin = admin_token(&app).await;
        let (seller, _) = token_for(&state, Role::Vendedor, "v@saori.local").await;

        let product = json!({ "name": "Teclado", "code": "GAM-003", "priceCents": 10_000 });
        let response = request(&app, "POST", "/api/products", Some(&admin), Some(product)).await;
        let product_id = read_json(response).await["id"].as_str().unwrap().to_string();

        let sale = json!({
            "items": [{ "productId": product_id, "quantity": 2, "unitPriceCents": 10_000 }],
            "paymentMethod": "CASH",
            "amountPaidCents": 30_000,
        });
        let response = request(&app, "POST", "/api/sales", Some(&seller), Some(sale)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["sale"]["folio"], "V-000001");
        assert_eq!(body["sale"]["totalCents"], 23_200);
        assert_eq!(body["sale"]["changeCents"], 6_800);

        let daily = read_json(request(&app, "GET", "/api/sales/daily", Some(&seller), None).await).await;
        assert_eq!(daily["summary"]["count"], 1);
        assert_eq!(daily["summary"]["totalCents"], 23_200);

        let history = read_json(request(&app, "GET", "/api/sales?paymentMethod=cash", Some(&admin), None).await).await;
        assert_eq!(history["pagination"]["total"], 1);
        assert_eq!(history["sales"][0]["paymentMethod"], "CASH");
    }

    #[tokio::test]
    async fn test_invalid_sales_are_rejected() {
        let (app, _) = test_app().await;
        let admin = admin_token(&app).await;

        let empty = json!({ "items": [], "paymentMethod": "CASH", "amountPaidCents": 0 });
        let response = request(&app, "POST", "/api/sales", Some(&admin), Some(empty)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let decimal = json!({
            "items": [{ "productId": "p-1", "quantity": 1, "price": 100.0 }],
            "paymentMethod": "CASH",
            "amountPaid": 200.0,
        });
        let response = request(&app, "POST", "/api/sales", Some(&admin), Some(decimal)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let history = read_json(request(&app, "GET", "/api/sales", Some(&admin), None).await).await;
        assert_eq!(history["pagination"]["total"], 0);

        let response = request(&app, "GET", "/api/sales?dateFrom=ayer", Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = request(&app, "GET", "/api/sales", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
