//! Quotes and their conversion into sales.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use saori_core::inputs::{ConvertQuote, NewQuote, QuoteQuery, QuoteStatusUpdate};
use saori_core::Permission;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, CurrentUser, OptionalBody, Params};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list).post(create))
        .route("/quotes/{id}", get(detail))
        .route("/quotes/{id}/status", put(update_status))
        .route("/quotes/{id}/convert", post(convert))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<QuoteQuery>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::QuotesRead)?;
    let (quotes, pagination) = state.db.quotes().list(&query).await?;
    Ok(Json(json!({ "quotes": quotes, "pagination": pagination })))
}

async fn detail(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::QuotesRead)?;
    let quote = state
        .db
        .quotes()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quote not found: {id}")))?;
    Ok(Json(json!({ "quote": quote })))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewQuote>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::QuotesCreate)?;
    let quote = state.db.quotes().create(&actor, request).await?;
    Ok(Json(json!({ "success": true, "quote": quote })))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(update): Body<QuoteStatusUpdate>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::QuotesUpdate)?;
    let quote = state.db.quotes().update_status(&actor, &id, &update).await?;
    Ok(Json(json!({ "success": true, "quote": quote })))
}

/// Body is optional; the payment method defaults to CASH.
async fn convert(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    OptionalBody(request): OptionalBody<ConvertQuote>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::QuotesConvert)?;
    let sale = state.db.quotes().convert(&actor, &id, request).await?;
    Ok(Json(json!({ "success": true, "sale": sale })))
}

#[cfg(test)]
mod tests {
    use crate::testing::{admin_token, read_json, request, test_app, token_for};
    use axum::http::StatusCode;
    use saori_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn test_quote_lifecycle() {
        let (app, state) = test_app().await;
        let admin = admin_token(&app).await;
        let (seller, _) = token_for(&state, Role::Vendedor, "v@saori.local").await;

        let product = json!({ "name": "Monitor", "code": "ACC-002", "priceCents": 5_000 });
        let response = request(&app, "POST", "/api/products", Some(&admin), Some(product)).await;
        let product_id = read_json(response).await["id"].as_str().unwrap().to_string();

        let quote = json!({
            "items": [{ "productId": product_id, "quantity": 3, "unitPriceCents": 5_000, "discountPercent": 10 }],
        });
        let response = request(&app, "POST", "/api/quotes", Some(&seller), Some(quote)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let created = read_json(response).await;
        assert_eq!(created["quote"]["folio"], "COT-00001");
        assert_eq!(created["quote"]["totalCents"], 15_660);
        let id = created["quote"]["id"].as_str().unwrap().to_string();

        // Sellers convert but cannot change status by hand.
        let status_uri = format!("/api/quotes/{id}/status");
        let response = request(&app, "PUT", &status_uri, Some(&seller), Some(json!({ "status": "SENT" }))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let convert_uri = format!("/api/quotes/{id}/convert");
        let response = request(&app, "POST", &convert_uri, Some(&seller), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let converted = read_json(response).await;
        assert_eq!(converted["sale"]["folio"], "V-000001");
        assert_eq!(converted["sale"]["totalCents"], 15_660);

        let response = request(&app, "POST", &convert_uri, Some(&seller), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let detail = read_json(request(&app, "GET", &format!("/api/quotes/{id}"), Some(&seller), None).await).await;
        assert_eq!(detail["quote"]["status"], "CONVERTED");

        let response = request(&app, "GET", "/api/quotes/no-such-quote", Some(&seller), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
