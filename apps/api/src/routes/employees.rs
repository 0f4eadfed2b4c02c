//! Staff records and positions.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use saori_core::inputs::{EmployeePatch, NewEmployee, SearchQuery};
use saori_core::models::{Employee, Position};
use saori_core::Permission;
use serde_json::Value;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentUser, Params};
use crate::routes::success;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list).post(create))
        .route("/employees/{id}", put(update).delete(remove))
        .route("/positions", get(positions))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Params(query): Params<SearchQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    actor.require(Permission::EmployeesRead)?;
    Ok(Json(state.db.employees().list(query.search.as_deref()).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Body(request): Body<NewEmployee>,
) -> ApiResult<Json<Employee>> {
    actor.require(Permission::EmployeesCreate)?;
    Ok(Json(state.db.employees().create(&actor, request).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Body(patch): Body<EmployeePatch>,
) -> ApiResult<Json<Employee>> {
    actor.require(Permission::EmployeesEdit)?;
    Ok(Json(state.db.employees().update(&actor, &id, patch).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    actor.require(Permission::EmployeesDelete)?;
    state.db.employees().delete(&actor, &id).await?;
    Ok(success())
}

async fn positions(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<Position>>> {
    actor.require(Permission::EmployeesRead)?;
    Ok(Json(state.db.employees().positions().await?))
}

#[cfg(test)]
mod tests {
    use crate::testing::{admin_token, read_json, request, test_app, token_for};
    use axum::http::StatusCode;
    use saori_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn test_employee_codes_and_supervisor_read_only() {
        let (app, state) = test_app().await;
        let admin = admin_token(&app).await;
        let (supervisor, _) = token_for(&state, Role::Supervisor, "s@saori.local").await;

        sqlx::query("INSERT INTO positions (id, name, active) VALUES ('pos-1', 'Cajero', 1)")
            .execute(state.db.pool())
            .await
            .unwrap();

        let body = json!({
            "name": "Ana López",
            "positionId": "pos-1",
            "salaryCents": 1_200_000,
            "hireDate": "2025-02-01",
        });
        let response = request(&app, "POST", "/api/employees", Some(&supervisor), Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = request(&app, "POST", "/api/employees", Some(&admin), Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["code"], "EMP-00001");

        let positions = read_json(request(&app, "GET", "/api/positions", Some(&supervisor), None).await).await;
        assert_eq!(positions[0]["employees"], 1);
    }
}
