//! # HTTP Routes
//!
//! One module per resource. Each handler extracts the [`CurrentUser`],
//! checks the route's permission, and hands the actor to a `saori-db`
//! workflow.
//!
//! ```text
//! /api
//!  ├── /health, /setup/*            public
//!  ├── /auth/*                      login, refresh (public), me
//!  ├── /users, /logs                administration
//!  ├── /products, /categories       catalog
//!  ├── /sales, /quotes              point of sale
//!  ├── /customers, /leads           CRM
//!  ├── /suppliers, /purchases       purchasing
//!  └── /expenses, /employees, ...   back office
//! ```
//!
//! [`CurrentUser`]: crate::extract::CurrentUser

use axum::Json;
use axum::Router;
use serde_json::{json, Value};

use crate::state::AppState;

pub mod auth;
pub mod customers;
pub mod employees;
pub mod expenses;
pub mod leads;
pub mod products;
pub mod purchases;
pub mod quotes;
pub mod sales;
pub mod suppliers;
pub mod system;
pub mod users;

/// Every `/api` route.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(system::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(products::router())
        .merge(sales::router())
        .merge(quotes::router())
        .merge(customers::router())
        .merge(suppliers::router())
        .merge(purchases::router())
        .merge(leads::router())
        .merge(expenses::router())
        .merge(employees::router())
}

/// `{ "success": true }`, the body of every delete.
pub(crate) fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}
