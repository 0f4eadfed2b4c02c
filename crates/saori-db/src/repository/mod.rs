//! # Repository Module
//!
//! One repository per aggregate. Reads go straight to the pool; every
//! mutation runs inside one `sqlx::Transaction` together with its activity
//! log entry.
//!
//! ## Workflow Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  API handler                                                            │
//! │       │  db.sales().create(&actor, request)                             │
//! │       ▼                                                                 │
//! │  saori-core: validate + price          (no transaction open yet)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  ├── folio::next_folio(&mut *tx, kind)                                  │
//! │  ├── INSERT parent + items                                              │
//! │  ├── product::adjust_stock(&mut *tx, ..)   (delta upsert, never RMW)    │
//! │  ├── activity::record(&mut *tx, ..)                                     │
//! │  COMMIT                               (any `?` drops tx → ROLLBACK)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`setup::SetupRepository`] - first-run bootstrap
//! - [`user::UserRepository`] - accounts and credentials
//! - [`activity::ActivityRepository`] - the audit trail
//! - [`product::ProductRepository`] - catalog, categories, stock
//! - [`sale::SaleRepository`] - direct sales
//! - [`quote::QuoteRepository`] - quotes and conversion
//! - [`customer::CustomerRepository`], [`supplier::SupplierRepository`]
//! - [`purchase::PurchaseRepository`] - purchase orders and receiving
//! - [`lead::LeadRepository`] - CRM pipeline
//! - [`expense::ExpenseRepository`]
//! - [`employee::EmployeeRepository`] - employees and positions

pub mod activity;
pub mod customer;
pub mod employee;
pub mod expense;
pub mod folio;
pub mod lead;
pub mod product;
pub mod purchase;
pub mod quote;
pub mod sale;
pub mod setup;
pub mod supplier;
pub mod user;

use uuid::Uuid;

/// Generates a new row id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// `%term%` for LIKE filters.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}

// =============================================================================
// Test Fixtures
// =============================================================================
