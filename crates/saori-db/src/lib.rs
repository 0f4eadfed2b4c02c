//! # saori-db: Database Layer for Saori
//!
//! Storage and every transactional workflow of the Saori backend. SQLite
//! through sqlx, one `Transaction` per workflow.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Saori Data Flow                                  │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                         │
//! │       │  Actor + request DTO                                            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     saori-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ SaleRepo      │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ QuoteRepo     │    │ 001_initial  │   │   │
//! │  │   │ WAL + busy    │    │ PurchaseRepo  │    │   _schema    │   │   │
//! │  │   │ timeout       │    │ ...           │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite file  (<data dir>/saori.db)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use saori_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("data/saori.db")).await?;
//!
//! let receipt = db.sales().create(&actor, request).await?;
//! println!("{} {}", receipt.folio, receipt.total_cents);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::activity::ActivityRepository;
pub use repository::customer::CustomerRepository;
pub use repository::employee::EmployeeRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::lead::LeadRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::quote::QuoteRepository;
pub use repository::sale::SaleRepository;
pub use repository::setup::SetupRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::{Credentials, UserRepository};
