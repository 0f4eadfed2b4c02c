//! # saori-core: Pure Business Rules for Saori
//!
//! Everything the workflows decide, without touching a database or a socket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Saori Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                saori-api (axum, JWT, permission gate)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Actor + request DTOs                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              saori-db (sqlx transactions, repositories)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ saori-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   money   pricing   receiving   folio   permissions   inputs   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` in integer cents
//! - [`types`] - `Percent`, status enums, [`Actor`], pagination
//! - [`permissions`] - the static role → permission table
//! - [`folio`] - folio formatting and parsing
//! - [`pricing`] - line and document totals for sales and quotes
//! - [`receiving`] - purchase-order receipt planning and status derivation
//! - [`validation`] - field-level checks
//! - [`inputs`] - request payloads and partial-update patches
//! - [`models`] - persisted entities and read views
//! - [`activity`] - activity log actions and messages
//! - [`error`] - domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use saori_core::pricing::{price_lines, LineInput};
//! use saori_core::{Money, Percent, TAX_RATE};
//!
//! let doc = price_lines(
//!     &[LineInput {
//!         product_id: "p-1".to_string(),
//!         quantity: 2,
//!         unit_price: Money::from_cents(10_000),
//!         discount: Percent::zero(),
//!     }],
//!     TAX_RATE,
//! )
//! .unwrap();
//!
//! assert_eq!(doc.tax.cents(), 3_200);
//! assert_eq!(doc.total.cents(), 23_200);
//! ```

pub mod activity;
pub mod error;
pub mod folio;
pub mod inputs;
pub mod models;
pub mod money;
pub mod permissions;
pub mod pricing;
pub mod receiving;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use folio::FolioKind;
pub use money::Money;
pub use permissions::Permission;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sales tax applied to every sale and quote subtotal (16% IVA).
pub const TAX_RATE: Percent = Percent::from_bps(1600);

/// Maximum number of lines on a sale, quote or purchase order.
pub const MAX_DOCUMENT_LINES: usize = 100;

/// Maximum quantity of a single line.
pub const MAX_ITEM_QUANTITY: i64 = 99_999;

/// Maximum price or cost in cents ($10,000,000.00).
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_DOCUMENT_LINES`] this keeps every
/// document total well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Placeholder name snapshotted for a sale line whose product no longer
/// resolves.
pub const MISSING_PRODUCT_NAME: &str = "Producto";

/// Placeholder code for the same case.
pub const MISSING_PRODUCT_CODE: &str = "N/A";

/// Shown for sales without a customer.
pub const WALK_IN_CUSTOMER: &str = "Público en General";
