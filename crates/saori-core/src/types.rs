//! # Domain Types
//!
//! Value types shared by every workflow: percentages, status enums, the
//! request actor and pagination.
//!
//! ## Status Enums
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Role                 ADMIN │ SUPERVISOR │ VENDEDOR                     │
//! │  SaleStatus           COMPLETED │ CANCELLED │ PENDING                   │
//! │  PaymentMethod        CASH │ CARD │ TRANSFER                            │
//! │  QuoteStatus          DRAFT │ SENT │ ACCEPTED │ REJECTED │ CONVERTED    │
//! │  PurchaseOrderStatus  OPEN │ PARTIAL │ RECEIVED │ CANCELLED             │
//! │  LeadStatus           NEW │ CONTACTED │ NEGOTIATION │ WON │ LOST        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All of them travel as SCREAMING_SNAKE_CASE strings, both in JSON and in
//! the TEXT columns of the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::permissions::{has_permission, Permission};

// =============================================================================
// Percent
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1600 bps = 16% and 10000 bps = 100%.
/// Used for the sales tax rate and for per-line discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// 100%.
    pub const FULL: Percent = Percent(10_000);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from a human value (`12.5` → 1250 bps).
    ///
    /// Callers validate the range first; negative inputs clamp to zero.
    pub fn from_percentage(pct: f64) -> Self {
        Percent((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

// =============================================================================
// String-backed enums
// =============================================================================

/// Implements `as_str`, `ALL`, `Display` and a validating `FromStr` for a
/// unit enum whose wire form is the SCREAMING_SNAKE_CASE variant name.
macro_rules! wire_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $ty::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Role
// =============================================================================

/// The role of a user. Roles carry a fixed permission set, see
/// [`crate::permissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Supervisor,
    Vendedor,
}

wire_enum!(Role, "role", {
    Admin => "ADMIN",
    Supervisor => "SUPERVISOR",
    Vendedor => "VENDEDOR",
});

// =============================================================================
// Sale Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Paid and finalized. Every sale created by a workflow starts here.
    Completed,
    Cancelled,
    Pending,
}

wire_enum!(SaleStatus, "status", {
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    Pending => "PENDING",
});

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

wire_enum!(PaymentMethod, "paymentMethod", {
    Cash => "CASH",
    Card => "CARD",
    Transfer => "TRANSFER",
});

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Quote Status
// =============================================================================

/// Lifecycle of a quote.
///
/// ```text
/// DRAFT ⇄ SENT ⇄ ACCEPTED ⇄ REJECTED      (free manual edits)
///   └────────┴───────┴──────────┴──► CONVERTED   (conversion only, terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Converted,
}

wire_enum!(QuoteStatus, "status", {
    Draft => "DRAFT",
    Sent => "SENT",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
    Converted => "CONVERTED",
});

impl QuoteStatus {
    /// Checks a manual status change requested through the status endpoint.
    pub fn check_manual_transition(self, to: QuoteStatus) -> CoreResult<()> {
        if self == QuoteStatus::Converted {
            return Err(CoreError::invalid_state(
                "Quote was already converted to a sale",
            ));
        }
        if to == QuoteStatus::Converted {
            return Err(CoreError::invalid_state(
                "Quotes become CONVERTED only through conversion",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Purchase Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Open,
    Partial,
    Received,
    Cancelled,
}

wire_enum!(PurchaseOrderStatus, "status", {
    Open => "OPEN",
    Partial => "PARTIAL",
    Received => "RECEIVED",
    Cancelled => "CANCELLED",
});

// =============================================================================
// Lead Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Negotiation,
    Won,
    Lost,
}

wire_enum!(LeadStatus, "status", {
    New => "NEW",
    Contacted => "CONTACTED",
    Negotiation => "NEGOTIATION",
    Won => "WON",
    Lost => "LOST",
});

impl LeadStatus {
    /// Closed leads never show up in follow-up reminders.
    pub const fn is_closed(&self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The authenticated identity on whose behalf a workflow runs.
///
/// Built by the API layer from a verified access token and passed
/// explicitly into every workflow call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub branch_id: Option<String>,
}

impl Actor {
    /// Fails with [`CoreError::Forbidden`] unless the actor's role grants
    /// `permission`.
    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        if has_permission(self.role, permission) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                required: permission.as_str().to_string(),
            })
        }
    }

    /// The actor's branch. Stock-moving workflows cannot run without one.
    pub fn branch(&self) -> CoreResult<&str> {
        self.branch_id
            .as_deref()
            .ok_or_else(|| ValidationError::required("branchId").into())
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// A page request, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const MAX_LIMIT: u32 = 500;

    /// Clamps page to ≥ 1 and limit to `1..=MAX_LIMIT`, using `default_limit`
    /// when none was given.
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    /// Builds the response envelope for `total` matching rows.
    pub fn paginate(&self, total: i64) -> Pagination {
        let limit = self.limit as i64;
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, branch: Option<&str>) -> Actor {
        Actor {
            user_id: "u-1".to_string(),
            name: "Ana".to_string(),
            email: "ana@saori.local".to_string(),
            role,
            branch_id: branch.map(str::to_string),
        }
    }

    #[test]
    fn test_percent_from_percentage() {
        assert_eq!(Percent::from_percentage(16.0).bps(), 1600);
        assert_eq!(Percent::from_percentage(12.5).bps(), 1250);
        assert_eq!(Percent::from_percentage(0.005).bps(), 1);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(Role::Vendedor.as_str(), "VENDEDOR");
        assert_eq!(
            serde_json::to_string(&PurchaseOrderStatus::Partial).unwrap(),
            "\"PARTIAL\""
        );
        assert_eq!("CONVERTED".parse::<QuoteStatus>().unwrap(), QuoteStatus::Converted);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "SHIPPED".parse::<PurchaseOrderStatus>().unwrap_err();
        match err {
            ValidationError::NotAllowed { allowed, .. } => assert_eq!(allowed.len(), 4),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_quote_manual_transitions() {
        assert!(QuoteStatus::Draft.check_manual_transition(QuoteStatus::Sent).is_ok());
        assert!(QuoteStatus::Rejected.check_manual_transition(QuoteStatus::Draft).is_ok());
        assert!(matches!(
            QuoteStatus::Converted.check_manual_transition(QuoteStatus::Draft),
            Err(CoreError::InvalidState(_))
        ));
        assert!(matches!(
            QuoteStatus::Accepted.check_manual_transition(QuoteStatus::Converted),
            Err(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_actor_require() {
        let seller = actor(Role::Vendedor, Some("b-1"));
        assert!(seller.require(Permission::SalesCreate).is_ok());
        match seller.require(Permission::ProductsDelete) {
            Err(CoreError::Forbidden { required }) => assert_eq!(required, "products:delete"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_actor_without_branch() {
        let admin = actor(Role::Admin, None);
        assert!(matches!(admin.branch(), Err(CoreError::Validation(_))));
        assert_eq!(actor(Role::Admin, Some("b-1")).branch().unwrap(), "b-1");
    }

    #[test]
    fn test_page_request() {
        let page = PageRequest::new(Some(3), Some(20), 50);
        assert_eq!(page.offset(), 40);
        assert_eq!(page.paginate(41).total_pages, 3);

        let page = PageRequest::new(Some(0), None, 50);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 50);
        assert_eq!(page.paginate(0).total_pages, 0);
    }
}
