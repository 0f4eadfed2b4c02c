//! # Purchase Receiving
//!
//! Pure rules for receiving merchandise against a purchase order.
//!
//! ## State Machine
//! ```text
//!            receive (some)          receive (rest)
//!   OPEN ─────────────────► PARTIAL ───────────────► RECEIVED
//!    │  └──────────────── receive (all) ─────────────────▲
//!    │                                                    │
//!    └──► CANCELLED ◄── PARTIAL          (never from RECEIVED)
//! ```
//!
//! Status after a receipt is always *derived* from the item sums read back
//! inside the same transaction, never carried forward from the old status.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::PurchaseOrderStatus;

/// The receivable view of one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivableItem {
    pub item_id: String,
    pub product_id: String,
    pub quantity_ordered: i64,
    pub quantity_received: i64,
}

impl ReceivableItem {
    pub fn pending(&self) -> i64 {
        (self.quantity_ordered - self.quantity_received).max(0)
    }
}

/// Quantity accepted for one line in a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptAllocation {
    pub item_id: String,
    pub product_id: String,
    pub accepted: i64,
}

/// Fails unless the order can still take merchandise.
pub fn ensure_receivable(status: PurchaseOrderStatus) -> CoreResult<()> {
    if status == PurchaseOrderStatus::Cancelled {
        return Err(CoreError::invalid_state(
            "A cancelled purchase order cannot be received",
        ));
    }
    Ok(())
}

/// Decides how much of each line to accept.
///
/// `requested` maps item ids to the quantity the caller reports. Lines not
/// in the map default to their full pending amount; requests ≤ 0 skip the
/// line; requests above pending are capped. Unknown item ids are ignored.
/// Lines with nothing accepted are left out of the plan.
pub fn plan_receipt(
    items: &[ReceivableItem],
    requested: &HashMap<String, i64>,
) -> Vec<ReceiptAllocation> {
    items
        .iter()
        .filter_map(|item| {
            let pending = item.pending();
            let wanted = requested.get(&item.item_id).copied().unwrap_or(pending);
            if wanted <= 0 {
                return None;
            }
            let accepted = wanted.min(pending);
            (accepted > 0).then(|| ReceiptAllocation {
                item_id: item.item_id.clone(),
                product_id: item.product_id.clone(),
                accepted,
            })
        })
        .collect()
}

/// Derives the order status from the summed item quantities.
pub fn derive_status(total_ordered: i64, total_received: i64) -> PurchaseOrderStatus {
    if total_received <= 0 {
        PurchaseOrderStatus::Open
    } else if total_received < total_ordered {
        PurchaseOrderStatus::Partial
    } else {
        PurchaseOrderStatus::Received
    }
}

/// `receivedAt` for an order moving into `status`.
///
/// Reaching RECEIVED stamps `now` unless a stamp already exists; any other
/// status clears it.
pub fn received_at_for(
    status: PurchaseOrderStatus,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match status {
        PurchaseOrderStatus::Received => Some(previous.unwrap_or(now)),
        _ => None,
    }
}

/// Checks a manual status override.
pub fn check_manual_status(
    current: PurchaseOrderStatus,
    next: PurchaseOrderStatus,
) -> CoreResult<()> {
    if current == PurchaseOrderStatus::Received && next == PurchaseOrderStatus::Cancelled {
        return Err(CoreError::invalid_state(
            "A received purchase order cannot be cancelled",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, ordered: i64, received: i64) -> ReceivableItem {
        ReceivableItem {
            item_id: id.to_string(),
            product_id: format!("prod-{id}"),
            quantity_ordered: ordered,
            quantity_received: received,
        }
    }

    #[test]
    fn test_partial_then_default_remaining() {
        let items = vec![item("a", 10, 0)];
        let requested = HashMap::from([("a".to_string(), 4)]);

        let plan = plan_receipt(&items, &requested);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].accepted, 4);
        assert_eq!(derive_status(10, 4), PurchaseOrderStatus::Partial);

        let items = vec![item("a", 10, 4)];
        let plan = plan_receipt(&items, &HashMap::new());
        assert_eq!(plan[0].accepted, 6);
        assert_eq!(derive_status(10, 10), PurchaseOrderStatus::Received);
    }

    #[test]
    fn test_requests_are_capped_and_skipped() {
        let items = vec![item("a", 5, 3), item("b", 8, 0), item("c", 2, 2)];
        let requested = HashMap::from([
            ("a".to_string(), 50),
            ("b".to_string(), 0),
            ("ghost".to_string(), 9),
        ]);

        let plan = plan_receipt(&items, &requested);
        assert_eq!(
            plan,
            vec![ReceiptAllocation {
                item_id: "a".to_string(),
                product_id: "prod-a".to_string(),
                accepted: 2,
            }]
        );
    }

    #[test]
    fn test_negative_request_is_skipped() {
        let items = vec![item("a", 5, 0)];
        let requested = HashMap::from([("a".to_string(), -3)]);
        assert!(plan_receipt(&items, &requested).is_empty());
    }

    #[test]
    fn test_derive_status() {
        assert_eq!(derive_status(10, 0), PurchaseOrderStatus::Open);
        assert_eq!(derive_status(10, 1), PurchaseOrderStatus::Partial);
        assert_eq!(derive_status(10, 10), PurchaseOrderStatus::Received);
    }

    #[test]
    fn test_received_at() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        assert_eq!(received_at_for(PurchaseOrderStatus::Received, None, now), Some(now));
        assert_eq!(
            received_at_for(PurchaseOrderStatus::Received, Some(earlier), now),
            Some(earlier)
        );
        assert_eq!(received_at_for(PurchaseOrderStatus::Partial, Some(earlier), now), None);
    }

    #[test]
    fn test_cancelled_orders_are_not_receivable() {
        assert!(ensure_receivable(PurchaseOrderStatus::Partial).is_ok());
        assert!(ensure_receivable(PurchaseOrderStatus::Cancelled).is_err());
    }

    #[test]
    fn test_manual_status() {
        use PurchaseOrderStatus::*;
        assert!(check_manual_status(Open, Cancelled).is_ok());
        assert!(check_manual_status(Partial, Cancelled).is_ok());
        assert!(check_manual_status(Cancelled, Open).is_ok());
        assert!(check_manual_status(Received, Cancelled).is_err());
    }
}
