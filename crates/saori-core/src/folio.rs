//! # Folios
//!
//! Human-readable, gap-tolerant sequence numbers for documents.
//!
//! ```text
//! Sale            V-000042
//! Quote           COT-00007
//! Purchase order  PO-000003
//! Employee        EMP-00012
//! ```
//!
//! Allocation itself (reading the highest suffix inside a transaction)
//! lives in saori-db. This module only knows the shapes.

use serde::{Deserialize, Serialize};

/// The document families that carry a folio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolioKind {
    Sale,
    Quote,
    PurchaseOrder,
    Employee,
}

impl FolioKind {
    pub const fn prefix(&self) -> &'static str {
        match self {
            FolioKind::Sale => "V-",
            FolioKind::Quote => "COT-",
            FolioKind::PurchaseOrder => "PO-",
            FolioKind::Employee => "EMP-",
        }
    }

    /// Minimum number of digits; longer numbers are never truncated.
    pub const fn width(&self) -> usize {
        match self {
            FolioKind::Sale | FolioKind::PurchaseOrder => 6,
            FolioKind::Quote | FolioKind::Employee => 5,
        }
    }

    pub fn format(&self, n: i64) -> String {
        format!("{}{:0width$}", self.prefix(), n, width = self.width())
    }

    /// The number following the highest one observed so far.
    pub fn next_after(&self, max_seen: Option<i64>) -> i64 {
        max_seen.map_or(1, |n| n.max(0) + 1)
    }
}

/// Default product code: `PROD-` + milliseconds since epoch in base 36,
/// uppercased.
pub fn generated_product_code(epoch_millis: i64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut n = epoch_millis.unsigned_abs();
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    format!("PROD-{}", String::from_utf8_lossy(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_width() {
        assert_eq!(FolioKind::Sale.format(1), "V-000001");
        assert_eq!(FolioKind::Quote.format(42), "COT-00042");
        assert_eq!(FolioKind::PurchaseOrder.format(3), "PO-000003");
        assert_eq!(FolioKind::Employee.format(12), "EMP-00012");
    }

    #[test]
    fn test_format_never_truncates() {
        assert_eq!(FolioKind::Quote.format(1_234_567), "COT-1234567");
    }

    #[test]
    fn test_next_after() {
        assert_eq!(FolioKind::Sale.next_after(None), 1);
        assert_eq!(FolioKind::Sale.next_after(Some(41)), 42);
    }

    #[test]
    fn test_generated_product_code() {
        assert_eq!(generated_product_code(0), "PROD-0");
        assert_eq!(generated_product_code(35), "PROD-Z");
        assert_eq!(generated_product_code(36), "PROD-10");
    }
}
