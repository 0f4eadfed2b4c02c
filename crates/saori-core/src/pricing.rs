//! # Pricing
//!
//! Line and document totals shared by direct sales and quotes.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per line                                                               │
//! │    gross     = unit_price × quantity                                    │
//! │    discount  = round(gross × discount_bps / 10000)                      │
//! │    subtotal  = gross − discount                                         │
//! │                                                                         │
//! │  per document                                                           │
//! │    subtotal  = Σ line.subtotal                                          │
//! │    discount  = Σ line.discount                                          │
//! │    tax       = round(subtotal × TAX_RATE / 10000)                       │
//! │    total     = subtotal + tax                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is computed once on the document subtotal, never per line, so that
//! line rounding cannot drift the tax.

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Percent};
use crate::validation::{validate_line_count, validate_price, validate_quantity};

/// One requested line, already parsed into integer units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Percent,
}

/// A line with its computed amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Percent,
    pub gross: Money,
    pub discount_amount: Money,
    pub subtotal: Money,
}

impl PricedLine {
    fn compute(input: &LineInput) -> Self {
        let gross = input.unit_price.multiply_quantity(input.quantity);
        let discount_amount = gross.percent_of(input.discount);
        PricedLine {
            product_id: input.product_id.clone(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            discount: input.discount,
            gross,
            discount_amount,
            subtotal: gross - discount_amount,
        }
    }
}

/// Totals of a sale or quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedDocument {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// Validates and prices a set of lines.
///
/// ## Errors
/// - `items is required` when `lines` is empty
/// - more than `MAX_DOCUMENT_LINES` lines
/// - quantity outside `1..=MAX_ITEM_QUANTITY`, price outside
///   `0..=MAX_PRICE_CENTS`, or discount above 100%
///
/// Nothing is computed until every line has been validated.
pub fn price_lines(lines: &[LineInput], tax_rate: Percent) -> CoreResult<PricedDocument> {
    validate_line_count(lines.len())?;
    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::required("productId").into());
        }
        validate_quantity(line.quantity)?;
        validate_price(line.unit_price.cents(), "unitPriceCents")?;
        if line.discount > Percent::FULL {
            return Err(ValidationError::OutOfRange {
                field: "discountPercent".to_string(),
                min: 0,
                max: 100,
            }
            .into());
        }
    }

    let lines: Vec<PricedLine> = lines.iter().map(PricedLine::compute).collect();
    let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();
    let discount: Money = lines.iter().map(|l| l.discount_amount).sum();
    let tax = subtotal.percent_of(tax_rate);

    Ok(PricedDocument {
        lines,
        subtotal,
        discount,
        tax,
        total: subtotal + tax,
    })
}

/// Change handed back to the customer. Only cash produces change.
pub fn change_due(method: PaymentMethod, amount_paid: Money, total: Money) -> Money {
    match method {
        PaymentMethod::Cash => amount_paid.saturating_sub_to_zero(total),
        PaymentMethod::Card | PaymentMethod::Transfer => Money::zero(),
    }
}
