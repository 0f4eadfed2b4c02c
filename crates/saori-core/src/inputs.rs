//! # Inputs
//!
//! Request payloads as they arrive on the wire (camelCase JSON or query
//! strings), plus the conversion and patch logic that turns them into
//! validated values.
//!
//! Required fields are modelled as `Option` so that a missing field is
//! reported as a [`ValidationError::Required`] rather than a generic
//! deserialization failure.
//!
//! ## Patches
//! Partial updates distinguish "absent" from "null" for nullable columns:
//! ```text
//! { }                 → None           leave unchanged
//! { "email": null }   → Some(None)     clear
//! { "email": "x@y" }  → Some(Some(..)) set
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::ValidationError;
use crate::models::{Customer, Employee, Lead, Product, Supplier};
use crate::pricing::LineInput;
use crate::money::Money;
use crate::types::{LeadStatus, PaymentMethod, PurchaseOrderStatus, QuoteStatus, Role};
use crate::validation::{
    optional_text, parse_date, parse_discount_percent, parse_optional_timestamp,
    parse_timestamp, require_text, validate_positive_amount, validate_price, ValidationResult,
};

/// Deserializes a present field (even `null`) as `Some(..)`.
/// Combine with `#[serde(default)]` so absent fields become `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parses a status string case-insensitively.
fn parse_status<T>(value: Option<&str>) -> ValidationResult<T>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    require_text(value, "status")?.to_uppercase().parse()
}

/// Applies a nullable text patch, trimming and mapping blank to `None`.
fn patch_text(target: &mut Option<String>, patch: Option<Option<String>>) {
    if let Some(value) = patch {
        *target = optional_text(value.as_deref());
    }
}

// =============================================================================
// Auth & Users
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub branch_name: Option<String>,
}

impl FirstUserRequest {
    pub const DEFAULT_BRANCH: &'static str = "Sucursal Principal";

    pub fn branch_name(&self) -> String {
        optional_text(self.branch_name.as_deref())
            .unwrap_or_else(|| Self::DEFAULT_BRANCH.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub branch_id: Option<String>,
}

impl NewUser {
    pub fn role(&self) -> ValidationResult<Role> {
        require_text(self.role.as_deref(), "role")?.to_uppercase().parse()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub branch_id: Option<Option<String>>,
    pub active: Option<bool>,
}

impl UserPatch {
    pub fn role(&self) -> ValidationResult<Option<Role>> {
        optional_text(self.role.as_deref())
            .map(|r| r.to_uppercase().parse())
            .transpose()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub search: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub category_id: Option<String>,
    pub min_stock: Option<i64>,
}

impl NewProduct {
    pub const DEFAULT_MIN_STOCK: i64 = 5;

    /// Validates name and price; returns `(name, price_cents)`.
    pub fn required(&self) -> ValidationResult<(String, i64)> {
        let name = require_text(self.name.as_deref(), "name")?;
        let price = self
            .price_cents
            .ok_or_else(|| ValidationError::required("priceCents"))?;
        validate_price(price, "priceCents")?;
        if let Some(cost) = self.cost_cents {
            validate_price(cost, "costCents")?;
        }
        Ok((name, price))
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
            .filter(|n| *n > 0)
            .unwrap_or(Self::DEFAULT_MIN_STOCK)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub price_cents: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub cost_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    pub min_stock: Option<i64>,
    pub active: Option<bool>,
}

impl ProductPatch {
    pub fn apply_to(self, product: &mut Product) -> ValidationResult<()> {
        if let Some(name) = optional_text(self.name.as_deref()) {
            product.name = name;
        }
        patch_text(&mut product.description, self.description);
        if let Some(price) = self.price_cents {
            validate_price(price, "priceCents")?;
            product.price_cents = price;
        }
        if let Some(cost) = self.cost_cents {
            if let Some(c) = cost {
                validate_price(c, "costCents")?;
            }
            product.cost_cents = cost;
        }
        patch_text(&mut product.category_id, self.category_id);
        if let Some(min) = self.min_stock {
            if min < 0 {
                return Err(ValidationError::Negative {
                    field: "minStock".to_string(),
                });
            }
            product.min_stock = min;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
        Ok(())
    }
}

// =============================================================================
// Sales & Quotes
// =============================================================================

/// One requested sale or quote line. Amounts are integer cents; decimal
/// `price`/`unitPrice` fields are rejected rather than ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LineRequest {
    pub product_id: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_percent: Option<f64>,
}

impl LineRequest {
    pub fn to_line_input(&self) -> ValidationResult<LineInput> {
        Ok(LineInput {
            product_id: require_text(self.product_id.as_deref(), "productId")?,
            quantity: self.quantity,
            unit_price: Money::from_cents(self.unit_price_cents),
            discount: parse_discount_percent(self.discount_percent)?,
        })
    }
}

fn line_inputs(items: &[LineRequest]) -> ValidationResult<Vec<LineInput>> {
    if items.is_empty() {
        return Err(ValidationError::required("items"));
    }
    items.iter().map(LineRequest::to_line_input).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSale {
    #[serde(default)]
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub amount_paid_cents: i64,
    pub customer_id: Option<String>,
    pub notes: Option<String>,
}

impl NewSale {
    pub fn line_inputs(&self) -> ValidationResult<Vec<LineInput>> {
        line_inputs(&self.items)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl SaleQuery {
    pub fn status(&self) -> ValidationResult<Option<crate::types::SaleStatus>> {
        optional_text(self.status.as_deref())
            .map(|s| s.to_uppercase().parse())
            .transpose()
    }

    pub fn payment_method(&self) -> ValidationResult<Option<PaymentMethod>> {
        optional_text(self.payment_method.as_deref())
            .map(|s| s.to_uppercase().parse())
            .transpose()
    }

    /// Inclusive `[from, to]` bounds: `from` at 00:00:00, `to` at 23:59:59.
    pub fn date_range(
        &self,
    ) -> ValidationResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let from = optional_text(self.date_from.as_deref())
            .map(|d| parse_date(&d, "dateFrom"))
            .transpose()?
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc());
        let to = optional_text(self.date_to.as_deref())
            .map(|d| parse_date(&d, "dateTo"))
            .transpose()?
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .map(|dt| dt.and_utc());
        Ok((from, to))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
    #[serde(default)]
    pub items: Vec<LineRequest>,
    pub customer_id: Option<String>,
    pub notes: Option<String>,
    pub valid_until: Option<String>,
}

impl NewQuote {
    pub fn line_inputs(&self) -> ValidationResult<Vec<LineInput>> {
        line_inputs(&self.items)
    }

    pub fn valid_until(&self) -> ValidationResult<Option<DateTime<Utc>>> {
        parse_optional_timestamp(self.valid_until.as_deref(), "validUntil")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl QuoteQuery {
    pub fn status(&self) -> ValidationResult<Option<QuoteStatus>> {
        optional_text(self.status.as_deref())
            .map(|s| s.to_uppercase().parse())
            .transpose()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatusUpdate {
    pub status: Option<String>,
}

impl QuoteStatusUpdate {
    pub fn status(&self) -> ValidationResult<QuoteStatus> {
        parse_status(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertQuote {
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Customers & Suppliers
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub rfc: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rfc: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl CustomerPatch {
    pub fn apply_to(self, customer: &mut Customer) {
        if let Some(name) = optional_text(self.name.as_deref()) {
            customer.name = name;
        }
        patch_text(&mut customer.email, self.email);
        patch_text(&mut customer.phone, self.phone);
        patch_text(&mut customer.address, self.address);
        patch_text(&mut customer.rfc, self.rfc);
        if let Some(tags) = self.tags {
            customer.tags = tags;
        }
        patch_text(&mut customer.notes, self.notes);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl SupplierPatch {
    pub fn apply_to(self, supplier: &mut Supplier) -> ValidationResult<()> {
        if let Some(name) = self.name {
            supplier.name = require_text(Some(&name), "name")?;
        }
        patch_text(&mut supplier.contact_name, self.contact_name);
        patch_text(&mut supplier.email, self.email);
        patch_text(&mut supplier.phone, self.phone);
        patch_text(&mut supplier.address, self.address);
        patch_text(&mut supplier.notes, self.notes);
        Ok(())
    }
}

// =============================================================================
// Purchasing
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLineRequest {
    pub product_id: Option<String>,
    pub quantity_ordered: i64,
    pub unit_cost_cents: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseOrder {
    pub supplier_id: Option<String>,
    pub branch_id: Option<String>,
    pub expected_at: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseLineRequest>,
}

impl NewPurchaseOrder {
    pub fn supplier_id(&self) -> ValidationResult<String> {
        require_text(self.supplier_id.as_deref(), "supplierId")
    }

    pub fn expected_at(&self) -> ValidationResult<Option<DateTime<Utc>>> {
        parse_optional_timestamp(self.expected_at.as_deref(), "expectedAt")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveLine {
    pub item_id: String,
    pub quantity_received: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePurchaseOrder {
    pub items: Option<Vec<ReceiveLine>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStatusUpdate {
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl PurchaseStatusUpdate {
    pub fn status(&self) -> ValidationResult<PurchaseOrderStatus> {
        parse_status(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseQuery {
    pub status: Option<String>,
    pub supplier_id: Option<String>,
    pub search: Option<String>,
}

impl PurchaseQuery {
    pub fn status(&self) -> ValidationResult<Option<PurchaseOrderStatus>> {
        optional_text(self.status.as_deref())
            .map(|s| s.to_uppercase().parse())
            .transpose()
    }
}

// =============================================================================
// CRM
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl LeadQuery {
    pub fn status(&self) -> ValidationResult<Option<LeadStatus>> {
        optional_text(self.status.as_deref())
            .map(|s| s.to_uppercase().parse())
            .transpose()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderQuery {
    pub days: Option<i64>,
}

impl ReminderQuery {
    pub const DEFAULT_DAYS: i64 = 7;
    /// Ten years.
    pub const MAX_DAYS: i64 = 3_650;

    /// The requested horizon, clamped to `0..=MAX_DAYS`.
    pub fn days(&self) -> i64 {
        self.days.unwrap_or(Self::DEFAULT_DAYS).clamp(0, Self::MAX_DAYS)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub estimated_value_cents: Option<i64>,
    pub notes: Option<String>,
    pub next_follow_up_at: Option<String>,
    pub assigned_to_id: Option<String>,
}

impl NewLead {
    pub fn status(&self) -> ValidationResult<LeadStatus> {
        optional_text(self.status.as_deref())
            .map(|s| s.to_uppercase().parse())
            .transpose()
            .map(Option::unwrap_or_default)
    }

    pub fn next_follow_up_at(&self) -> ValidationResult<Option<DateTime<Utc>>> {
        parse_optional_timestamp(self.next_follow_up_at.as_deref(), "nextFollowUpAt")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub source: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_value_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub next_follow_up_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to_id: Option<Option<String>>,
}

impl LeadPatch {
    pub fn apply_to(self, lead: &mut Lead) -> ValidationResult<()> {
        if let Some(status) = self.status {
            lead.status = parse_status(Some(&status))?;
        }
        if let Some(name) = self.name {
            lead.name = require_text(Some(&name), "name")?;
        }
        patch_text(&mut lead.company, self.company);
        patch_text(&mut lead.email, self.email);
        patch_text(&mut lead.phone, self.phone);
        patch_text(&mut lead.source, self.source);
        if let Some(value) = self.estimated_value_cents {
            if let Some(v) = value {
                validate_price(v, "estimatedValueCents")?;
            }
            lead.estimated_value_cents = value;
        }
        patch_text(&mut lead.notes, self.notes);
        if let Some(next) = self.next_follow_up_at {
            lead.next_follow_up_at = parse_optional_timestamp(next.as_deref(), "nextFollowUpAt")?;
        }
        patch_text(&mut lead.assigned_to_id, self.assigned_to_id);
        Ok(())
    }
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub amount_cents: Option<i64>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub date: Option<String>,
}

impl NewExpense {
    /// Returns `(amount_cents, description, date)`; date defaults to `now`.
    pub fn validated(&self, now: DateTime<Utc>) -> ValidationResult<(i64, String, DateTime<Utc>)> {
        let amount = self
            .amount_cents
            .ok_or_else(|| ValidationError::required("amountCents"))?;
        validate_positive_amount(amount, "amountCents")?;
        let description = require_text(self.description.as_deref(), "description")?;
        let date = parse_optional_timestamp(self.date.as_deref(), "date")?.unwrap_or(now);
        Ok((amount, description, date))
    }
}

// =============================================================================
// Staff
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub position_id: Option<String>,
    pub salary_cents: Option<i64>,
    pub hire_date: Option<String>,
    pub birth_date: Option<String>,
    pub notes: Option<String>,
}

/// The required part of a new employee, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeEssentials {
    pub name: String,
    pub position_id: String,
    pub salary_cents: i64,
    pub hire_date: chrono::NaiveDate,
    pub birth_date: Option<chrono::NaiveDate>,
}

impl NewEmployee {
    pub fn essentials(&self) -> ValidationResult<EmployeeEssentials> {
        let name = require_text(self.name.as_deref(), "name")?;
        let position_id = require_text(self.position_id.as_deref(), "positionId")?;
        let salary_cents = self
            .salary_cents
            .ok_or_else(|| ValidationError::required("salaryCents"))?;
        validate_positive_amount(salary_cents, "salaryCents")?;
        let hire_date = require_text(self.hire_date.as_deref(), "hireDate")?;
        let hire_date = parse_calendar_date(&hire_date, "hireDate")?;
        let birth_date = optional_text(self.birth_date.as_deref())
            .map(|d| parse_calendar_date(&d, "birthDate"))
            .transpose()?;
        Ok(EmployeeEssentials {
            name,
            position_id,
            salary_cents,
            hire_date,
            birth_date,
        })
    }
}

/// Accepts `YYYY-MM-DD` or a full timestamp, keeping only the date.
fn parse_calendar_date(value: &str, field: &str) -> ValidationResult<chrono::NaiveDate> {
    parse_date(value, field).or_else(|_| parse_timestamp(value, field).map(|ts| ts.date_naive()))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    pub position_id: Option<String>,
    pub salary_cents: Option<i64>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl EmployeePatch {
    pub fn apply_to(self, employee: &mut Employee) -> ValidationResult<()> {
        if let Some(name) = optional_text(self.name.as_deref()) {
            employee.name = name;
        }
        patch_text(&mut employee.email, self.email);
        patch_text(&mut employee.phone, self.phone);
        patch_text(&mut employee.address, self.address);
        if let Some(position) = optional_text(self.position_id.as_deref()) {
            employee.position_id = position;
        }
        if let Some(salary) = self.salary_cents {
            validate_positive_amount(salary, "salaryCents")?;
            employee.salary_cents = salary;
        }
        if let Some(active) = self.active {
            employee.active = active;
        }
        patch_text(&mut employee.notes, self.notes);
        Ok(())
    }
}

// =============================================================================
// Logs
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
