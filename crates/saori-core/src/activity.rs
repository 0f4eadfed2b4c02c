//! # Activity Log Vocabulary
//!
//! Action names written to the append-only activity log, and the human
//! message the log viewer shows for each entry.
//!
//! Actions are stored as plain TEXT so entries written by older builds
//! (`LOGOUT`, `DELETE_SALE`) still render.

use serde_json::Value;

use crate::money::Money;

/// Every action this codebase writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityAction {
    Login,
    SystemBootstrap,
    CreateSale,
    CreateQuote,
    UpdateQuote,
    ConvertQuote,
    CreateProduct,
    UpdateProduct,
    /// An update that changed the sale price.
    UpdatePrice,
    DeleteProduct,
    CreateCustomer,
    UpdateCustomer,
    DeleteCustomer,
    CreateSupplier,
    UpdateSupplier,
    DeleteSupplier,
    CreatePurchaseOrder,
    ReceivePurchaseOrder,
    UpdatePurchaseOrder,
    CreateLead,
    UpdateLead,
    DeleteLead,
    CreateExpense,
    DeleteExpense,
    CreateEmployee,
    UpdateEmployee,
    DeleteEmployee,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl ActivityAction {
    pub const fn as_str(&self) -> &'static str {
        use ActivityAction::*;
        match self {
            Login => "LOGIN",
            SystemBootstrap => "SYSTEM_BOOTSTRAP",
            CreateSale => "CREATE_SALE",
            CreateQuote => "CREATE_QUOTE",
            UpdateQuote => "UPDATE_QUOTE",
            ConvertQuote => "CONVERT_QUOTE",
            CreateProduct => "CREATE_PRODUCT",
            UpdateProduct => "UPDATE_PRODUCT",
            UpdatePrice => "UPDATE_PRICE",
            DeleteProduct => "DELETE_PRODUCT",
            CreateCustomer => "CREATE_CUSTOMER",
            UpdateCustomer => "UPDATE_CUSTOMER",
            DeleteCustomer => "DELETE_CUSTOMER",
            CreateSupplier => "CREATE_SUPPLIER",
            UpdateSupplier => "UPDATE_SUPPLIER",
            DeleteSupplier => "DELETE_SUPPLIER",
            CreatePurchaseOrder => "CREATE_PURCHASE_ORDER",
            ReceivePurchaseOrder => "RECEIVE_PURCHASE_ORDER",
            UpdatePurchaseOrder => "UPDATE_PURCHASE_ORDER",
            CreateLead => "CREATE_LEAD",
            UpdateLead => "UPDATE_LEAD",
            DeleteLead => "DELETE_LEAD",
            CreateExpense => "CREATE_EXPENSE",
            DeleteExpense => "DELETE_EXPENSE",
            CreateEmployee => "CREATE_EMPLOYEE",
            UpdateEmployee => "UPDATE_EMPLOYEE",
            DeleteEmployee => "DELETE_EMPLOYEE",
            CreateUser => "CREATE_USER",
            UpdateUser => "UPDATE_USER",
            DeleteUser => "DELETE_USER",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn text<'a>(details: &'a Value, key: &str) -> &'a str {
    details.get(key).and_then(Value::as_str).unwrap_or("")
}

fn cents(details: &Value, key: &str) -> Money {
    Money::from_cents(details.get(key).and_then(Value::as_i64).unwrap_or(0))
}

/// Renders the viewer message for one entry.
///
/// `details` is the stored JSON object, or `Value::Null` when absent.
pub fn format_message(
    action: &str,
    user_name: &str,
    entity_id: Option<&str>,
    details: &Value,
) -> String {
    match action {
        "LOGIN" => format!("{user_name} inició sesión"),
        "LOGOUT" => format!("{user_name} cerró sesión"),
        "SYSTEM_BOOTSTRAP" => format!("{user_name} inicializó el sistema"),
        "CREATE_SALE" => {
            format!("{user_name} registró venta por {}", cents(details, "totalCents"))
        }
        "DELETE_SALE" => {
            let folio = match text(details, "folio") {
                "" => entity_id.unwrap_or(""),
                folio => folio,
            };
            format!("{user_name} canceló ticket #{folio}")
        }
        "UPDATE_PRICE" => format!(
            "{user_name} cambió precio de {}: {} → {}",
            text(details, "productName"),
            cents(details, "oldPriceCents"),
            cents(details, "newPriceCents"),
        ),
        "CONVERT_QUOTE" => format!(
            "{user_name} convirtió la cotización {} en la venta {}",
            text(details, "quoteFolio"),
            text(details, "saleFolio"),
        ),
        "RECEIVE_PURCHASE_ORDER" => {
            format!("{user_name} recibió mercancía de {}", text(details, "folio"))
        }
        "CREATE_USER" => format!("{user_name} creó usuario {}", text(details, "userName")),
        "UPDATE_USER" => format!("{user_name} modificó usuario {}", text(details, "userName")),
        "DELETE_USER" => format!("{user_name} eliminó usuario {}", text(details, "userName")),
        other => format!("{user_name} realizó {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sale_message_formats_money() {
        let msg = format_message(
            "CREATE_SALE",
            "Ana",
            None,
            &json!({"folio": "V-000001", "totalCents": 23200}),
        );
        assert_eq!(msg, "Ana registró venta por $232.00");
    }

    #[test]
    fn test_login_and_fallback() {
        assert_eq!(format_message("LOGIN", "Ana", None, &Value::Null), "Ana inició sesión");
        assert_eq!(
            format_message("CREATE_LEAD", "Ana", None, &Value::Null),
            "Ana realizó CREATE_LEAD"
        );
    }

    #[test]
    fn test_cancel_ticket_falls_back_to_entity_id() {
        let msg = format_message("DELETE_SALE", "Luis", Some("s-9"), &json!({}));
        assert_eq!(msg, "Luis canceló ticket #s-9");
    }

    #[test]
    fn test_user_messages() {
        let details = json!({"userName": "Vendedor 1", "role": "VENDEDOR"});
        assert_eq!(
            format_message(ActivityAction::CreateUser.as_str(), "Admin", None, &details),
            "Admin creó usuario Vendedor 1"
        );
    }
}
