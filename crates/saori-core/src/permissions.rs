//! # Permissions
//!
//! Static role → capability table. There is no inheritance between roles:
//! each role lists exactly what it may do.
//!
//! ```text
//! ┌──────────────┬────────────────────────────────────────────────────────┐
//! │ ADMIN        │ everything below, plus deletes, users, logs            │
//! │ SUPERVISOR   │ create/read/update across catalog, CRM, purchasing     │
//! │ VENDEDOR     │ sell, read catalog/customers, leads, quotes            │
//! └──────────────┴────────────────────────────────────────────────────────┘
//! ```

use crate::types::Role;

/// A capability tag, written `resource:action` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    SalesCreate,
    SalesRead,
    SalesDelete,

    ProductsCreate,
    ProductsRead,
    ProductsUpdate,
    ProductsEdit,
    ProductsDelete,

    CustomersCreate,
    CustomersRead,
    CustomersUpdate,
    CustomersEdit,
    CustomersDelete,

    ExpensesCreate,
    ExpensesRead,
    ExpensesDelete,

    EmployeesCreate,
    EmployeesRead,
    EmployeesUpdate,
    EmployeesEdit,
    EmployeesDelete,

    SuppliersCreate,
    SuppliersRead,
    SuppliersUpdate,
    SuppliersDelete,

    PurchasesCreate,
    PurchasesRead,
    PurchasesUpdate,
    PurchasesReceive,

    LeadsCreate,
    LeadsRead,
    LeadsUpdate,
    LeadsDelete,

    UsersCreate,
    UsersRead,
    UsersUpdate,
    UsersDelete,

    LogsRead,
    ReportsRead,

    QuotesCreate,
    QuotesRead,
    QuotesUpdate,
    QuotesConvert,
}

impl Permission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SalesCreate => "sales:create",
            SalesRead => "sales:read",
            SalesDelete => "sales:delete",
            ProductsCreate => "products:create",
            ProductsRead => "products:read",
            ProductsUpdate => "products:update",
            ProductsEdit => "products:edit",
            ProductsDelete => "products:delete",
            CustomersCreate => "customers:create",
            CustomersRead => "customers:read",
            CustomersUpdate => "customers:update",
            CustomersEdit => "customers:edit",
            CustomersDelete => "customers:delete",
            ExpensesCreate => "expenses:create",
            ExpensesRead => "expenses:read",
            ExpensesDelete => "expenses:delete",
            EmployeesCreate => "employees:create",
            EmployeesRead => "employees:read",
            EmployeesUpdate => "employees:update",
            EmployeesEdit => "employees:edit",
            EmployeesDelete => "employees:delete",
            SuppliersCreate => "suppliers:create",
            SuppliersRead => "suppliers:read",
            SuppliersUpdate => "suppliers:update",
            SuppliersDelete => "suppliers:delete",
            PurchasesCreate => "purchases:create",
            PurchasesRead => "purchases:read",
            PurchasesUpdate => "purchases:update",
            PurchasesReceive => "purchases:receive",
            LeadsCreate => "leads:create",
            LeadsRead => "leads:read",
            LeadsUpdate => "leads:update",
            LeadsDelete => "leads:delete",
            UsersCreate => "users:create",
            UsersRead => "users:read",
            UsersUpdate => "users:update",
            UsersDelete => "users:delete",
            LogsRead => "logs:read",
            ReportsRead => "reports:read",
            QuotesCreate => "quotes:create",
            QuotesRead => "quotes:read",
            QuotesUpdate => "quotes:update",
            QuotesConvert => "quotes:convert",
        }
    }
}

use Permission::*;

#[rustfmt::skip]
const ADMIN: &[Permission] = &[
    SalesCreate, SalesRead, SalesDelete,
    ProductsCreate, ProductsRead, ProductsUpdate, ProductsEdit, ProductsDelete,
    CustomersCreate, CustomersRead, CustomersUpdate, CustomersEdit, CustomersDelete,
    ExpensesCreate, ExpensesRead, ExpensesDelete,
    EmployeesCreate, EmployeesRead, EmployeesUpdate, EmployeesEdit, EmployeesDelete,
    SuppliersCreate, SuppliersRead, SuppliersUpdate, SuppliersDelete,
    PurchasesCreate, PurchasesRead, PurchasesUpdate, PurchasesReceive,
    LeadsCreate, LeadsRead, LeadsUpdate, LeadsDelete,
    UsersCreate, UsersRead, UsersUpdate, UsersDelete,
    LogsRead,
    ReportsRead,
    QuotesCreate, QuotesRead, QuotesUpdate, QuotesConvert,
];

#[rustfmt::skip]
const SUPERVISOR: &[Permission] = &[
    SalesCreate, SalesRead,
    ProductsCreate, ProductsRead, ProductsUpdate, ProductsEdit,
    CustomersCreate, CustomersRead, CustomersUpdate, CustomersEdit,
    ExpensesCreate, ExpensesRead,
    EmployeesRead,
    SuppliersCreate, SuppliersRead, SuppliersUpdate,
    PurchasesCreate, PurchasesRead, PurchasesUpdate, PurchasesReceive,
    LeadsCreate, LeadsRead, LeadsUpdate,
    UsersRead,
    ReportsRead,
    QuotesCreate, QuotesRead, QuotesUpdate, QuotesConvert,
];

#[rustfmt::skip]
const VENDEDOR: &[Permission] = &[
    SalesCreate, SalesRead,
    ProductsRead,
    CustomersRead,
    LeadsCreate, LeadsRead, LeadsUpdate,
    QuotesCreate, QuotesRead, QuotesConvert,
];

/// Every capability granted to `role`.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN,
        Role::Supervisor => SUPERVISOR,
        Role::Vendedor => VENDEDOR,
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}

/// Wire form of a role's capabilities, as returned by `GET /auth/me`.
pub fn permission_names(role: Role) -> Vec<&'static str> {
    permissions_for(role).iter().map(Permission::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_cannot_delete_products() {
        assert!(has_permission(Role::Vendedor, ProductsRead));
        assert!(!has_permission(Role::Vendedor, ProductsDelete));
        assert!(!has_permission(Role::Vendedor, ProductsEdit));
    }

    #[test]
    fn test_supervisor_receives_but_never_deletes() {
        assert!(has_permission(Role::Supervisor, PurchasesReceive));
        assert!(SUPERVISOR
            .iter()
            .all(|p| !p.as_str().ends_with(":delete")));
    }

    #[test]
    fn test_only_admin_manages_users_and_logs() {
        for role in [Role::Supervisor, Role::Vendedor] {
            assert!(!has_permission(role, UsersCreate));
            assert!(!has_permission(role, LogsRead));
        }
        assert!(has_permission(Role::Admin, UsersCreate));
        assert!(has_permission(Role::Admin, LogsRead));
    }

    #[test]
    fn test_lower_roles_are_subsets_of_admin() {
        for role in [Role::Supervisor, Role::Vendedor] {
            for p in permissions_for(role) {
                assert!(ADMIN.contains(p), "{} missing from ADMIN", p.as_str());
            }
        }
    }

    #[test]
    fn test_quote_capabilities() {
        assert!(has_permission(Role::Vendedor, QuotesConvert));
        assert!(!has_permission(Role::Vendedor, QuotesUpdate));
        assert!(has_permission(Role::Supervisor, QuotesUpdate));
    }

    #[test]
    fn test_permission_names() {
        let names = permission_names(Role::Vendedor);
        assert_eq!(names.len(), VENDEDOR.len());
        assert!(names.contains(&"sales:create"));
    }
}
