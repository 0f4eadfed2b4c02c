//! # Customer Repository
//!
//! Tags are stored as a JSON array in a TEXT column and decoded on read.
//! A customer referenced by any sale or quote cannot be deleted.

use chrono::{DateTime, Utc};
use saori_core::activity::ActivityAction;
use saori_core::inputs::{CustomerPatch, NewCustomer};
use saori_core::models::{Customer, CustomerListing};
use saori_core::validation::{optional_text, require_text, validate_search_query};
use saori_core::{Actor, CoreError};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use crate::repository::{activity, like_pattern, new_id};

/// `customers` as stored.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    rfc: Option<String>,
    tags: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> DbResult<Customer> {
        Ok(Customer {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            rfc: self.rfc,
            tags: serde_json::from_str(&self.tags)?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    customer: CustomerRow,
    total_orders: i64,
    last_purchase: Option<DateTime<Utc>>,
}

const SELECT_CUSTOMER: &str = r#"
    SELECT id, name, email, phone, address, rfc, tags, notes, created_at, updated_at
    FROM customers
"#;

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Customer> {
    let row: Option<CustomerRow> = sqlx::query_as(&format!("{SELECT_CUSTOMER} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.ok_or_else(|| CoreError::not_found("Customer", id))?
        .into_customer()
}

async fn save(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE customers
        SET name = ?2, email = ?3, phone = ?4, address = ?5, rfc = ?6, tags = ?7,
            notes = ?8, updated_at = ?9
        WHERE id = ?1
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(&customer.rfc)
    .bind(serde_json::to_string(&customer.tags)?)
    .bind(&customer.notes)
    .bind(customer.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Customers by name, optionally matching name, email or phone, with
    /// their order count and last purchase.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<CustomerListing>> {
        let pattern = validate_search_query(search)?.map(|s| like_pattern(&s));

        let rows: Vec<ListingRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, c.email, c.phone, c.address, c.rfc, c.tags, c.notes,
                   c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM sales s WHERE s.customer_id = c.id) AS total_orders,
                   (SELECT MAX(s.created_at) FROM sales s WHERE s.customer_id = c.id) AS last_purchase
            FROM customers c
            WHERE (?1 IS NULL OR c.name LIKE ?1 OR c.email LIKE ?1 OR c.phone LIKE ?1)
            ORDER BY c.name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CustomerListing {
                    customer: row.customer.into_customer()?,
                    total_orders: row.total_orders,
                    last_purchase: row.last_purchase,
                })
            })
            .collect()
    }

    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn create(&self, actor: &Actor, request: NewCustomer) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            name: require_text(request.name.as_deref(), "name")?,
            email: optional_text(request.email.as_deref()),
            phone: optional_text(request.phone.as_deref()),
            address: optional_text(request.address.as_deref()),
            rfc: optional_text(request.rfc.as_deref()),
            tags: request.tags.unwrap_or_default(),
            notes: optional_text(request.notes.as_deref()),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, rfc, tags, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.rfc)
        .bind(serde_json::to_string(&customer.tags)?)
        .bind(&customer.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateCustomer,
            Some("Customer"),
            Some(&customer.id),
            json!({ "name": customer.name }),
        )
        .await?;

        tx.commit().await?;
        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, actor: &Actor, id: &str, patch: CustomerPatch) -> DbResult<Customer> {
        let mut tx = self.pool.begin().await?;

        let mut customer = fetch(&mut tx, id).await?;
        patch.apply_to(&mut customer);
        customer.updated_at = Utc::now();
        save(&mut tx, &customer).await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::UpdateCustomer,
            Some("Customer"),
            Some(id),
            json!({ "name": customer.name }),
        )
        .await?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Hard delete.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidState` while sales or quotes reference the customer
    pub async fn delete(&self, actor: &Actor, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let customer = fetch(&mut tx, id).await?;
        let references: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM sales WHERE customer_id = ?1)
                 + (SELECT COUNT(*) FROM quotes WHERE customer_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if references > 0 {
            return Err(CoreError::invalid_state(
                "Customer has sales or quotes and cannot be deleted",
            )
            .into());
        }

        sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::DeleteCustomer,
            Some("Customer"),
            Some(id),
            json!({ "name": customer.name }),
        )
        .await?;

        tx.commit().await?;
        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }
}
