//! # Supplier Repository

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::inputs::{NewSupplier, SupplierPatch};
use saori_core::models::{Supplier, SupplierListing};
use saori_core::validation::{optional_text, require_text, validate_search_query};
use saori_core::{Actor, CoreError};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use crate::repository::{activity, like_pattern, new_id};

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Supplier> {
    let supplier: Option<Supplier> = sqlx::query_as(
        r#"
        SELECT id, name, contact_name, email, phone, address, notes, created_at, updated_at
        FROM suppliers WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    supplier.ok_or_else(|| CoreError::not_found("Supplier", id).into())
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Suppliers by name with their purchase order count. `search` matches
    /// name, contact, email or phone.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<SupplierListing>> {
        let pattern = validate_search_query(search)?.map(|s| like_pattern(&s));
        let suppliers = sqlx::query_as(
            r#"
            SELECT s.id, s.name, s.contact_name, s.email, s.phone, s.address, s.notes,
                   s.created_at, s.updated_at,
                   (SELECT COUNT(*) FROM purchase_orders po WHERE po.supplier_id = s.id) AS total_orders
            FROM suppliers s
            WHERE (?1 IS NULL OR s.name LIKE ?1 OR s.contact_name LIKE ?1
                   OR s.email LIKE ?1 OR s.phone LIKE ?1)
            ORDER BY s.name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    pub async fn create(&self, actor: &Actor, request: NewSupplier) -> DbResult<Supplier> {
        let now = Utc::now();
        let supplier = Supplier {
            id: new_id(),
            name: require_text(request.name.as_deref(), "name")?,
            contact_name: optional_text(request.contact_name.as_deref()),
            email: optional_text(request.email.as_deref()),
            phone: optional_text(request.phone.as_deref()),
            address: optional_text(request.address.as_deref()),
            notes: optional_text(request.notes.as_deref()),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, contact_name, email, phone, address, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateSupplier,
            Some("Supplier"),
            Some(&supplier.id),
            json!({ "name": supplier.name }),
        )
        .await?;

        tx.commit().await?;
        info!(supplier_id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn update(&self, actor: &Actor, id: &str, patch: SupplierPatch) -> DbResult<Supplier> {
        let mut tx = self.pool.begin().await?;

        let mut supplier = fetch(&mut tx, id).await?;
        patch.apply_to(&mut supplier)?;
        supplier.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?2, contact_name = ?3, email = ?4, phone = ?5, address = ?6,
                notes = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&supplier.name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.notes)
        .bind(supplier.updated_at)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::UpdateSupplier,
            Some("Supplier"),
            Some(id),
            json!({ "name": supplier.name }),
        )
        .await?;

        tx.commit().await?;
        Ok(supplier)
    }

    /// Hard delete, refused while purchase orders reference the supplier.
    pub async fn delete(&self, actor: &Actor, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let supplier = fetch(&mut tx, id).await?;
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchase_orders WHERE supplier_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if orders > 0 {
            return Err(CoreError::invalid_state(
                "Supplier has purchase orders and cannot be deleted",
            )
            .into());
        }

        sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::DeleteSupplier,
            Some("Supplier"),
            Some(id),
            json!({ "name": supplier.name }),
        )
        .await?;

        tx.commit().await?;
        info!(supplier_id = %id, "Supplier deleted");
        Ok(())
    }
}
