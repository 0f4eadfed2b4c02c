//! # Purchase Repository
//!
//! Purchase orders against suppliers and the receiving workflow that moves
//! merchandise into a branch.
//!
//! ## Receiving
//! ```text
//! BEGIN
//! ├── load order (NotFound) ── CANCELLED? → InvalidState
//! ├── plan_receipt(items, requested)        accepted = min(requested, pending)
//! ├── per allocation:
//! │     items.quantity_received += accepted
//! │     stock(product, order.branch) += accepted
//! ├── re-read Σ ordered / Σ received on this transaction
//! ├── status = derive_status(..), receivedAt = received_at_for(..)
//! ├── activity RECEIVE_PURCHASE_ORDER
//! COMMIT
//! ```

use std::collections::HashMap;

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::inputs::{NewPurchaseOrder, PurchaseQuery, PurchaseStatusUpdate, ReceivePurchaseOrder};
use saori_core::models::{PurchaseOrder, PurchaseOrderDetail, PurchaseOrderItem};
use saori_core::receiving::{
    check_manual_status, derive_status, ensure_receivable, plan_receipt, received_at_for,
    ReceivableItem,
};
use saori_core::validation::{
    optional_text, validate_line_count, validate_price, validate_quantity, validate_search_query,
};
use saori_core::{Actor, CoreError, FolioKind, PurchaseOrderStatus, ValidationError};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::{activity, folio, like_pattern, new_id, product};

const SELECT_ORDER: &str = r#"
    SELECT po.id, po.folio, po.supplier_id, po.branch_id, po.user_id, po.total_cents,
           po.status, po.notes, po.expected_at, po.received_at, po.created_at, po.updated_at,
           s.name AS supplier_name,
           b.name AS branch_name,
           u.name AS user_name,
           COALESCE((SELECT SUM(i.quantity_ordered) FROM purchase_order_items i
                     WHERE i.purchase_order_id = po.id), 0) AS ordered_items,
           COALESCE((SELECT SUM(i.quantity_received) FROM purchase_order_items i
                     WHERE i.purchase_order_id = po.id), 0) AS received_items
    FROM purchase_orders po
    JOIN suppliers s ON s.id = po.supplier_id
    JOIN branches b ON b.id = po.branch_id
    LEFT JOIN users u ON u.id = po.user_id
"#;

async fn fetch_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<PurchaseOrderItem>> {
    let items = sqlx::query_as(
        r#"
        SELECT id, purchase_order_id, product_id, product_name, product_code,
               quantity_ordered, quantity_received, unit_cost_cents, subtotal_cents
        FROM purchase_order_items WHERE purchase_order_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PurchaseOrderDetail>> {
    let detail: Option<PurchaseOrderDetail> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE po.id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(mut detail) = detail else {
        return Ok(None);
    };
    detail.items = fetch_items(conn, id).await?;
    Ok(Some(detail))
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<PurchaseOrder> {
    let order: Option<PurchaseOrder> = sqlx::query_as(
        r#"
        SELECT id, folio, supplier_id, branch_id, user_id, total_cents, status, notes,
               expected_at, received_at, created_at, updated_at
        FROM purchase_orders WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    order.ok_or_else(|| CoreError::not_found("PurchaseOrder", id).into())
}

async fn exists(conn: &mut SqliteConnection, table: &str, id: &str) -> DbResult<bool> {
    let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"))
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(n > 0)
}

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Orders newest first, filtered by status, supplier, or a search over
    /// folio and supplier name. Each carries its items.
    pub async fn list(&self, query: &PurchaseQuery) -> DbResult<Vec<PurchaseOrderDetail>> {
        let status = query.status()?;
        let supplier_id = optional_text(query.supplier_id.as_deref());
        let pattern = validate_search_query(query.search.as_deref())?.map(|s| like_pattern(&s));

        let mut orders: Vec<PurchaseOrderDetail> = sqlx::query_as(&format!(
            r#"{SELECT_ORDER}
            WHERE (?1 IS NULL OR po.status = ?1)
              AND (?2 IS NULL OR po.supplier_id = ?2)
              AND (?3 IS NULL OR po.folio LIKE ?3 OR s.name LIKE ?3)
            ORDER BY po.created_at DESC, po.rowid DESC"#
        ))
        .bind(status)
        .bind(&supplier_id)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        for order in &mut orders {
            order.items = fetch_items(&mut conn, &order.order.id).await?;
        }
        Ok(orders)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<PurchaseOrderDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    /// Creates an OPEN order. Unit cost falls back to the product's cost,
    /// then to zero.
    ///
    /// ## Errors
    /// - `Validation` without supplier, items, or a branch to deliver to;
    ///   or with a quantity or cost out of range
    /// - `NotFound` when the supplier, branch or a product does not exist
    pub async fn create(&self, actor: &Actor, request: NewPurchaseOrder) -> DbResult<PurchaseOrderDetail> {
        let supplier_id = request.supplier_id()?;
        validate_line_count(request.items.len())?;
        let branch_id = match optional_text(request.branch_id.as_deref()) {
            Some(id) => id,
            None => actor.branch()?.to_string(),
        };
        let expected_at = request.expected_at()?;

        let mut lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product_id = optional_text(line.product_id.as_deref())
                .ok_or_else(|| ValidationError::required("productId"))?;
            validate_quantity(line.quantity_ordered)?;
            if let Some(cost) = line.unit_cost_cents {
                validate_price(cost, "unitCostCents")?;
            }
            lines.push((product_id, line.quantity_ordered, line.unit_cost_cents));
        }

        let mut tx = self.pool.begin().await?;

        if !exists(&mut tx, "suppliers", &supplier_id).await? {
            return Err(CoreError::not_found("Supplier", supplier_id).into());
        }
        if !exists(&mut tx, "branches", &branch_id).await? {
            return Err(CoreError::not_found("Branch", branch_id).into());
        }

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity, cost) in lines {
            let found = product::fetch(&mut tx, &product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", &product_id))?;
            let unit_cost = cost.or(found.cost_cents).unwrap_or(0);
            items.push((found, quantity, unit_cost));
        }
        let total: i64 = items.iter().map(|(_, qty, cost)| qty * cost).sum();

        let folio = folio::next_folio(&mut tx, FolioKind::PurchaseOrder).await?;
        let id = new_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                id, folio, supplier_id, branch_id, user_id, total_cents, status,
                notes, expected_at, received_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(&folio)
        .bind(&supplier_id)
        .bind(&branch_id)
        .bind(&actor.user_id)
        .bind(total)
        .bind(PurchaseOrderStatus::Open)
        .bind(optional_text(request.notes.as_deref()))
        .bind(expected_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (found, quantity, unit_cost) in &items {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (
                    id, purchase_order_id, product_id, product_name, product_code,
                    quantity_ordered, quantity_received, unit_cost_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
                "#,
            )
            .bind(new_id())
            .bind(&id)
            .bind(&found.id)
            .bind(&found.name)
            .bind(&found.code)
            .bind(quantity)
            .bind(unit_cost)
            .bind(quantity * unit_cost)
            .execute(&mut *tx)
            .await?;
        }

        let detail = fetch_detail(&mut tx, &id)
            .await?
            .ok_or_else(|| CoreError::not_found("PurchaseOrder", &id))?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreatePurchaseOrder,
            Some("PurchaseOrder"),
            Some(&id),
            json!({ "folio": folio, "supplier": detail.supplier_name, "totalCents": total }),
        )
        .await?;

        tx.commit().await?;

        info!(%folio, total_cents = total, items = items.len(), "Purchase order created");
        Ok(detail)
    }

    /// Receives merchandise. Without `items`, everything pending is
    /// received.
    pub async fn receive(
        &self,
        actor: &Actor,
        id: &str,
        request: ReceivePurchaseOrder,
    ) -> DbResult<PurchaseOrderDetail> {
        let requested: HashMap<String, i64> = request
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|line| (line.item_id, line.quantity_received))
            .collect();

        let mut tx = self.pool.begin().await?;

        let order = fetch_order(&mut tx, id).await?;
        ensure_receivable(order.status)?;

        let receivable: Vec<ReceivableItem> = fetch_items(&mut tx, id)
            .await?
            .into_iter()
            .map(|item| ReceivableItem {
                item_id: item.id,
                product_id: item.product_id,
                quantity_ordered: item.quantity_ordered,
                quantity_received: item.quantity_received,
            })
            .collect();

        let plan = plan_receipt(&receivable, &requested);
        for allocation in &plan {
            debug!(item_id = %allocation.item_id, accepted = allocation.accepted, "Receiving line");
            sqlx::query(
                "UPDATE purchase_order_items SET quantity_received = quantity_received + ?2 WHERE id = ?1",
            )
            .bind(&allocation.item_id)
            .bind(allocation.accepted)
            .execute(&mut *tx)
            .await?;
            product::adjust_stock(&mut tx, &allocation.product_id, &order.branch_id, allocation.accepted).await?;
        }

        let (ordered, received): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(quantity_ordered), 0), COALESCE(SUM(quantity_received), 0)
            FROM purchase_order_items WHERE purchase_order_id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let now = Utc::now();
        let status = derive_status(ordered, received);
        let received_at = received_at_for(status, order.received_at, now);
        let notes = optional_text(request.notes.as_deref()).or(order.notes);

        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET status = ?2, notes = ?3, received_at = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(&notes)
        .bind(received_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::ReceivePurchaseOrder,
            Some("PurchaseOrder"),
            Some(id),
            json!({ "folio": order.folio, "status": status }),
        )
        .await?;

        let detail = fetch_detail(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("PurchaseOrder", id))?;
        tx.commit().await?;

        info!(folio = %order.folio, %status, received, ordered, "Merchandise received");
        Ok(detail)
    }

    /// Manual status override. Moves no stock.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        update: &PurchaseStatusUpdate,
    ) -> DbResult<PurchaseOrder> {
        let next = update.status()?;

        let mut tx = self.pool.begin().await?;

        let order = fetch_order(&mut tx, id).await?;
        check_manual_status(order.status, next)?;

        let now = Utc::now();
        let received_at = received_at_for(next, order.received_at, now);
        let notes = match &update.notes {
            Some(notes) => optional_text(Some(notes)),
            None => order.notes,
        };

        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET status = ?2, notes = ?3, received_at = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(&notes)
        .bind(received_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::UpdatePurchaseOrder,
            Some("PurchaseOrder"),
            Some(id),
            json!({ "folio": order.folio, "status": next }),
        )
        .await?;

        let updated = fetch_order(&mut tx, id).await?;
        tx.commit().await?;

        info!(folio = %order.folio, from = %order.status, to = %next, "Purchase order status changed");
        Ok(updated)
    }
}
