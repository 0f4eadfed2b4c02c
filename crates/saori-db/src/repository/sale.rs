//! # Sale Repository
//!
//! Direct sales: the creation workflow, sales history and the cashier's
//! daily summary.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate + price (saori-core)          nothing open yet                │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │  ├── snapshot name/code of each product ("Producto"/"N/A" if missing)   │
//! │  ├── folio V-NNNNNN                                                     │
//! │  ├── INSERT sales, sale_items, payments                                 │
//! │  ├── stock −qty on the actor's branch  (resolved products only)         │
//! │  ├── activity CREATE_SALE                                               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveTime, Utc};
use saori_core::activity::ActivityAction;
use saori_core::inputs::{NewSale, SaleQuery};
use saori_core::models::{DailySale, DailySummary, Payment, Sale, SaleItem, SaleListing, SaleReceipt};
use saori_core::pricing::{change_due, price_lines, PricedLine};
use saori_core::validation::optional_text;
use saori_core::{
    Actor, CoreError, FolioKind, Money, PageRequest, Pagination, SaleStatus,
    MISSING_PRODUCT_CODE, MISSING_PRODUCT_NAME, TAX_RATE, WALK_IN_CUSTOMER,
};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use crate::repository::{activity, folio, new_id, product};

/// Default page size of the sales history.
pub const DEFAULT_SALES_LIMIT: u32 = 50;

// =============================================================================
// Transaction Helpers
// =============================================================================
// Shared with quote conversion, which produces a sale from a quote.

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, folio, user_id, branch_id, customer_id,
            subtotal_cents, discount_cents, tax_cents, total_cents,
            status, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.folio)
    .bind(&sale.user_id)
    .bind(&sale.branch_id)
    .bind(&sale.customer_id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.status)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, product_name, product_code,
            quantity, unit_price_cents, discount_bps, subtotal_cents, position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(&item.product_code)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_bps)
    .bind(item.subtotal_cents)
    .bind(item.position)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, sale_id, method, amount_cents, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.sale_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(payment.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Fails with NotFound when a referenced customer does not exist.
pub(crate) async fn ensure_customer(conn: &mut SqliteConnection, customer_id: Option<&str>) -> DbResult<()> {
    let Some(id) = customer_id else {
        return Ok(());
    };
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE id = ?1")
        .bind(id)
        .fetch_one(conn)
        .await?;
    if exists == 0 {
        return Err(CoreError::not_found("Customer", id).into());
    }
    Ok(())
}

fn sale_item(sale_id: &str, position: usize, line: &PricedLine, name: String, code: String) -> SaleItem {
    SaleItem {
        id: new_id(),
        sale_id: sale_id.to_string(),
        product_id: line.product_id.clone(),
        product_name: name,
        product_code: code,
        quantity: line.quantity,
        unit_price_cents: line.unit_price.cents(),
        discount_bps: line.discount.bps() as i64,
        subtotal_cents: line.subtotal.cents(),
        position: position as i64,
    }
}

/// `[00:00, next 00:00)` of the UTC day containing `now`.
fn utc_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a completed sale.
    ///
    /// ## Errors
    /// - `Validation` on empty items, bad quantities/prices/discounts, or an
    ///   actor without a branch; nothing is written
    /// - `NotFound` for an unknown customer
    /// - a retryable `Busy`/`UniqueViolation` when another sale took the folio
    pub async fn create(&self, actor: &Actor, request: NewSale) -> DbResult<SaleReceipt> {
        let lines = request.line_inputs()?;
        let priced = price_lines(&lines, TAX_RATE)?;
        let branch_id = actor.branch()?.to_string();
        let amount_paid = Money::from_cents(request.amount_paid_cents);
        let change = change_due(request.payment_method, amount_paid, priced.total);
        let customer_id = optional_text(request.customer_id.as_deref());

        let mut tx = self.pool.begin().await?;

        ensure_customer(&mut tx, customer_id.as_deref()).await?;

        let folio = folio::next_folio(&mut tx, FolioKind::Sale).await?;
        let now = Utc::now();
        let sale = Sale {
            id: new_id(),
            folio,
            user_id: actor.user_id.clone(),
            branch_id: branch_id.clone(),
            customer_id,
            subtotal_cents: priced.subtotal.cents(),
            discount_cents: priced.discount.cents(),
            tax_cents: priced.tax.cents(),
            total_cents: priced.total.cents(),
            status: SaleStatus::Completed,
            notes: optional_text(request.notes.as_deref()),
            created_at: now,
            updated_at: now,
        };
        insert_sale(&mut tx, &sale).await?;

        for (position, line) in priced.lines.iter().enumerate() {
            let snapshot = product::fetch(&mut tx, &line.product_id).await?;
            let item = match &snapshot {
                Some(p) => sale_item(&sale.id, position, line, p.name.clone(), p.code.clone()),
                None => sale_item(
                    &sale.id,
                    position,
                    line,
                    MISSING_PRODUCT_NAME.to_string(),
                    MISSING_PRODUCT_CODE.to_string(),
                ),
            };
            insert_item(&mut tx, &item).await?;

            if snapshot.is_some() {
                product::adjust_stock(&mut tx, &line.product_id, &branch_id, -line.quantity).await?;
            }
        }

        insert_payment(
            &mut tx,
            &Payment {
                id: new_id(),
                sale_id: sale.id.clone(),
                method: request.payment_method,
                amount_cents: sale.total_cents,
                created_at: now,
            },
        )
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateSale,
            Some("Sale"),
            Some(&sale.id),
            json!({
                "folio": sale.folio,
                "totalCents": sale.total_cents,
                "items": priced.lines.len(),
                "paymentMethod": request.payment_method,
            }),
        )
        .await?;

        tx.commit().await?;

        info!(
            folio = %sale.folio,
            total_cents = sale.total_cents,
            items = priced.lines.len(),
            "Sale completed"
        );

        Ok(SaleReceipt {
            id: sale.id,
            folio: sale.folio,
            total_cents: sale.total_cents,
            change_cents: change.cents(),
            timestamp: now,
        })
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as(
            r#"
            SELECT id, folio, user_id, branch_id, customer_id, subtotal_cents,
                   discount_cents, tax_cents, total_cents, status, notes,
                   created_at, updated_at
            FROM sales WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sale)
    }

    /// Lines in their original order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as(
            r#"
            SELECT id, sale_id, product_id, product_name, product_code, quantity,
                   unit_price_cents, discount_bps, subtotal_cents, position
            FROM sale_items WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as(
            "SELECT id, sale_id, method, amount_cents, created_at FROM payments WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    /// Sales history, newest first, with lines, seller and customer names.
    ///
    /// `paymentMethod` matches any payment of the sale; `dateFrom`/`dateTo`
    /// are inclusive calendar days.
    pub async fn list(&self, query: &SaleQuery) -> DbResult<(Vec<SaleListing>, Pagination)> {
        let page = PageRequest::new(query.page, query.limit, DEFAULT_SALES_LIMIT);
        let status = query.status()?;
        let method = query.payment_method()?;
        let (from, to) = query.date_range()?;

        const FILTER: &str = r#"
            WHERE (?1 IS NULL OR s.status = ?1)
              AND (?2 IS NULL OR EXISTS (
                    SELECT 1 FROM payments pm WHERE pm.sale_id = s.id AND pm.method = ?2))
              AND (?3 IS NULL OR s.created_at >= ?3)
              AND (?4 IS NULL OR s.created_at <= ?4)
        "#;

        let mut sales: Vec<SaleListing> = sqlx::query_as(&format!(
            r#"
            SELECT s.id, s.folio, s.user_id, s.branch_id, s.customer_id, s.subtotal_cents,
                   s.discount_cents, s.tax_cents, s.total_cents, s.status, s.notes,
                   s.created_at, s.updated_at,
                   (SELECT pm.method FROM payments pm WHERE pm.sale_id = s.id
                    ORDER BY pm.created_at LIMIT 1) AS payment_method,
                   c.name AS customer_name,
                   u.name AS user_name
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            LEFT JOIN users u ON u.id = s.user_id
            {FILTER}
            ORDER BY s.created_at DESC, s.rowid DESC
            LIMIT ?5 OFFSET ?6
            "#
        ))
        .bind(status)
        .bind(method)
        .bind(from)
        .bind(to)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sales s {FILTER}"))
            .bind(status)
            .bind(method)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        for sale in &mut sales {
            sale.items = self.items(&sale.sale.id).await?;
        }

        Ok((sales, page.paginate(total)))
    }

    /// The actor's non-cancelled sales of the current UTC day.
    pub async fn daily(&self, actor: &Actor) -> DbResult<(Vec<DailySale>, DailySummary)> {
        self.daily_at(actor, Utc::now()).await
    }

    async fn daily_at(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> DbResult<(Vec<DailySale>, DailySummary)> {
        let (start, end) = utc_day_bounds(now);

        let sales: Vec<DailySale> = sqlx::query_as(
            r#"
            SELECT s.id, s.folio, s.total_cents,
                   (SELECT COUNT(*) FROM sale_items i WHERE i.sale_id = s.id) AS items_count,
                   COALESCE(c.name, ?4) AS customer_name,
                   s.created_at
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.user_id = ?1
              AND s.created_at >= ?2 AND s.created_at < ?3
              AND s.status <> 'CANCELLED'
            ORDER BY s.created_at DESC, s.rowid DESC
            "#,
        )
        .bind(&actor.user_id)
        .bind(start)
        .bind(end)
        .bind(WALK_IN_CUSTOMER)
        .fetch_all(&self.pool)
        .await?;

        let summary = DailySummary {
            total_cents: sales.iter().map(|s| s.total_cents).sum(),
            count: sales.len() as i64,
            date: start.date_naive(),
        };
        Ok((sales, summary))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::{
        bootstrap, bootstrapped, file_database, product, remove_database, stock, until_settled,
    };
    use saori_core::inputs::LineRequest;
    use saori_core::{PaymentMethod, ValidationError};

    fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> LineRequest {
        LineRequest {
            product_id: Some(product_id.to_string()),
            quantity,
            unit_price_cents,
            discount_percent: None,
        }
    }

    fn cash_sale(items: Vec<LineRequest>, paid: i64) -> NewSale {
        NewSale {
            items,
            payment_method: PaymentMethod::Cash,
            amount_paid_cents: paid,
            customer_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_two_units_cash_sale() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "MBP-14", 10_000).await;
        let branch = actor.branch_id.clone().unwrap();
        db.products().add_stock(&p, &branch, 10).await.unwrap();

        let receipt = db
            .sales()
            .create(&actor, cash_sale(vec![line(&p, 2, 10_000)], 30_000))
            .await
            .unwrap();

        assert_eq!(receipt.folio, "V-000001");
        assert_eq!(receipt.total_cents, 23_200);
        assert_eq!(receipt.change_cents, 6_800);
        assert_eq!(stock(&db, &actor, &p).await, 8);

        let sale = db.sales().get(&receipt.id).await.unwrap().unwrap();
        assert_eq!(sale.subtotal_cents, 20_000);
        assert_eq!(sale.tax_cents, 3_200);
        assert_eq!(sale.status, SaleStatus::Completed);

        let payments = db.sales().payments(&receipt.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_cents, 23_200);

        assert_eq!(db.activity().count_action(ActivityAction::CreateSale).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_card_sale_has_no_change() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "KB-01", 10_000).await;

        let mut request = cash_sale(vec![line(&p, 1, 10_000)], 50_000);
        request.payment_method = PaymentMethod::Card;
        let receipt = db.sales().create(&actor, request).await.unwrap();
        assert_eq!(receipt.change_cents, 0);
    }

    #[tokio::test]
    async fn test_missing_product_gets_placeholder_and_no_stock_row() {
        let (db, actor) = bootstrapped().await;

        let receipt = db
            .sales()
            .create(&actor, cash_sale(vec![line("ghost", 1, 500)], 1_000))
            .await
            .unwrap();

        let items = db.sales().items(&receipt.id).await.unwrap();
        assert_eq!(items[0].product_name, "Producto");
        assert_eq!(items[0].product_code, "N/A");
        assert_eq!(stock(&db, &actor, "ghost").await, 0);
    }

    #[tokio::test]
    async fn test_oversell_goes_negative() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "GPU-1", 1_000_000).await;
        db.products()
            .add_stock(&p, actor.branch_id.as_deref().unwrap(), 1)
            .await
            .unwrap();

        db.sales()
            .create(&actor, cash_sale(vec![line(&p, 3, 1_000_000)], 0))
            .await
            .unwrap();
        assert_eq!(stock(&db, &actor, &p).await, -2);
    }

    #[tokio::test]
    async fn test_rejected_sale_leaves_no_trace() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "RAM-16", 50_000).await;

        let err = db
            .sales()
            .create(&actor, cash_sale(vec![line(&p, 0, 50_000)], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = db
            .sales()
            .create(&actor, cash_sale(vec![], 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let (sales, pagination) = db.sales().list(&SaleQuery::default()).await.unwrap();
        assert!(sales.is_empty());
        assert_eq!(pagination.total, 0);
        assert_eq!(stock(&db, &actor, &p).await, 0);
        assert_eq!(db.activity().count_action(ActivityAction::CreateSale).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_actor_without_branch_is_rejected() {
        let (db, mut actor) = bootstrapped().await;
        let p = product(&db, &actor, "CASE-1", 1_000).await;
        actor.branch_id = None;

        let err = db
            .sales()
            .create(&actor, cash_sale(vec![line(&p, 1, 1_000)], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "PAD-1", 1_000).await;
        let mut request = cash_sale(vec![line(&p, 1, 1_000)], 0);
        request.customer_id = Some("nobody".to_string());

        let err = db.sales().create(&actor, request).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_folios_are_sequential() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "USB-1", 100).await;

        let mut folios = Vec::new();
        for _ in 0..3 {
            let receipt = db
                .sales()
                .create(&actor, cash_sale(vec![line(&p, 1, 100)], 0))
                .await
                .unwrap();
            folios.push(receipt.folio);
        }
        assert_eq!(folios, vec!["V-000001", "V-000002", "V-000003"]);
    }

    #[tokio::test]
    async fn test_list_filters_and_daily_summary() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "HUB-1", 10_000).await;

        db.sales()
            .create(&actor, cash_sale(vec![line(&p, 1, 10_000)], 20_000))
            .await
            .unwrap();
        let mut card = cash_sale(vec![line(&p, 2, 10_000)], 0);
        card.payment_method = PaymentMethod::Card;
        db.sales().create(&actor, card).await.unwrap();

        let (all, _) = db.sales().list(&SaleQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sale.folio, "V-000002");
        assert_eq!(all[0].items.len(), 1);
        assert_eq!(all[0].user_name.as_deref(), Some("Admin"));

        let by_card = SaleQuery {
            payment_method: Some("card".to_string()),
            ..Default::default()
        };
        let (cards, pagination) = db.sales().list(&by_card).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(pagination.total, 1);
        assert_eq!(cards[0].payment_method, Some(PaymentMethod::Card));

        let today = Utc::now().date_naive().to_string();
        let by_day = SaleQuery {
            date_from: Some(today.clone()),
            date_to: Some(today),
            ..Default::default()
        };
        assert_eq!(db.sales().list(&by_day).await.unwrap().0.len(), 2);

        let (daily, summary) = db.sales().daily(&actor).await.unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_cents, 11_600 + 23_200);
        assert_eq!(daily[1].customer_name, "Público en General");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_get_distinct_folios() {
        let (db, path) = file_database("folios", 4).await;
        let actor = bootstrap(&db).await;
        let p = product(&db, &actor, "CBL-1", 100).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let (db, actor, p) = (db.clone(), actor.clone(), p.clone());
            handles.push(tokio::spawn(async move {
                let (db, actor, p) = (&db, &actor, &p);
                until_settled(|| async move {
                    db.sales().create(actor, cash_sale(vec![line(p, 1, 100)], 0)).await
                })
                .await
                .map(|receipt| receipt.folio)
            }));
        }

        let mut folios = Vec::new();
        for handle in handles {
            folios.push(handle.await.unwrap().unwrap());
        }
        folios.sort();
        folios.dedup();
        assert_eq!(folios.len(), 8);
        assert_eq!(folios.last().map(String::as_str), Some("V-000008"));
        assert_eq!(stock(&db, &actor, &p).await, -8);

        remove_database(db, path).await;
    }

    #[test]
    fn test_utc_day_bounds() {
        let now = "2026-03-15T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let (start, end) = utc_day_bounds(now);
        assert_eq!(start.to_rfc3339(), "2026-03-15T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-16T00:00:00+00:00");
    }
}
