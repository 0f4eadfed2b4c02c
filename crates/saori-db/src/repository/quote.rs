//! # Quote Repository
//!
//! Quotes are priced exactly like sales but move no stock until they are
//! converted.
//!
//! ## Lifecycle
//! ```text
//!   DRAFT ⇄ SENT ⇄ ACCEPTED ⇄ REJECTED        (manual, any order)
//!     │      │        │          │
//!     └──────┴────────┴──────────┴──── convert ───► CONVERTED (terminal)
//! ```
//!
//! Conversion creates the sale, its lines, its payment and the stock
//! movements, then flips the quote with a conditional update. Two racing
//! conversions can both build a sale, but only one flip matches
//! `status <> 'CONVERTED'`; the loser's transaction rolls back whole.

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::inputs::{ConvertQuote, NewQuote, QuoteQuery, QuoteStatusUpdate};
use saori_core::models::{ConvertedSale, Payment, Quote, QuoteDetail, QuoteItem, QuoteListing, Sale, SaleItem};
use saori_core::pricing::price_lines;
use saori_core::validation::optional_text;
use saori_core::{
    Actor, CoreError, FolioKind, Money, PageRequest, Pagination, QuoteStatus, SaleStatus, TAX_RATE,
};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::error::DbResult;
use crate::repository::{activity, folio, new_id, product, sale};

/// Default page size of the quote list.
pub const DEFAULT_QUOTES_LIMIT: u32 = 50;

const SELECT_QUOTE: &str = r#"
    SELECT q.id, q.folio, q.user_id, q.customer_id, q.subtotal_cents, q.tax_cents,
           q.total_cents, q.status, q.valid_until, q.notes, q.sale_id,
           q.created_at, q.updated_at,
           c.name AS customer_name,
           u.name AS user_name,
           (SELECT COUNT(*) FROM quote_items i WHERE i.quote_id = q.id) AS items_count
    FROM quotes q
    LEFT JOIN customers c ON c.id = q.customer_id
    LEFT JOIN users u ON u.id = q.user_id
"#;

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<QuoteListing>> {
    let quote = sqlx::query_as(&format!("{SELECT_QUOTE} WHERE q.id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(quote)
}

async fn fetch_items(conn: &mut SqliteConnection, quote_id: &str) -> DbResult<Vec<QuoteItem>> {
    let items = sqlx::query_as(
        r#"
        SELECT id, quote_id, product_id, product_name, product_code, quantity,
               unit_price_cents, discount_bps, subtotal_cents, position
        FROM quote_items WHERE quote_id = ?1
        ORDER BY position
        "#,
    )
    .bind(quote_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<QuoteDetail>> {
    let Some(listing) = fetch(&mut *conn, id).await? else {
        return Ok(None);
    };
    let items = fetch_items(conn, id).await?;
    Ok(Some(QuoteDetail {
        quote: listing.quote,
        customer_name: listing.customer_name,
        user_name: listing.user_name,
        items,
    }))
}

#[derive(Debug, Clone)]
pub struct QuoteRepository {
    pool: SqlitePool,
}

impl QuoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        QuoteRepository { pool }
    }

    /// Creates a DRAFT quote with snapshots of every product.
    ///
    /// ## Errors
    /// - `Validation` on bad lines, as for sales
    /// - `NotFound` when a product or the customer does not exist
    pub async fn create(&self, actor: &Actor, request: NewQuote) -> DbResult<QuoteDetail> {
        let lines = request.line_inputs()?;
        let priced = price_lines(&lines, TAX_RATE)?;
        let valid_until = request.valid_until()?;
        let customer_id = optional_text(request.customer_id.as_deref());

        let mut tx = self.pool.begin().await?;

        sale::ensure_customer(&mut tx, customer_id.as_deref()).await?;

        let mut snapshots = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let found = product::fetch(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", &line.product_id))?;
            snapshots.push(found);
        }

        let folio = folio::next_folio(&mut tx, FolioKind::Quote).await?;
        let id = new_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO quotes (
                id, folio, user_id, customer_id, subtotal_cents, tax_cents, total_cents,
                status, valid_until, notes, sale_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, ?11, ?11)
            "#,
        )
        .bind(&id)
        .bind(&folio)
        .bind(&actor.user_id)
        .bind(&customer_id)
        .bind(priced.subtotal.cents())
        .bind(priced.tax.cents())
        .bind(priced.total.cents())
        .bind(QuoteStatus::Draft)
        .bind(valid_until)
        .bind(optional_text(request.notes.as_deref()))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (position, (line, snapshot)) in priced.lines.iter().zip(&snapshots).enumerate() {
            sqlx::query(
                r#"
                INSERT INTO quote_items (
                    id, quote_id, product_id, product_name, product_code,
                    quantity, unit_price_cents, discount_bps, subtotal_cents, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(new_id())
            .bind(&id)
            .bind(&line.product_id)
            .bind(&snapshot.name)
            .bind(&snapshot.code)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.discount.bps() as i64)
            .bind(line.subtotal.cents())
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateQuote,
            Some("Quote"),
            Some(&id),
            json!({ "folio": folio, "totalCents": priced.total.cents() }),
        )
        .await?;

        let detail = fetch_detail(&mut tx, &id)
            .await?
            .ok_or_else(|| CoreError::not_found("Quote", &id))?;
        tx.commit().await?;

        info!(%folio, total_cents = priced.total.cents(), "Quote created");
        Ok(detail)
    }

    /// Quotes newest first, with item counts.
    pub async fn list(&self, query: &QuoteQuery) -> DbResult<(Vec<QuoteListing>, Pagination)> {
        let page = PageRequest::new(query.page, query.limit, DEFAULT_QUOTES_LIMIT);
        let status = query.status()?;
        let customer_id = optional_text(query.customer_id.as_deref());

        const FILTER: &str = r#"
            WHERE (?1 IS NULL OR q.status = ?1)
              AND (?2 IS NULL OR q.customer_id = ?2)
        "#;

        let quotes = sqlx::query_as(&format!(
            "{SELECT_QUOTE} {FILTER} ORDER BY q.created_at DESC, q.rowid DESC LIMIT ?3 OFFSET ?4"
        ))
        .bind(status)
        .bind(&customer_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM quotes q {FILTER}"))
            .bind(status)
            .bind(&customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((quotes, page.paginate(total)))
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<QuoteDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    /// Manual status change. CONVERTED is reachable only through
    /// [`convert`](Self::convert) and is never left.
    pub async fn update_status(
        &self,
        actor: &Actor,
        id: &str,
        update: &QuoteStatusUpdate,
    ) -> DbResult<Quote> {
        let next = update.status()?;

        let mut tx = self.pool.begin().await?;

        let current = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Quote", id))?;
        current.quote.status.check_manual_transition(next)?;

        sqlx::query("UPDATE quotes SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(next)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::UpdateQuote,
            Some("Quote"),
            Some(id),
            json!({ "folio": current.quote.folio, "status": next }),
        )
        .await?;

        let updated = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Quote", id))?;
        tx.commit().await?;

        Ok(updated.quote)
    }

    /// Turns a quote into a completed sale on the actor's branch.
    ///
    /// The sale carries the quote's totals and line snapshots as stored, not
    /// re-priced against today's catalog.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown quote
    /// - `InvalidState` when the quote is (or concurrently became) CONVERTED
    /// - `Validation` when the actor has no branch
    pub async fn convert(
        &self,
        actor: &Actor,
        id: &str,
        request: ConvertQuote,
    ) -> DbResult<ConvertedSale> {
        let branch_id = actor.branch()?.to_string();

        let mut tx = self.pool.begin().await?;

        let quote = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Quote", id))?
            .quote;
        if quote.status == QuoteStatus::Converted {
            return Err(CoreError::invalid_state("Quote was already converted to a sale").into());
        }

        let items = fetch_items(&mut tx, id).await?;
        let discount: Money = items.iter().map(QuoteItem::discount).sum();

        let folio = folio::next_folio(&mut tx, FolioKind::Sale).await?;
        let now = Utc::now();
        let new_sale = Sale {
            id: new_id(),
            folio,
            user_id: actor.user_id.clone(),
            branch_id: branch_id.clone(),
            customer_id: quote.customer_id.clone(),
            subtotal_cents: quote.subtotal_cents,
            discount_cents: discount.cents(),
            tax_cents: quote.tax_cents,
            total_cents: quote.total_cents,
            status: SaleStatus::Completed,
            notes: Some(format!("Convertida de cotización {}", quote.folio)),
            created_at: now,
            updated_at: now,
        };
        sale::insert_sale(&mut tx, &new_sale).await?;

        for item in &items {
            sale::insert_item(
                &mut tx,
                &SaleItem {
                    id: new_id(),
                    sale_id: new_sale.id.clone(),
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    product_code: item.product_code.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    discount_bps: item.discount_bps,
                    subtotal_cents: item.subtotal_cents,
                    position: item.position,
                },
            )
            .await?;
            product::adjust_stock(&mut tx, &item.product_id, &branch_id, -item.quantity).await?;
        }

        sale::insert_payment(
            &mut tx,
            &Payment {
                id: new_id(),
                sale_id: new_sale.id.clone(),
                method: request.payment_method,
                amount_cents: new_sale.total_cents,
                created_at: now,
            },
        )
        .await?;

        let flipped = sqlx::query(
            r#"
            UPDATE quotes SET status = 'CONVERTED', sale_id = ?2, updated_at = ?3
            WHERE id = ?1 AND status <> 'CONVERTED'
            "#,
        )
        .bind(id)
        .bind(&new_sale.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if flipped.rows_affected() == 0 {
            warn!(quote_id = %id, "Quote converted concurrently");
            return Err(CoreError::invalid_state("Quote was already converted to a sale").into());
        }

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::ConvertQuote,
            Some("Quote"),
            Some(id),
            json!({
                "quoteFolio": quote.folio,
                "saleFolio": new_sale.folio,
                "totalCents": new_sale.total_cents,
            }),
        )
        .await?;

        tx.commit().await?;

        info!(quote = %quote.folio, sale = %new_sale.folio, "Quote converted");
        Ok(ConvertedSale {
            id: new_sale.id,
            folio: new_sale.folio,
            total_cents: new_sale.total_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::{
        bootstrap, bootstrapped, file_database, product, remove_database, stock, until_settled,
    };
    use saori_core::inputs::LineRequest;
    use saori_core::PaymentMethod;

    fn quote_request(product_id: &str, quantity: i64, price: i64, discount: Option<f64>) -> NewQuote {
        NewQuote {
            items: vec![LineRequest {
                product_id: Some(product_id.to_string()),
                quantity,
                unit_price_cents: price,
                discount_percent: discount,
            }],
            ..Default::default()
        }
    }

    fn status(s: &str) -> QuoteStatusUpdate {
        QuoteStatusUpdate {
            status: Some(s.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_snapshots_without_moving_stock() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "MON-27", 5_000).await;

        let quote = db
            .quotes()
            .create(&actor, quote_request(&p, 3, 5_000, Some(10.0)))
            .await
            .unwrap();

        assert_eq!(quote.quote.folio, "COT-00001");
        assert_eq!(quote.quote.status, QuoteStatus::Draft);
        assert_eq!(quote.quote.subtotal_cents, 13_500);
        assert_eq!(quote.quote.total_cents, 15_660);
        assert_eq!(quote.items[0].product_code, "MON-27");
        assert_eq!(quote.user_name.as_deref(), Some("Admin"));
        assert_eq!(stock(&db, &actor, &p).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let (db, actor) = bootstrapped().await;
        let err = db
            .quotes()
            .create(&actor, quote_request("ghost", 1, 100, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));
        assert!(db.quotes().list(&QuoteQuery::default()).await.unwrap().0.is_empty());
    }

    #[tokio::test]
    async fn test_convert_once() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "SSD-1", 5_000).await;
        db.products()
            .add_stock(&p, actor.branch_id.as_deref().unwrap(), 10)
            .await
            .unwrap();
        let quote = db
            .quotes()
            .create(&actor, quote_request(&p, 3, 5_000, Some(10.0)))
            .await
            .unwrap();

        let converted = db
            .quotes()
            .convert(&actor, &quote.quote.id, ConvertQuote { payment_method: PaymentMethod::Card })
            .await
            .unwrap();
        assert_eq!(converted.folio, "V-000001");
        assert_eq!(converted.total_cents, 15_660);
        assert_eq!(stock(&db, &actor, &p).await, 7);

        let sale = db.sales().get(&converted.id).await.unwrap().unwrap();
        assert_eq!(sale.discount_cents, 1_500);
        assert_eq!(sale.notes.as_deref(), Some("Convertida de cotización COT-00001"));
        let payments = db.sales().payments(&converted.id).await.unwrap();
        assert_eq!(payments[0].method, PaymentMethod::Card);

        let after = db.quotes().get(&quote.quote.id).await.unwrap().unwrap();
        assert_eq!(after.quote.status, QuoteStatus::Converted);
        assert_eq!(after.quote.sale_id.as_deref(), Some(converted.id.as_str()));

        let err = db
            .quotes()
            .convert(&actor, &quote.quote.id, ConvertQuote::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidState(_))));
        assert_eq!(stock(&db, &actor, &p).await, 7);
        assert_eq!(db.sales().list(&Default::default()).await.unwrap().1.total, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conversions_create_one_sale() {
        let (db, path) = file_database("convert", 4).await;
        let actor = bootstrap(&db).await;
        let p = product(&db, &actor, "SSD-2", 5_000).await;
        db.products()
            .add_stock(&p, actor.branch_id.as_deref().unwrap(), 10)
            .await
            .unwrap();
        let quote = db
            .quotes()
            .create(&actor, quote_request(&p, 3, 5_000, None))
            .await
            .unwrap();
        let quote_id = quote.quote.id;

        let mut handles = Vec::new();
        for _ in 0..6 {
            let (db, actor, quote_id) = (db.clone(), actor.clone(), quote_id.clone());
            handles.push(tokio::spawn(async move {
                let (db, actor, quote_id) = (&db, &actor, quote_id.as_str());
                until_settled(|| async move {
                    db.quotes().convert(actor, quote_id, ConvertQuote::default()).await
                })
                .await
            }));
        }

        let mut converted = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(sale) => converted.push(sale),
                Err(err) => assert!(
                    matches!(err, DbError::Core(CoreError::InvalidState(_))),
                    "unexpected error: {err}"
                ),
            }
        }
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].folio, "V-000001");

        assert_eq!(db.sales().list(&Default::default()).await.unwrap().1.total, 1);
        assert_eq!(stock(&db, &actor, &p).await, 7);
        let after = db.quotes().get(&quote_id).await.unwrap().unwrap();
        assert_eq!(after.quote.status, QuoteStatus::Converted);
        assert_eq!(after.quote.sale_id.as_deref(), Some(converted[0].id.as_str()));

        remove_database(db, path).await;
    }

    #[tokio::test]
    async fn test_manual_status_changes() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "CAM-1", 1_000).await;
        let quote = db
            .quotes()
            .create(&actor, quote_request(&p, 1, 1_000, None))
            .await
            .unwrap();
        let id = quote.quote.id.clone();

        let sent = db.quotes().update_status(&actor, &id, &status("sent")).await.unwrap();
        assert_eq!(sent.status, QuoteStatus::Sent);
        let back = db.quotes().update_status(&actor, &id, &status("DRAFT")).await.unwrap();
        assert_eq!(back.status, QuoteStatus::Draft);

        let err = db
            .quotes()
            .update_status(&actor, &id, &status("CONVERTED"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidState(_))));

        db.quotes().convert(&actor, &id, ConvertQuote::default()).await.unwrap();
        let err = db
            .quotes()
            .update_status(&actor, &id, &status("SENT"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (db, actor) = bootstrapped().await;
        let p = product(&db, &actor, "MIC-1", 1_000).await;
        for _ in 0..2 {
            db.quotes()
                .create(&actor, quote_request(&p, 1, 1_000, None))
                .await
                .unwrap();
        }
        let (all, _) = db.quotes().list(&QuoteQuery::default()).await.unwrap();
        db.quotes()
            .update_status(&actor, &all[0].quote.id, &status("SENT"))
            .await
            .unwrap();

        let sent = QuoteQuery {
            status: Some("sent".to_string()),
            ..Default::default()
        };
        let (quotes, pagination) = db.quotes().list(&sent).await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(pagination.total, 1);
        assert_eq!(quotes[0].items_count, 1);
    }
}
