//! # Product Repository
//!
//! Catalog, categories and per-branch stock.
//!
//! ## Stock Rule
//! Stock is only ever changed by delta, in SQL, on the workflow's
//! transaction:
//! ```sql
//! INSERT INTO product_stock (product_id, branch_id, quantity) VALUES (?, ?, delta)
//! ON CONFLICT (product_id, branch_id)
//! DO UPDATE SET quantity = product_stock.quantity + excluded.quantity
//! ```
//! Never read-modify-write from Rust: two concurrent sales of the same
//! product must both land.

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::folio::generated_product_code;
use saori_core::inputs::{NewProduct, ProductPatch, ProductQuery};
use saori_core::models::{Category, Product, ProductListing};
use saori_core::validation::{optional_text, validate_search_query};
use saori_core::Actor;
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{activity, like_pattern, new_id};

const SELECT_PRODUCT: &str = r#"
    SELECT id, code, name, description, price_cents, cost_cents, category_id,
           min_stock, active, created_at, updated_at
    FROM products
"#;

/// Adds `delta` to the stock of a product in a branch, creating the row on
/// first movement. `delta` may be negative and the result may go below zero.
pub(crate) async fn adjust_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    branch_id: &str,
    delta: i64,
) -> DbResult<()> {
    debug!(%product_id, %branch_id, delta, "Adjusting stock");

    sqlx::query(
        r#"
        INSERT INTO product_stock (product_id, branch_id, quantity)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (product_id, branch_id)
        DO UPDATE SET quantity = product_stock.quantity + excluded.quantity
        "#,
    )
    .bind(product_id)
    .bind(branch_id)
    .bind(delta)
    .execute(conn)
    .await?;

    Ok(())
}

/// Reads a product (active or not) on an open connection.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Active products ordered by name, with category name and the stock of
    /// the actor's branch (0 when the actor has none).
    ///
    /// ## Filters
    /// - `search`: substring of name or code
    /// - `category`: exact category id
    pub async fn list(&self, actor: &Actor, query: &ProductQuery) -> DbResult<Vec<ProductListing>> {
        let search = validate_search_query(query.search.as_deref())?;
        let category = optional_text(query.category.as_deref());

        let products = sqlx::query_as(
            r#"
            SELECT p.id, p.code, p.name, p.description, p.price_cents, p.cost_cents,
                   p.category_id, p.min_stock, p.active, p.created_at, p.updated_at,
                   COALESCE(c.name, 'General') AS category_name,
                   COALESCE(s.quantity, 0) AS stock
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            LEFT JOIN product_stock s ON s.product_id = p.id AND s.branch_id = ?1
            WHERE p.active = 1
              AND (?2 IS NULL OR p.name LIKE ?2 OR p.code LIKE ?2)
              AND (?3 IS NULL OR p.category_id = ?3)
            ORDER BY p.name
            "#,
        )
        .bind(actor.branch_id.as_deref())
        .bind(search.as_deref().map(like_pattern))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Creates a product. Code defaults to `PROD-<base36 millis>`, minimum
    /// stock to 5.
    pub async fn create(&self, actor: &Actor, request: NewProduct) -> DbResult<Product> {
        let (name, price_cents) = request.required()?;
        let now = Utc::now();
        let code = optional_text(request.code.as_deref())
            .unwrap_or_else(|| generated_product_code(now.timestamp_millis()));

        let product = Product {
            id: new_id(),
            code,
            name,
            description: optional_text(request.description.as_deref()),
            price_cents,
            cost_cents: request.cost_cents,
            category_id: optional_text(request.category_id.as_deref()),
            min_stock: request.min_stock(),
            active: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, price_cents, cost_cents,
                category_id, min_stock, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(&product.category_id)
        .bind(product.min_stock)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateProduct,
            Some("Product"),
            Some(&product.id),
            json!({ "name": product.name, "priceCents": product.price_cents }),
        )
        .await?;

        tx.commit().await?;

        info!(product_id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    /// Applies a partial update. A price change is logged as `UPDATE_PRICE`.
    pub async fn update(&self, actor: &Actor, id: &str, patch: ProductPatch) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let mut product = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        let old_price = product.price();

        patch.apply_to(&mut product)?;
        product.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2, description = ?3, price_cents = ?4, cost_cents = ?5,
                category_id = ?6, min_stock = ?7, active = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(&product.category_id)
        .bind(product.min_stock)
        .bind(product.active)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        let (action, details) = if product.price() != old_price {
            (
                ActivityAction::UpdatePrice,
                json!({
                    "productName": product.name,
                    "oldPriceCents": old_price.cents(),
                    "newPriceCents": product.price_cents,
                }),
            )
        } else {
            (ActivityAction::UpdateProduct, json!({ "name": product.name }))
        };
        activity::record(&mut tx, &actor.user_id, action, Some("Product"), Some(id), details).await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Deactivates the product. Sale lines keep their snapshots.
    pub async fn soft_delete(&self, actor: &Actor, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE products SET active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::DeleteProduct,
            Some("Product"),
            Some(id),
            json!({}),
        )
        .await?;

        tx.commit().await?;
        info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    /// All categories ordered by name.
    pub async fn categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as("SELECT id, name, color FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    /// Current stock of a product in a branch; 0 when it never moved.
    pub async fn stock_of(&self, product_id: &str, branch_id: &str) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM product_stock WHERE product_id = ?1 AND branch_id = ?2",
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quantity.unwrap_or(0))
    }

    /// Adds stock outside of any document (initial load, seed data).
    pub async fn add_stock(&self, product_id: &str, branch_id: &str, delta: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, product_id, branch_id, delta).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{bootstrapped, product, stock};

    #[tokio::test]
    async fn test_create_defaults() {
        let (db, admin) = bootstrapped().await;
        let created = db
            .products()
            .create(
                &admin,
                NewProduct {
                    name: Some("Cable HDMI".to_string()),
                    price_cents: Some(19_900),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(created.code.starts_with("PROD-"));
        assert_eq!(created.min_stock, 5);
        assert!(created.active);
    }

    #[tokio::test]
    async fn test_create_requires_name_and_price() {
        let (db, admin) = bootstrapped().await;
        let err = db
            .products()
            .create(
                &admin,
                NewProduct {
                    name: Some("Sin precio".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_branch_stock() {
        let (db, admin) = bootstrapped().await;
        let mouse = product(&db, &admin, "MS-01", 29_900).await;
        product(&db, &admin, "KB-01", 89_900).await;
        db.products()
            .add_stock(&mouse, admin.branch_id.as_deref().unwrap(), 7)
            .await
            .unwrap();

        let all = db.products().list(&admin, &ProductQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let found = db
            .products()
            .list(
                &admin,
                &ProductQuery {
                    search: Some("ms-".to_string()),
                    category: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].stock, 7);
        assert_eq!(found[0].category_name, "General");
    }

    #[tokio::test]
    async fn test_stock_upsert_accumulates() {
        let (db, admin) = bootstrapped().await;
        let id = product(&db, &admin, "SSD-1", 120_000).await;
        let branch = admin.branch_id.clone().unwrap();

        assert_eq!(stock(&db, &admin, &id).await, 0);
        db.products().add_stock(&id, &branch, 3).await.unwrap();
        db.products().add_stock(&id, &branch, -5).await.unwrap();
        assert_eq!(stock(&db, &admin, &id).await, -2);
    }

    #[tokio::test]
    async fn test_price_change_is_logged_and_soft_delete_hides() {
        let (db, admin) = bootstrapped().await;
        let id = product(&db, &admin, "MON-27", 450_000).await;

        let patch: ProductPatch = serde_json::from_str(r#"{"priceCents": 420000}"#).unwrap();
        let updated = db.products().update(&admin, &id, patch).await.unwrap();
        assert_eq!(updated.price_cents, 420_000);
        assert_eq!(
            db.activity().count_action(ActivityAction::UpdatePrice).await.unwrap(),
            1
        );

        db.products().soft_delete(&admin, &id).await.unwrap();
        let listed = db.products().list(&admin, &ProductQuery::default()).await.unwrap();
        assert!(listed.is_empty());
        assert!(!db.products().get(&id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_missing_product_update_is_not_found() {
        let (db, admin) = bootstrapped().await;
        let err = db
            .products()
            .update(&admin, "nope", ProductPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
