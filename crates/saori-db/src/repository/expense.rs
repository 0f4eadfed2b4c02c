//! # Expense Repository

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::inputs::{ExpenseQuery, NewExpense};
use saori_core::models::{Expense, ExpenseCategory};
use saori_core::validation::optional_text;
use saori_core::{Actor, CoreError};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use crate::repository::{activity, new_id};

const SELECT_EXPENSE: &str = r#"
    SELECT e.id, e.amount_cents, e.description, e.category_id, c.name AS category_name,
           e.date, e.user_id, e.created_at
    FROM expenses e
    LEFT JOIN expense_categories c ON c.id = e.category_id
"#;

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Expense> {
    let expense: Option<Expense> = sqlx::query_as(&format!("{SELECT_EXPENSE} WHERE e.id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    expense.ok_or_else(|| CoreError::not_found("Expense", id).into())
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Newest expense date first.
    pub async fn list(&self, query: &ExpenseQuery) -> DbResult<Vec<Expense>> {
        let category_id = optional_text(query.category_id.as_deref());
        let expenses = sqlx::query_as(&format!(
            "{SELECT_EXPENSE} WHERE (?1 IS NULL OR e.category_id = ?1) ORDER BY e.date DESC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    pub async fn categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as("SELECT id, name FROM expense_categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    /// Records an expense paid by the actor. The date defaults to now.
    pub async fn create(&self, actor: &Actor, request: NewExpense) -> DbResult<Expense> {
        let now = Utc::now();
        let (amount_cents, description, date) = request.validated(now)?;
        let category_id = optional_text(request.category_id.as_deref());

        let mut tx = self.pool.begin().await?;

        if let Some(category) = &category_id {
            let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expense_categories WHERE id = ?1")
                .bind(category)
                .fetch_one(&mut *tx)
                .await?;
            if n == 0 {
                return Err(CoreError::not_found("ExpenseCategory", category).into());
            }
        }

        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO expenses (id, amount_cents, description, category_id, date, user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(amount_cents)
        .bind(&description)
        .bind(&category_id)
        .bind(date)
        .bind(&actor.user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateExpense,
            Some("Expense"),
            Some(&id),
            json!({ "amountCents": amount_cents, "description": description }),
        )
        .await?;

        let expense = fetch(&mut tx, &id).await?;
        tx.commit().await?;

        info!(expense_id = %id, amount_cents, "Expense recorded");
        Ok(expense)
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let expense = fetch(&mut tx, id).await?;
        sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::DeleteExpense,
            Some("Expense"),
            Some(id),
            json!({ "amountCents": expense.amount_cents, "description": expense.description }),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::bootstrapped;

    async fn category(db: &crate::Database, name: &str) -> String {
        let id = new_id();
        sqlx::query("INSERT INTO expense_categories (id, name) VALUES (?1, ?2)")
            .bind(&id)
            .bind(name)
            .execute(db.pool())
            .await
            .unwrap();
        id
    }

    fn new_expense(amount: Option<i64>, category_id: Option<&str>, date: Option<&str>) -> NewExpense {
        NewExpense {
            amount_cents: amount,
            description: Some("Pago de luz".to_string()),
            category_id: category_id.map(str::to_string),
            date: date.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let (db, actor) = bootstrapped().await;
        let servicios = category(&db, "Servicios").await;
        let renta = category(&db, "Renta").await;

        let light = db
            .expenses()
            .create(&actor, new_expense(Some(15_000), Some(&servicios), Some("2026-01-10")))
            .await
            .unwrap();
        assert_eq!(light.category_name.as_deref(), Some("Servicios"));
        assert_eq!(light.date.date_naive().to_string(), "2026-01-10");

        db.expenses()
            .create(&actor, new_expense(Some(900_000), Some(&renta), None))
            .await
            .unwrap();

        let all = db.expenses().list(&ExpenseQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, light.id);

        let only = ExpenseQuery {
            category_id: Some(servicios.clone()),
        };
        assert_eq!(db.expenses().list(&only).await.unwrap().len(), 1);

        let names: Vec<String> = db
            .expenses()
            .categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Renta", "Servicios"]);

        db.expenses().delete(&actor, &light.id).await.unwrap();
        assert_eq!(db.expenses().list(&ExpenseQuery::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let (db, actor) = bootstrapped().await;
        for amount in [None, Some(0), Some(-5)] {
            let err = db
                .expenses()
                .create(&actor, new_expense(amount, None, None))
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        }
        assert!(db.expenses().list(&ExpenseQuery::default()).await.unwrap().is_empty());
    }
}
