//! # Employee Repository
//!
//! Staff records and positions. Employee codes (`EMP-NNNNN`) come from the
//! same folio generator as sales, so they are allocated inside the
//! creating transaction.

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::inputs::{EmployeePatch, NewEmployee};
use saori_core::models::{Employee, Position};
use saori_core::validation::{optional_text, validate_search_query};
use saori_core::{Actor, CoreError, FolioKind};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use crate::repository::{activity, folio, like_pattern, new_id};

const SELECT_EMPLOYEE: &str = r#"
    SELECT e.id, e.code, e.name, e.email, e.phone, e.address, e.position_id,
           p.name AS position_name, e.salary_cents, e.hire_date, e.birth_date,
           e.active, e.notes, e.created_at, e.updated_at
    FROM employees e
    LEFT JOIN positions p ON p.id = e.position_id
"#;

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Employee> {
    let employee: Option<Employee> = sqlx::query_as(&format!("{SELECT_EMPLOYEE} WHERE e.id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    employee.ok_or_else(|| CoreError::not_found("Employee", id).into())
}

async fn ensure_position(conn: &mut SqliteConnection, position_id: &str) -> DbResult<()> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM positions WHERE id = ?1")
        .bind(position_id)
        .fetch_one(conn)
        .await?;
    if n == 0 {
        return Err(CoreError::not_found("Position", position_id).into());
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Employees by name; `search` matches name, code or email.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Employee>> {
        let pattern = validate_search_query(search)?.map(|s| like_pattern(&s));
        let employees = sqlx::query_as(&format!(
            r#"{SELECT_EMPLOYEE}
            WHERE (?1 IS NULL OR e.name LIKE ?1 OR e.code LIKE ?1 OR e.email LIKE ?1)
            ORDER BY e.name"#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    /// Active positions with the number of employees holding each.
    pub async fn positions(&self) -> DbResult<Vec<Position>> {
        let positions = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.active,
                   (SELECT COUNT(*) FROM employees e WHERE e.position_id = p.id) AS employees
            FROM positions p
            WHERE p.active = 1
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }

    pub async fn create(&self, actor: &Actor, request: NewEmployee) -> DbResult<Employee> {
        let essentials = request.essentials()?;

        let mut tx = self.pool.begin().await?;

        ensure_position(&mut tx, &essentials.position_id).await?;

        let code = folio::next_folio(&mut tx, FolioKind::Employee).await?;
        let id = new_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, code, name, email, phone, address, position_id, salary_cents,
                hire_date, birth_date, active, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?12, ?12)
            "#,
        )
        .bind(&id)
        .bind(&code)
        .bind(&essentials.name)
        .bind(optional_text(request.email.as_deref()))
        .bind(optional_text(request.phone.as_deref()))
        .bind(optional_text(request.address.as_deref()))
        .bind(&essentials.position_id)
        .bind(essentials.salary_cents)
        .bind(essentials.hire_date)
        .bind(essentials.birth_date)
        .bind(optional_text(request.notes.as_deref()))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateEmployee,
            Some("Employee"),
            Some(&id),
            json!({ "name": essentials.name, "code": code }),
        )
        .await?;

        let employee = fetch(&mut tx, &id).await?;
        tx.commit().await?;

        info!(%code, "Employee created");
        Ok(employee)
    }

    pub async fn update(&self, actor: &Actor, id: &str, patch: EmployeePatch) -> DbResult<Employee> {
        let mut tx = self.pool.begin().await?;

        let mut employee = fetch(&mut tx, id).await?;
        patch.apply_to(&mut employee)?;
        ensure_position(&mut tx, &employee.position_id).await?;

        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?2, email = ?3, phone = ?4, address = ?5, position_id = ?6,
                salary_cents = ?7, active = ?8, notes = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.address)
        .bind(&employee.position_id)
        .bind(employee.salary_cents)
        .bind(employee.active)
        .bind(&employee.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::UpdateEmployee,
            Some("Employee"),
            Some(id),
            json!({ "name": employee.name }),
        )
        .await?;

        let updated = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let employee = fetch(&mut tx, id).await?;
        sqlx::query("DELETE FROM employees WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::DeleteEmployee,
            Some("Employee"),
            Some(id),
            json!({ "name": employee.name, "code": employee.code }),
        )
        .await?;

        tx.commit().await?;
        info!(code = %employee.code, "Employee deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::bootstrapped;

    async fn position(db: &crate::Database, name: &str, active: bool) -> String {
        let id = new_id();
        sqlx::query("INSERT INTO positions (id, name, active) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name)
            .bind(active)
            .execute(db.pool())
            .await
            .unwrap();
        id
    }

    fn new_employee(name: &str, position_id: &str) -> NewEmployee {
        NewEmployee {
            name: Some(name.to_string()),
            position_id: Some(position_id.to_string()),
            salary_cents: Some(1_200_000),
            hire_date: Some("2025-02-01".to_string()),
            birth_date: Some("1994-07-12T00:00:00Z".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_codes_and_positions() {
        let (db, actor) = bootstrapped().await;
        let cajero = position(&db, "Cajero", true).await;
        position(&db, "Obsoleto", false).await;

        let first = db.employees().create(&actor, new_employee("Ana", &cajero)).await.unwrap();
        let second = db.employees().create(&actor, new_employee("Luis", &cajero)).await.unwrap();
        assert_eq!(first.code, "EMP-00001");
        assert_eq!(second.code, "EMP-00002");
        assert_eq!(first.position_name.as_deref(), Some("Cajero"));
        assert_eq!(first.birth_date.unwrap().to_string(), "1994-07-12");

        let positions = db.employees().positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].employees, 2);

        let found = db.employees().list(Some("EMP-00002")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Luis");
    }

    #[tokio::test]
    async fn test_required_fields_and_unknown_position() {
        let (db, actor) = bootstrapped().await;
        let mut missing = new_employee("Ana", "x");
        missing.hire_date = None;
        let err = db.employees().create(&actor, missing).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = db
            .employees()
            .create(&actor, new_employee("Ana", "no-such-position"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (db, actor) = bootstrapped().await;
        let cajero = position(&db, "Cajero", true).await;
        let employee = db.employees().create(&actor, new_employee("Ana", &cajero)).await.unwrap();

        let patch: EmployeePatch = serde_json::from_str(r#"{"salaryCents":1500000,"active":false}"#).unwrap();
        let updated = db.employees().update(&actor, &employee.id, patch).await.unwrap();
        assert_eq!(updated.salary_cents, 1_500_000);
        assert!(!updated.active);
        assert_eq!(updated.code, employee.code);

        let bad: EmployeePatch = serde_json::from_str(r#"{"salaryCents":0}"#).unwrap();
        assert!(db.employees().update(&actor, &employee.id, bad).await.is_err());

        db.employees().delete(&actor, &employee.id).await.unwrap();
        assert!(db.employees().list(None).await.unwrap().is_empty());
    }
}
