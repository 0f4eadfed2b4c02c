//! # Setup Repository
//!
//! First-run bootstrap: creates the main branch and the first ADMIN account
//! in one transaction. Refused once any user exists.

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::inputs::FirstUserRequest;
use saori_core::models::User;
use saori_core::validation::{normalize_email, require_text};
use saori_core::{CoreError, Role};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::{activity, new_id, user};

#[derive(Debug, Clone)]
pub struct SetupRepository {
    pool: SqlitePool,
}

impl SetupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SetupRepository { pool }
    }

    /// True while no user account exists.
    pub async fn requires_setup(&self) -> DbResult<bool> {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(users == 0)
    }

    /// Creates the main branch and the ADMIN user.
    ///
    /// The password is validated and hashed by the caller; only the hash is
    /// stored.
    ///
    /// ## Errors
    /// - `Conflict` when the system already has users
    /// - `Validation` on a missing name or malformed email
    pub async fn bootstrap(&self, request: &FirstUserRequest, password_hash: &str) -> DbResult<User> {
        let name = require_text(request.name.as_deref(), "name")?;
        let email = normalize_email(request.email.as_deref().unwrap_or_default())?;
        let branch_name = request.branch_name();

        let mut tx = self.pool.begin().await?;

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        if users > 0 {
            return Err(CoreError::Conflict("System is already initialized".to_string()).into());
        }

        let now = Utc::now();
        let branch_id = new_id();
        sqlx::query(
            r#"
            INSERT INTO branches (id, name, is_main, active, created_at)
            VALUES (?1, ?2, 1, 1, ?3)
            "#,
        )
        .bind(&branch_id)
        .bind(&branch_name)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let user_id = new_id();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, branch_id, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            "#,
        )
        .bind(&user_id)
        .bind(&email)
        .bind(password_hash)
        .bind(&name)
        .bind(Role::Admin)
        .bind(&branch_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &user_id,
            ActivityAction::SystemBootstrap,
            Some("System"),
            Some(&user_id),
            json!({ "initializedBy": email, "branch": branch_name }),
        )
        .await?;

        let created = user::fetch(&mut tx, &user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &user_id))?;

        tx.commit().await?;

        info!(user_id = %created.id, branch = %branch_name, "System bootstrapped");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::testing::TEST_HASH;

    fn request(email: &str) -> FirstUserRequest {
        FirstUserRequest {
            name: Some("Dueña".to_string()),
            email: Some(email.to_string()),
            password: None,
            branch_name: None,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.setup().requires_setup().await.unwrap());

        let user = db
            .setup()
            .bootstrap(&request("  Owner@Saori.Local "), TEST_HASH)
            .await
            .unwrap();
        assert_eq!(user.email, "owner@saori.local");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.branch_name.as_deref(), Some("Sucursal Principal"));
        assert!(!db.setup().requires_setup().await.unwrap());
        assert_eq!(
            db.activity().count_action(ActivityAction::SystemBootstrap).await.unwrap(),
            1
        );

        let err = db
            .setup()
            .bootstrap(&request("other@saori.local"), TEST_HASH)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Conflict(_))));
        assert_eq!(
            db.activity().count_action(ActivityAction::SystemBootstrap).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_bad_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .setup()
            .bootstrap(&request("not-an-email"), TEST_HASH)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert!(db.setup().requires_setup().await.unwrap());
    }
}
