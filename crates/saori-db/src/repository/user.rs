//! # User Repository
//!
//! Accounts and credentials. Users are soft-deleted (`active = 0`) because
//! sales and activity entries keep pointing at them.

use chrono::Utc;
use saori_core::activity::ActivityAction;
use saori_core::inputs::{NewUser, UserPatch};
use saori_core::models::User;
use saori_core::validation::{normalize_email, optional_text, require_text};
use saori_core::Actor;
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{activity, like_pattern, new_id};

const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.name, u.role, u.branch_id, b.name AS branch_name,
           u.active, u.created_at, u.updated_at
    FROM users u
    LEFT JOIN branches b ON b.id = u.branch_id
"#;

/// A user together with the stored password hash. Only the auth layer
/// sees this.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Reads one user (any state) on an open connection.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<User>> {
    let user = sqlx::query_as(&format!("{SELECT_USER} WHERE u.id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

async fn email_taken(conn: &mut SqliteConnection, email: &str, except: Option<&str>) -> DbResult<bool> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1 AND id <> COALESCE(?2, '')")
        .bind(email)
        .bind(except)
        .fetch_one(conn)
        .await?;
    Ok(n > 0)
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Looks up an active account by email for login.
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<Credentials>> {
        let email = email.trim().to_lowercase();
        let found = sqlx::query_as(
            r#"
            SELECT u.id, u.email, u.name, u.role, u.branch_id, b.name AS branch_name,
                   u.active, u.created_at, u.updated_at, u.password_hash
            FROM users u
            LEFT JOIN branches b ON b.id = u.branch_id
            WHERE u.email = ?1 AND u.active = 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Active users, optionally filtered by name or email, ordered by name.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<User>> {
        let pattern = search.map(like_pattern);
        let users = sqlx::query_as(&format!(
            "{SELECT_USER} WHERE u.active = 1
               AND (?1 IS NULL OR u.name LIKE ?1 OR u.email LIKE ?1)
             ORDER BY u.name"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Creates an account. `password_hash` is computed by the caller.
    ///
    /// ## Errors
    /// - `Validation` when name, email or role is missing or malformed
    /// - `UniqueViolation` on an email that is already registered
    pub async fn create(&self, actor: &Actor, request: &NewUser, password_hash: &str) -> DbResult<User> {
        let name = require_text(request.name.as_deref(), "name")?;
        let email = normalize_email(request.email.as_deref().unwrap_or_default())?;
        let role = request.role()?;
        let branch_id = optional_text(request.branch_id.as_deref()).or_else(|| actor.branch_id.clone());

        let mut tx = self.pool.begin().await?;

        if email_taken(&mut tx, &email, None).await? {
            return Err(DbError::duplicate("users.email"));
        }

        let id = new_id();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, branch_id, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(password_hash)
        .bind(&name)
        .bind(role)
        .bind(&branch_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateUser,
            Some("User"),
            Some(&id),
            json!({ "userName": name, "role": role }),
        )
        .await?;

        let user = fetch(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &id))?;
        tx.commit().await?;

        info!(user_id = %id, %role, "User created");
        Ok(user)
    }

    /// Partial update. A new password arrives already hashed.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        patch: UserPatch,
        password_hash: Option<String>,
    ) -> DbResult<User> {
        let role = patch.role()?;
        let email = patch
            .email
            .as_deref()
            .map(normalize_email)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        let mut user = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if let Some(email) = email {
            if email_taken(&mut tx, &email, Some(id)).await? {
                return Err(DbError::duplicate("users.email"));
            }
            user.email = email;
        }
        if let Some(name) = optional_text(patch.name.as_deref()) {
            user.name = name;
        }
        if let Some(role) = role {
            user.role = role;
        }
        if let Some(branch) = patch.branch_id {
            user.branch_id = optional_text(branch.as_deref());
        }
        if let Some(active) = patch.active {
            user.active = active;
        }

        sqlx::query(
            r#"
            UPDATE users SET
                email = ?2, name = ?3, role = ?4, branch_id = ?5, active = ?6,
                password_hash = COALESCE(?7, password_hash),
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.branch_id)
        .bind(user.active)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::UpdateUser,
            Some("User"),
            Some(id),
            json!({ "userName": user.name, "role": user.role }),
        )
        .await?;

        let updated = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;
        tx.commit().await?;

        debug!(user_id = %id, "User updated");
        Ok(updated)
    }

    /// Deactivates the account.
    pub async fn soft_delete(&self, actor: &Actor, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let user = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        sqlx::query("UPDATE users SET active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::DeleteUser,
            Some("User"),
            Some(id),
            json!({ "userName": user.name, "role": user.role }),
        )
        .await?;

        tx.commit().await?;
        info!(user_id = %id, "User deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{bootstrapped, TEST_HASH};
    use saori_core::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: Some("Vendedor Uno".to_string()),
            email: Some(email.to_string()),
            password: None,
            role: Some("vendedor".to_string()),
            branch_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_login_lookup() {
        let (db, admin) = bootstrapped().await;

        let user = db
            .users()
            .create(&admin, &new_user("ventas@saori.local"), TEST_HASH)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Vendedor);
        assert_eq!(user.branch_id, admin.branch_id);

        let creds = db
            .users()
            .find_credentials(" VENTAS@saori.local ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, TEST_HASH);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_without_audit() {
        let (db, admin) = bootstrapped().await;
        db.users()
            .create(&admin, &new_user("dup@saori.local"), TEST_HASH)
            .await
            .unwrap();

        let err = db
            .users()
            .create(&admin, &new_user("DUP@saori.local"), TEST_HASH)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(!err.is_retryable());
        assert_eq!(
            db.activity().count_action(ActivityAction::CreateUser).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_soft_delete_hides_user() {
        let (db, admin) = bootstrapped().await;
        let user = db
            .users()
            .create(&admin, &new_user("temp@saori.local"), TEST_HASH)
            .await
            .unwrap();

        db.users().soft_delete(&admin, &user.id).await.unwrap();

        assert!(db.users().find_credentials("temp@saori.local").await.unwrap().is_none());
        let listed = db.users().list(None).await.unwrap();
        assert!(listed.iter().all(|u| u.id != user.id));
        // still readable for history
        assert!(!db.users().get(&user.id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let (db, admin) = bootstrapped().await;
        let user = db
            .users()
            .create(&admin, &new_user("edit@saori.local"), TEST_HASH)
            .await
            .unwrap();

        let patch: UserPatch = serde_json::from_str(r#"{"role":"SUPERVISOR"}"#).unwrap();
        let updated = db
            .users()
            .update(&admin, &user.id, patch, Some("new-hash".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Supervisor);
        assert_eq!(updated.email, "edit@saori.local");
        assert_eq!(updated.branch_id, user.branch_id);

        let creds = db.users().find_credentials("edit@saori.local").await.unwrap().unwrap();
        assert_eq!(creds.password_hash, "new-hash");
    }
}
