//! # Lead Repository
//!
//! The CRM pipeline. Leads are hard-deleted.

use chrono::{DateTime, Duration, Utc};
use saori_core::activity::ActivityAction;
use saori_core::inputs::{LeadPatch, LeadQuery, NewLead, ReminderQuery};
use saori_core::models::Lead;
use saori_core::validation::{optional_text, require_text, validate_price, validate_search_query};
use saori_core::{Actor, CoreError, ValidationError};
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::DbResult;
use crate::repository::{activity, like_pattern, new_id};

const SELECT_LEAD: &str = r#"
    SELECT l.id, l.name, l.company, l.email, l.phone, l.source, l.status,
           l.estimated_value_cents, l.notes, l.next_follow_up_at, l.assigned_to_id,
           u.name AS assigned_to_name, l.created_at, l.updated_at
    FROM leads l
    LEFT JOIN users u ON u.id = l.assigned_to_id
"#;

async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Lead> {
    let lead: Option<Lead> = sqlx::query_as(&format!("{SELECT_LEAD} WHERE l.id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    lead.ok_or_else(|| CoreError::not_found("Lead", id).into())
}

async fn ensure_user(conn: &mut SqliteConnection, user_id: Option<&str>) -> DbResult<()> {
    let Some(id) = user_id else {
        return Ok(());
    };
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1")
        .bind(id)
        .fetch_one(conn)
        .await?;
    if n == 0 {
        return Err(CoreError::not_found("User", id).into());
    }
    Ok(())
}

async fn save(conn: &mut SqliteConnection, lead: &Lead) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE leads
        SET name = ?2, company = ?3, email = ?4, phone = ?5, source = ?6, status = ?7,
            estimated_value_cents = ?8, notes = ?9, next_follow_up_at = ?10,
            assigned_to_id = ?11, updated_at = ?12
        WHERE id = ?1
        "#,
    )
    .bind(&lead.id)
    .bind(&lead.name)
    .bind(&lead.company)
    .bind(&lead.email)
    .bind(&lead.phone)
    .bind(&lead.source)
    .bind(lead.status)
    .bind(lead.estimated_value_cents)
    .bind(&lead.notes)
    .bind(lead.next_follow_up_at)
    .bind(&lead.assigned_to_id)
    .bind(lead.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LeadRepository {
    pool: SqlitePool,
}

impl LeadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LeadRepository { pool }
    }

    /// Leads grouped by status, most recently touched first.
    pub async fn list(&self, query: &LeadQuery) -> DbResult<Vec<Lead>> {
        let status = query.status()?;
        let pattern = validate_search_query(query.search.as_deref())?.map(|s| like_pattern(&s));

        let leads = sqlx::query_as(&format!(
            r#"{SELECT_LEAD}
            WHERE (?1 IS NULL OR l.status = ?1)
              AND (?2 IS NULL OR l.name LIKE ?2 OR l.company LIKE ?2
                   OR l.email LIKE ?2 OR l.phone LIKE ?2)
            ORDER BY l.status ASC, l.updated_at DESC"#
        ))
        .bind(status)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(leads)
    }

    /// Open leads with a follow-up due within `days` from now, soonest
    /// first. Overdue follow-ups are included.
    ///
    /// `days` must be within `0..=ReminderQuery::MAX_DAYS`.
    pub async fn reminders(&self, days: i64) -> DbResult<Vec<Lead>> {
        if !(0..=ReminderQuery::MAX_DAYS).contains(&days) {
            return Err(ValidationError::OutOfRange {
                field: "days".to_string(),
                min: 0,
                max: ReminderQuery::MAX_DAYS,
            }
            .into());
        }
        let horizon = Duration::try_days(days)
            .and_then(|span| Utc::now().checked_add_signed(span))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "days".to_string(),
                reason: "horizon out of range".to_string(),
            })?;
        self.reminders_until(horizon).await
    }

    async fn reminders_until(&self, horizon: DateTime<Utc>) -> DbResult<Vec<Lead>> {
        let leads = sqlx::query_as(&format!(
            r#"{SELECT_LEAD}
            WHERE l.next_follow_up_at IS NOT NULL
              AND l.next_follow_up_at <= ?1
              AND l.status NOT IN ('WON', 'LOST')
            ORDER BY l.next_follow_up_at ASC"#
        ))
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;
        Ok(leads)
    }

    /// Creates a lead assigned to `assignedToId`, or to the actor.
    pub async fn create(&self, actor: &Actor, request: NewLead) -> DbResult<Lead> {
        let name = require_text(request.name.as_deref(), "name")?;
        let status = request.status()?;
        let next_follow_up_at = request.next_follow_up_at()?;
        if let Some(value) = request.estimated_value_cents {
            validate_price(value, "estimatedValueCents")?;
        }
        let assigned_to_id =
            optional_text(request.assigned_to_id.as_deref()).unwrap_or_else(|| actor.user_id.clone());

        let mut tx = self.pool.begin().await?;

        ensure_user(&mut tx, Some(&assigned_to_id)).await?;

        let id = new_id();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, name, company, email, phone, source, status, estimated_value_cents,
                notes, next_follow_up_at, assigned_to_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
        )
        .bind(&id)
        .bind(&name)
        .bind(optional_text(request.company.as_deref()))
        .bind(optional_text(request.email.as_deref()))
        .bind(optional_text(request.phone.as_deref()))
        .bind(optional_text(request.source.as_deref()))
        .bind(status)
        .bind(request.estimated_value_cents)
        .bind(optional_text(request.notes.as_deref()))
        .bind(next_follow_up_at)
        .bind(&assigned_to_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::CreateLead,
            Some("Lead"),
            Some(&id),
            json!({ "name": name, "status": status }),
        )
        .await?;

        let lead = fetch(&mut tx, &id).await?;
        tx.commit().await?;

        info!(lead_id = %id, %status, "Lead created");
        Ok(lead)
    }

    /// Partial update; a status must be one of the five pipeline stages.
    pub async fn update(&self, actor: &Actor, id: &str, patch: LeadPatch) -> DbResult<Lead> {
        let mut tx = self.pool.begin().await?;

        let mut lead = fetch(&mut tx, id).await?;
        patch.apply_to(&mut lead)?;
        ensure_user(&mut tx, lead.assigned_to_id.as_deref()).await?;
        lead.updated_at = Utc::now();
        save(&mut tx, &lead).await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::UpdateLead,
            Some("Lead"),
            Some(id),
            json!({ "status": lead.status }),
        )
        .await?;

        let updated = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let lead = fetch(&mut tx, id).await?;
        sqlx::query("DELETE FROM leads WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        activity::record(
            &mut tx,
            &actor.user_id,
            ActivityAction::DeleteLead,
            Some("Lead"),
            Some(id),
            json!({ "name": lead.name }),
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
    use saori_core::LeadStatus;

    fn new_lead(name: &str, status: Option<&str>, follow_up: Option<DateTime<Utc>>) -> NewLead {
        NewLead {
            name: Some(name.to_string()),
            company: Some("Corporativo".to_string()),
            status: status.map(str::to_string),
            estimated_value_cents: Some(15_000_000),
            next_follow_up_at: follow_up.map(|ts| ts.to_rfc3339()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (db, actor) = bootstrapped().await;
        let lead = db.leads().create(&actor, new_lead("Santa Fe", None, None)).await.unwrap();
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.assigned_to_id.as_deref(), Some(actor.user_id.as_str()));
        assert_eq!(lead.assigned_to_name.as_deref(), Some("Admin"));

        let err = db
            .leads()
            .create(&actor, new_lead("Bad", Some("MAYBE"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let mut unknown = new_lead("Ghost", None, None);
        unknown.assigned_to_id = Some("nobody".to_string());
        let err = db.leads().create(&actor, unknown).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_reminders_skip_closed_and_far_leads() {
        let (db, actor) = bootstrapped().await;
        let now = Utc::now();
        db.leads()
            .create(&actor, new_lead("Soon", Some("CONTACTED"), Some(now + Duration::days(2))))
            .await
            .unwrap();
        db.leads()
            .create(&actor, new_lead("Overdue", None, Some(now - Duration::days(1))))
            .await
            .unwrap();
        db.leads()
            .create(&actor, new_lead("Far", None, Some(now + Duration::days(30))))
            .await
            .unwrap();
        db.leads()
            .create(&actor, new_lead("Won", Some("won"), Some(now + Duration::days(1))))
            .await
            .unwrap();
        db.leads().create(&actor, new_lead("Undated", None, None)).await.unwrap();

        let due = db.leads().reminders(7).await.unwrap();
        let names: Vec<&str> = due.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Overdue", "Soon"]);
    }

    #[tokio::test]
    async fn test_reminders_reject_out_of_range_horizon() {
        let (db, _) = bootstrapped().await;
        for days in [-1, ReminderQuery::MAX_DAYS + 1, 100_000_000, i64::MAX] {
            let err = db.leads().reminders(days).await.unwrap_err();
            assert!(
                matches!(err, DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))),
                "days = {days}"
            );
        }
        assert!(db.leads().reminders(ReminderQuery::MAX_DAYS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (db, actor) = bootstrapped().await;
        let lead = db.leads().create(&actor, new_lead("Santa Fe", None, None)).await.unwrap();

        let patch: LeadPatch =
            serde_json::from_str(r#"{"status":"negotiation","company":null}"#).unwrap();
        let updated = db.leads().update(&actor, &lead.id, patch).await.unwrap();
        assert_eq!(updated.status, LeadStatus::Negotiation);
        assert!(updated.company.is_none());

        let bad: LeadPatch = serde_json::from_str(r#"{"status":"CLOSED"}"#).unwrap();
        let err = db.leads().update(&actor, &lead.id, bad).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let filtered = LeadQuery {
            status: Some("NEGOTIATION".to_string()),
            search: Some("santa".to_string()),
        };
        assert_eq!(db.leads().list(&filtered).await.unwrap().len(), 1);

        db.leads().delete(&actor, &lead.id).await.unwrap();
        assert!(db.leads().list(&LeadQuery::default()).await.unwrap().is_empty());
        let err = db.leads().delete(&actor, &lead.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotFound { .. })));
    }
}
