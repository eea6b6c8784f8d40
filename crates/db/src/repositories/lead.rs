use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row};

use leadflow_core::domain::lead::{Lead, LeadId, LeadNote, LeadStatus, NoteId, Priority};

use super::{LeadFilters, LeadRepository, RepositoryError, SortOrder};
use crate::DbPool;

const LEAD_COLUMNS: &str = "id, supplier_id, name, contact_phone, contact_email, status, \
     no_answer_streak, priority, source_key, campaign_name, assigned_to, status_entered_at, \
     snooze_until, last_activity_note, last_activity_date, version, created_at";

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T, E: std::fmt::Display>(result: Result<T, E>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

fn parse_optional_datetime(raw: Option<String>) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    raw.map(|s| parse_datetime(&s)).transpose()
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let supplier_id: String = decode(row.try_get("supplier_id"))?;
    let name: Option<String> = decode(row.try_get("name"))?;
    let contact_phone: Option<String> = decode(row.try_get("contact_phone"))?;
    let contact_email: Option<String> = decode(row.try_get("contact_email"))?;
    let status_str: String = decode(row.try_get("status"))?;
    let no_answer_streak: i64 = decode(row.try_get("no_answer_streak"))?;
    let priority_str: String = decode(row.try_get("priority"))?;
    let source_key: Option<String> = decode(row.try_get("source_key"))?;
    let campaign_name: Option<String> = decode(row.try_get("campaign_name"))?;
    let assigned_to: Option<String> = decode(row.try_get("assigned_to"))?;
    let status_entered_at: String = decode(row.try_get("status_entered_at"))?;
    let snooze_until: Option<String> = decode(row.try_get("snooze_until"))?;
    let last_activity_note: Option<String> = decode(row.try_get("last_activity_note"))?;
    let last_activity_date: Option<String> = decode(row.try_get("last_activity_date"))?;
    let version: i64 = decode(row.try_get("version"))?;
    let created_at: String = decode(row.try_get("created_at"))?;

    Ok(Lead {
        id: LeadId(id),
        supplier_id,
        name,
        contact_phone,
        contact_email,
        status: decode(LeadStatus::from_str(&status_str))?,
        no_answer_streak: u32::try_from(no_answer_streak.max(0)).unwrap_or(0),
        priority: decode(Priority::from_str(&priority_str))?,
        source_key,
        campaign_name,
        assigned_to,
        status_entered_at: parse_datetime(&status_entered_at)?,
        snooze_until: parse_optional_datetime(snooze_until)?,
        last_activity_note,
        last_activity_date: parse_optional_datetime(last_activity_date)?,
        version,
        created_at: parse_datetime(&created_at)?,
    })
}

fn row_to_note(row: &sqlx::sqlite::SqliteRow) -> Result<LeadNote, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let lead_id: String = decode(row.try_get("lead_id"))?;
    let author: String = decode(row.try_get("author"))?;
    let text: String = decode(row.try_get("text"))?;
    let created_at: String = decode(row.try_get("created_at"))?;

    Ok(LeadNote {
        id: NoteId(id),
        lead_id: LeadId(lead_id),
        author,
        text,
        created_at: parse_datetime(&created_at)?,
    })
}

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_lead(r)?)),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        supplier_id: &str,
        filters: &LeadFilters,
    ) -> Result<Vec<Lead>, RepositoryError> {
        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {LEAD_COLUMNS} FROM lead WHERE supplier_id = "));
        builder.push_bind(supplier_id);

        if !filters.statuses.is_empty() {
            builder.push(" AND status IN (");
            {
                let mut statuses = builder.separated(", ");
                for status in &filters.statuses {
                    statuses.push_bind(status.as_str());
                }
            }
            builder.push(")");
        }

        if let Some(source) = &filters.source {
            builder.push(" AND source_key = ");
            builder.push_bind(source);
        }

        if let Some(search) = &filters.search {
            let like = format!("%{search}%");
            builder.push(" AND (name LIKE ");
            builder.push_bind(like.clone());
            builder.push(" OR contact_phone LIKE ");
            builder.push_bind(like.clone());
            builder.push(" OR contact_email LIKE ");
            builder.push_bind(like);
            builder.push(")");
        }

        builder.push(match filters.sort {
            SortOrder::CreatedAsc => " ORDER BY created_at ASC",
            SortOrder::CreatedDesc => " ORDER BY created_at DESC",
        });

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_lead).collect()
    }

    async fn insert(&self, lead: Lead) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO lead (id, supplier_id, name, contact_phone, contact_email, status, \
                               no_answer_streak, priority, source_key, campaign_name, assigned_to, \
                               status_entered_at, snooze_until, last_activity_note, \
                               last_activity_date, version, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&lead.id.0)
        .bind(&lead.supplier_id)
        .bind(&lead.name)
        .bind(&lead.contact_phone)
        .bind(&lead.contact_email)
        .bind(lead.status.as_str())
        .bind(i64::from(lead.no_answer_streak))
        .bind(lead.priority.as_str())
        .bind(&lead.source_key)
        .bind(&lead.campaign_name)
        .bind(&lead.assigned_to)
        .bind(lead.status_entered_at.to_rfc3339())
        .bind(lead.snooze_until.map(|dt| dt.to_rfc3339()))
        .bind(&lead.last_activity_note)
        .bind(lead.last_activity_date.map(|dt| dt.to_rfc3339()))
        .bind(lead.version)
        .bind(lead.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, lead: Lead, expected_version: i64) -> Result<Lead, RepositoryError> {
        let result = sqlx::query(
            "UPDATE lead SET name = ?, contact_phone = ?, contact_email = ?, status = ?, \
                             no_answer_streak = ?, priority = ?, source_key = ?, \
                             campaign_name = ?, assigned_to = ?, status_entered_at = ?, \
                             snooze_until = ?, last_activity_note = ?, last_activity_date = ?, \
                             version = version + 1 \
             WHERE id = ? AND version = ?",
        )
        .bind(&lead.name)
        .bind(&lead.contact_phone)
        .bind(&lead.contact_email)
        .bind(lead.status.as_str())
        .bind(i64::from(lead.no_answer_streak))
        .bind(lead.priority.as_str())
        .bind(&lead.source_key)
        .bind(&lead.campaign_name)
        .bind(&lead.assigned_to)
        .bind(lead.status_entered_at.to_rfc3339())
        .bind(lead.snooze_until.map(|dt| dt.to_rfc3339()))
        .bind(&lead.last_activity_note)
        .bind(lead.last_activity_date.map(|dt| dt.to_rfc3339()))
        .bind(&lead.id.0)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT version FROM lead WHERE id = ?")
                .bind(&lead.id.0)
                .fetch_optional(&self.pool)
                .await?;
            return match exists {
                Some(_) => Err(RepositoryError::VersionConflict),
                None => Err(RepositoryError::NotFound),
            };
        }

        Ok(Lead { version: expected_version + 1, ..lead })
    }

    async fn append_note(&self, note: LeadNote) -> Result<Lead, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead WHERE id = ?"))
            .bind(&note.lead_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let lead = match row {
            Some(ref r) => row_to_lead(r)?,
            None => return Err(RepositoryError::NotFound),
        };

        sqlx::query(
            "INSERT INTO lead_note (id, lead_id, author, text, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&note.id.0)
        .bind(&note.lead_id.0)
        .bind(&note.author)
        .bind(&note.text)
        .bind(note.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE lead SET last_activity_note = ?, last_activity_date = ?, \
                             version = version + 1 \
             WHERE id = ?",
        )
        .bind(&note.text)
        .bind(note.created_at.to_rfc3339())
        .bind(&note.lead_id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Lead {
            last_activity_note: Some(note.text),
            last_activity_date: Some(note.created_at),
            version: lead.version + 1,
            ..lead
        })
    }

    async fn list_notes(&self, lead_id: &LeadId) -> Result<Vec<LeadNote>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, lead_id, author, text, created_at FROM lead_note \
             WHERE lead_id = ? ORDER BY created_at ASC",
        )
        .bind(&lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_note).collect()
    }

    async fn delete(&self, id: &LeadId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM lead WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
