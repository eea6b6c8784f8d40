use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::Row;

use leadflow_core::audit::{AuditEntry, ChangeKind};
use leadflow_core::domain::lead::LeadId;

use super::{AuditLogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAuditLogRepository {
    pool: DbPool,
}

impl SqlAuditLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEntry, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let lead_id: String =
        row.try_get("lead_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let actor: String = row.try_get("actor").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let change_kind: String =
        row.try_get("change_kind").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let old_value: Option<String> =
        row.try_get("old_value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let new_value: Option<String> =
        row.try_get("new_value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let at: String = row.try_get("at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(AuditEntry {
        id,
        lead_id: LeadId(lead_id),
        actor,
        change_kind: ChangeKind::from_str(&change_kind)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        old_value,
        new_value,
        at: DateTime::parse_from_rfc3339(&at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{at}`: {e}")))?,
    })
}

#[async_trait::async_trait]
impl AuditLogRepository for SqlAuditLogRepository {
    async fn append(&self, entry: AuditEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO audit_entry (id, lead_id, actor, change_kind, old_value, new_value, at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.lead_id.0)
        .bind(&entry.actor)
        .bind(entry.change_kind.as_str())
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(entry.at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, lead_id, actor, change_kind, old_value, new_value, at \
             FROM audit_entry WHERE lead_id = ? ORDER BY at ASC",
        )
        .bind(&lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}
