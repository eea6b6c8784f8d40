use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::lead::LeadId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Status,
    Assignment,
    Snooze,
    Note,
    Deletion,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Assignment => "assignment",
            Self::Snooze => "snooze",
            Self::Note => "note",
            Self::Deletion => "deletion",
        }
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "assignment" => Ok(Self::Assignment),
            "snooze" => Ok(Self::Snooze),
            "note" => Ok(Self::Note),
            "deletion" => Ok(Self::Deletion),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown audit change kind `{other}`"
            ))),
        }
    }
}

/// Append-only record of one lead change. Entries are never updated or
/// deleted and survive lead deletion, so `status_entered_at` disputes can be
/// settled from history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub lead_id: LeadId,
    pub actor: String,
    pub change_kind: ChangeKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        lead_id: LeadId,
        actor: impl Into<String>,
        change_kind: ChangeKind,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lead_id,
            actor: actor.into(),
            change_kind,
            old_value,
            new_value,
            at: Utc::now(),
        }
    }
}
