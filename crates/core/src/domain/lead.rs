use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(pub String);

impl NoteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Lifecycle states of a lead. `NoAnswerX5` is only ever produced by the
/// escalation rule, never requested directly.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    NoAnswer,
    Followup,
    NoAnswerX5,
    NotRelevant,
    Error,
    DeniesContact,
    ProjectInProgress,
    ProjectCompleted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::NoAnswer => "no_answer",
            Self::Followup => "followup",
            Self::NoAnswerX5 => "no_answer_x5",
            Self::NotRelevant => "not_relevant",
            Self::Error => "error",
            Self::DeniesContact => "denies_contact",
            Self::ProjectInProgress => "project_in_progress",
            Self::ProjectCompleted => "project_completed",
        }
    }

    /// Terminal leads accept note appends only: no status change, no
    /// reassignment, no snooze.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NotRelevant | Self::Error | Self::DeniesContact | Self::ProjectCompleted
        )
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "no_answer" => Ok(Self::NoAnswer),
            "followup" => Ok(Self::Followup),
            "no_answer_x5" => Ok(Self::NoAnswerX5),
            "not_relevant" => Ok(Self::NotRelevant),
            "error" => Ok(Self::Error),
            "denies_contact" => Ok(Self::DeniesContact),
            "project_in_progress" => Ok(Self::ProjectInProgress),
            "project_completed" => Ok(Self::ProjectCompleted),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown lead status `{other}`"
            ))),
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Vip,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vip => "vip",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vip" => Ok(Self::Vip),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown priority `{other}`"
            ))),
        }
    }
}

/// One inbound sales opportunity owned by one supplier.
///
/// `version` is the optimistic-concurrency counter: it increments by exactly
/// one on every successful mutation, and mutating callers must present the
/// version they last observed. `status_entered_at` anchors the SLA clock and
/// moves only on status changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub supplier_id: String,
    pub name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub status: LeadStatus,
    pub no_answer_streak: u32,
    pub priority: Priority,
    pub source_key: Option<String>,
    pub campaign_name: Option<String>,
    pub assigned_to: Option<String>,
    pub status_entered_at: DateTime<Utc>,
    pub snooze_until: Option<DateTime<Utc>>,
    pub last_activity_note: Option<String>,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for lead creation; everything else is derived.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub source_key: Option<String>,
    pub campaign_name: Option<String>,
    pub assigned_to: Option<String>,
}

impl Lead {
    pub fn create(
        supplier_id: impl Into<String>,
        details: NewLead,
        assigned_to: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let supplier_id = supplier_id.into();
        if supplier_id.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "supplier_id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            id: LeadId::generate(),
            supplier_id,
            name: details.name,
            contact_phone: details.contact_phone,
            contact_email: details.contact_email,
            status: LeadStatus::New,
            no_answer_streak: 0,
            priority: details.priority,
            source_key: details.source_key,
            campaign_name: details.campaign_name,
            assigned_to,
            status_entered_at: now,
            snooze_until: None,
            last_activity_note: None,
            last_activity_date: None,
            version: 1,
            created_at: now,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Append-only annotation on a lead. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeadNote {
    pub id: NoteId,
    pub lead_id: LeadId,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl LeadNote {
    pub fn new(
        lead_id: LeadId,
        author: impl Into<String>,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self { id: NoteId::generate(), lead_id, author: author.into(), text: text.into(), created_at: now }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Lead, LeadStatus, NewLead, Priority};

    #[test]
    fn creation_starts_in_new_at_version_one() {
        let now = Utc::now();
        let lead = Lead::create(
            "sup-1",
            NewLead { name: Some("Dana Peretz".to_owned()), ..NewLead::default() },
            None,
            now,
        )
        .expect("create lead");

        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.version, 1);
        assert_eq!(lead.no_answer_streak, 0);
        assert_eq!(lead.status_entered_at, now);
        assert_eq!(lead.priority, Priority::Medium);
        assert!(lead.snooze_until.is_none());
    }

    #[test]
    fn creation_rejects_blank_supplier() {
        let error = Lead::create("   ", NewLead::default(), None, Utc::now())
            .expect_err("blank supplier must fail");
        assert!(error.to_string().contains("supplier_id"));
    }

    #[test]
    fn terminal_statuses_are_the_four_closed_states() {
        for status in [
            LeadStatus::NotRelevant,
            LeadStatus::Error,
            LeadStatus::DeniesContact,
            LeadStatus::ProjectCompleted,
        ] {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
        for status in [
            LeadStatus::New,
            LeadStatus::NoAnswer,
            LeadStatus::Followup,
            LeadStatus::NoAnswerX5,
            LeadStatus::ProjectInProgress,
        ] {
            assert!(!status.is_terminal(), "{status} should be open");
        }
    }

    #[test]
    fn status_strings_round_trip_through_parse() {
        let status: LeadStatus = "no_answer_x5".parse().expect("parse");
        assert_eq!(status, LeadStatus::NoAnswerX5);
        assert_eq!(status.as_str(), "no_answer_x5");
        assert!("paused".parse::<LeadStatus>().is_err());
    }
}
