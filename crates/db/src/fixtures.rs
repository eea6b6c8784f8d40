//! Deterministic demo dataset for local development and smoke checks.

use chrono::{Duration, Utc};

use leadflow_core::domain::lead::{Lead, LeadId, LeadNote, LeadStatus, Priority};

use crate::repositories::{LeadRepository, RepositoryError, SqlLeadRepository};
use crate::DbPool;

struct SeedLead {
    id: &'static str,
    supplier_id: &'static str,
    name: &'static str,
    contact_phone: &'static str,
    status: LeadStatus,
    no_answer_streak: u32,
    priority: Priority,
    source_key: &'static str,
    campaign_name: &'static str,
    assigned_to: Option<&'static str>,
    minutes_in_status: i64,
    note: Option<&'static str>,
}

const SEED_LEADS: &[SeedLead] = &[
    SeedLead {
        id: "lead-demo-001",
        supplier_id: "sup-demo-001",
        name: "Avi Cohen",
        contact_phone: "052-5550101",
        status: LeadStatus::New,
        no_answer_streak: 0,
        priority: Priority::High,
        source_key: "site_form",
        campaign_name: "kitchen-renovations",
        assigned_to: None,
        minutes_in_status: 30,
        note: None,
    },
    SeedLead {
        id: "lead-demo-002",
        supplier_id: "sup-demo-001",
        name: "Batya Levi",
        contact_phone: "052-5550102",
        status: LeadStatus::NoAnswer,
        no_answer_streak: 2,
        priority: Priority::Medium,
        source_key: "phone_call",
        campaign_name: "kitchen-renovations",
        assigned_to: Some("u-demo-sales"),
        minutes_in_status: 600,
        note: Some("tried twice, voicemail both times"),
    },
    SeedLead {
        id: "lead-demo-003",
        supplier_id: "sup-demo-001",
        name: "Carmel Dahan",
        contact_phone: "052-5550103",
        status: LeadStatus::Followup,
        no_answer_streak: 0,
        priority: Priority::Vip,
        source_key: "referral",
        campaign_name: "bathroom-upgrades",
        assigned_to: Some("u-demo-sales"),
        minutes_in_status: 3_000,
        note: Some("asked for a revised quote after the holidays"),
    },
    SeedLead {
        id: "lead-demo-004",
        supplier_id: "sup-demo-001",
        name: "Dana Peretz",
        contact_phone: "052-5550104",
        status: LeadStatus::ProjectInProgress,
        no_answer_streak: 0,
        priority: Priority::Medium,
        source_key: "site_form",
        campaign_name: "bathroom-upgrades",
        assigned_to: Some("u-demo-owner"),
        minutes_in_status: 10_000,
        note: None,
    },
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub leads_inserted: usize,
    pub notes_inserted: usize,
}

/// Insert the demo dataset. Leads that already exist (by id) are skipped so
/// reseeding stays idempotent.
pub async fn seed(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let repo = SqlLeadRepository::new(pool.clone());
    let now = Utc::now();
    let mut result = SeedResult::default();

    for contract in SEED_LEADS {
        let id = LeadId(contract.id.to_string());
        if repo.find_by_id(&id).await?.is_some() {
            continue;
        }

        let entered = now - Duration::minutes(contract.minutes_in_status);
        let lead = Lead {
            id: id.clone(),
            supplier_id: contract.supplier_id.to_string(),
            name: Some(contract.name.to_string()),
            contact_phone: Some(contract.contact_phone.to_string()),
            contact_email: None,
            status: contract.status,
            no_answer_streak: contract.no_answer_streak,
            priority: contract.priority,
            source_key: Some(contract.source_key.to_string()),
            campaign_name: Some(contract.campaign_name.to_string()),
            assigned_to: contract.assigned_to.map(str::to_string),
            status_entered_at: entered,
            snooze_until: None,
            last_activity_note: None,
            last_activity_date: None,
            version: 1,
            created_at: entered,
        };
        repo.insert(lead).await?;
        result.leads_inserted += 1;

        if let Some(text) = contract.note {
            repo.append_note(LeadNote::new(id, "seed", text, now)).await?;
            result.notes_inserted += 1;
        }
    }

    Ok(result)
}
