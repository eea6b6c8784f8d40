//! Lead service orchestration: every mutation loads the current lead, runs
//! the pure domain checks, persists through the compare-and-swap store, and
//! appends an audit entry. Conflicts are surfaced, never retried.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use leadflow_core::assignment::AssignmentRouter;
use leadflow_core::audit::{AuditEntry, ChangeKind};
use leadflow_core::domain::lead::{Lead, LeadId, LeadNote, LeadStatus, NewLead};
use leadflow_core::errors::DomainError;
use leadflow_core::sla::{self, SlaPolicySet, SlaState};
use leadflow_core::transitions;
use leadflow_db::repositories::{
    AuditLogRepository, LeadFilters, LeadRepository, OrderLinkRepository, RepositoryError,
};

use crate::quotes::{LeadSnapshot, QuoteDraftId, QuoteDrafter};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("lead not found")]
    NotFound,
    #[error("lead was updated concurrently")]
    VersionConflict,
    #[error("operation blocked: {reason}")]
    Blocked { reason: String },
    #[error("downstream collaborator failed: {0}")]
    Downstream(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(e) => Self::Persistence(e.to_string()),
            RepositoryError::Decode(e) => Self::Persistence(e),
            RepositoryError::VersionConflict => Self::VersionConflict,
            RepositoryError::NotFound => Self::NotFound,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlaView {
    pub state: SlaState,
    pub remaining_secs: Option<i64>,
}

/// Lead fields plus everything the board derives on read: the SLA badge and
/// the statuses a caller may request next.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeadView {
    #[serde(flatten)]
    pub lead: Lead,
    pub sla: SlaView,
    pub allowed_transitions: Vec<LeadStatus>,
}

pub struct LeadService {
    leads: Arc<dyn LeadRepository>,
    audit: Arc<dyn AuditLogRepository>,
    orders: Arc<dyn OrderLinkRepository>,
    drafter: Arc<dyn QuoteDrafter>,
    router: AssignmentRouter,
    policies: SlaPolicySet,
}

impl LeadService {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        audit: Arc<dyn AuditLogRepository>,
        orders: Arc<dyn OrderLinkRepository>,
        drafter: Arc<dyn QuoteDrafter>,
        router: AssignmentRouter,
        policies: SlaPolicySet,
    ) -> Self {
        Self { leads, audit, orders, drafter, router, policies }
    }

    fn view(&self, lead: Lead) -> LeadView {
        let badge = sla::evaluate(&lead, &self.policies, Utc::now());
        LeadView {
            allowed_transitions: transitions::allowed_targets(lead.status).to_vec(),
            sla: SlaView {
                state: badge.state,
                remaining_secs: badge.remaining.map(|d| d.num_seconds()),
            },
            lead,
        }
    }

    async fn load(&self, id: &LeadId) -> Result<Lead, ServiceError> {
        self.leads.find_by_id(id).await?.ok_or(ServiceError::NotFound)
    }

    pub async fn create_lead(
        &self,
        supplier_id: &str,
        mut details: NewLead,
        actor: &str,
    ) -> Result<LeadView, ServiceError> {
        let requested_assignee = details.assigned_to.take();
        let assignee = self.router.initial_assignee(requested_assignee);
        let lead = Lead::create(supplier_id, details, assignee.clone(), Utc::now())?;

        self.leads.insert(lead.clone()).await?;
        if let Some(assignee) = &assignee {
            self.audit
                .append(AuditEntry::new(
                    lead.id.clone(),
                    actor,
                    ChangeKind::Assignment,
                    None,
                    Some(assignee.clone()),
                ))
                .await?;
        }

        info!(
            event_name = "lead.created",
            lead_id = %lead.id,
            supplier_id = %lead.supplier_id,
            actor = %actor,
            "lead created"
        );
        Ok(self.view(lead))
    }

    pub async fn get_lead(&self, id: &LeadId) -> Result<LeadView, ServiceError> {
        let lead = self.load(id).await?;
        Ok(self.view(lead))
    }

    pub async fn list_leads(
        &self,
        supplier_id: &str,
        filters: &LeadFilters,
    ) -> Result<Vec<LeadView>, ServiceError> {
        let leads = self.leads.list(supplier_id, filters).await?;
        Ok(leads.into_iter().map(|lead| self.view(lead)).collect())
    }

    /// Apply one status change. The escalation override and streak
    /// bookkeeping come from the transition plan; the SLA anchor moves and
    /// any snooze is cleared.
    pub async fn change_status(
        &self,
        id: &LeadId,
        requested: LeadStatus,
        expected_version: i64,
        actor: &str,
    ) -> Result<LeadView, ServiceError> {
        let lead = self.load(id).await?;
        let plan = transitions::plan(lead.status, lead.no_answer_streak, requested)?;

        let mut updated = lead.clone();
        updated.status = plan.to;
        updated.no_answer_streak = plan.streak;
        updated.status_entered_at = Utc::now();
        updated.snooze_until = None;

        let saved = self.leads.save(updated, expected_version).await?;
        self.audit
            .append(AuditEntry::new(
                saved.id.clone(),
                actor,
                ChangeKind::Status,
                Some(plan.from.as_str().to_string()),
                Some(plan.to.as_str().to_string()),
            ))
            .await?;

        info!(
            event_name = "lead.status_changed",
            lead_id = %saved.id,
            from = plan.from.as_str(),
            to = plan.to.as_str(),
            escalated = plan.escalated,
            actor = %actor,
            "lead status changed"
        );
        Ok(self.view(saved))
    }

    /// Pause the SLA clock until `now + duration`. Status and its anchor
    /// stay untouched.
    pub async fn snooze(
        &self,
        id: &LeadId,
        duration: Duration,
        expected_version: i64,
        actor: &str,
    ) -> Result<LeadView, ServiceError> {
        if duration <= Duration::zero() {
            return Err(DomainError::InvariantViolation(
                "snooze duration must be positive".to_owned(),
            )
            .into());
        }

        let lead = self.load(id).await?;
        if lead.is_terminal() {
            return Err(DomainError::TerminalLead { status: lead.status }.into());
        }

        let old_value = lead.snooze_until.map(|dt| dt.to_rfc3339());
        let mut updated = lead;
        updated.snooze_until = Some(Utc::now() + duration);

        let saved = self.leads.save(updated, expected_version).await?;
        self.audit
            .append(AuditEntry::new(
                saved.id.clone(),
                actor,
                ChangeKind::Snooze,
                old_value,
                saved.snooze_until.map(|dt| dt.to_rfc3339()),
            ))
            .await?;

        Ok(self.view(saved))
    }

    /// Append-only, so no expected version: the note insert and the
    /// denormalized `last_activity_*` refresh commit together.
    pub async fn add_note(
        &self,
        id: &LeadId,
        author: &str,
        text: &str,
    ) -> Result<LeadView, ServiceError> {
        if text.trim().is_empty() {
            return Err(
                DomainError::InvariantViolation("note text must not be empty".to_owned()).into()
            );
        }

        let note = LeadNote::new(id.clone(), author, text, Utc::now());
        let saved = self.leads.append_note(note.clone()).await?;
        self.audit
            .append(AuditEntry::new(
                saved.id.clone(),
                author,
                ChangeKind::Note,
                None,
                Some(note.id.0.clone()),
            ))
            .await?;

        Ok(self.view(saved))
    }

    pub async fn list_notes(&self, id: &LeadId) -> Result<Vec<LeadNote>, ServiceError> {
        self.load(id).await?;
        Ok(self.leads.list_notes(id).await?)
    }

    /// Reassign (or unassign with `None`). The SLA clock does not move.
    pub async fn assign(
        &self,
        id: &LeadId,
        assignee: Option<String>,
        expected_version: i64,
        actor: &str,
    ) -> Result<LeadView, ServiceError> {
        let lead = self.load(id).await?;
        self.router.validate_reassignment(&lead)?;

        let old_value = lead.assigned_to.clone();
        let mut updated = lead;
        updated.assigned_to = assignee.clone();

        let saved = self.leads.save(updated, expected_version).await?;
        self.audit
            .append(AuditEntry::new(
                saved.id.clone(),
                actor,
                ChangeKind::Assignment,
                old_value,
                assignee,
            ))
            .await?;

        Ok(self.view(saved))
    }

    /// Forward a draft request to the quote collaborator. No retry and no
    /// lead mutation, whatever the outcome.
    pub async fn create_quote_draft(
        &self,
        id: &LeadId,
        actor: &str,
    ) -> Result<QuoteDraftId, ServiceError> {
        let lead = self.load(id).await?;

        match self.drafter.create_draft(LeadSnapshot::from(&lead)).await {
            Ok(quote_id) => {
                info!(
                    event_name = "lead.quote_draft_created",
                    lead_id = %lead.id,
                    quote_id = %quote_id.0,
                    actor = %actor,
                    "quote draft created"
                );
                Ok(quote_id)
            }
            Err(error) => {
                warn!(
                    event_name = "lead.quote_draft_failed",
                    lead_id = %lead.id,
                    actor = %actor,
                    error = %error,
                    "quote draft request failed"
                );
                Err(ServiceError::Downstream(error.to_string()))
            }
        }
    }

    /// Hard delete with auto-detach: order rows referencing the lead get
    /// their reference cleared before the lead and its notes are removed.
    pub async fn delete_lead(&self, id: &LeadId, actor: &str) -> Result<(), ServiceError> {
        let lead = self.load(id).await?;

        let references = self.orders.count_references(id).await?;
        if references > 0 {
            let detached = self.orders.detach(id).await?;
            warn!(
                event_name = "lead.references_detached",
                lead_id = %id,
                detached,
                actor = %actor,
                "order references detached before deletion"
            );
        }

        self.leads.delete(id).await?;
        self.audit
            .append(AuditEntry::new(
                id.clone(),
                actor,
                ChangeKind::Deletion,
                Some(lead.status.as_str().to_string()),
                None,
            ))
            .await?;

        info!(event_name = "lead.deleted", lead_id = %id, actor = %actor, "lead deleted");
        Ok(())
    }

    pub async fn list_audit(&self, id: &LeadId) -> Result<Vec<AuditEntry>, ServiceError> {
        Ok(self.audit.list_for_lead(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use leadflow_core::assignment::AssignmentRouter;
    use leadflow_core::audit::ChangeKind;
    use leadflow_core::domain::lead::{LeadId, LeadStatus, NewLead};
    use leadflow_core::errors::DomainError;
    use leadflow_core::sla::{SlaPolicySet, SlaState};
    use leadflow_db::repositories::{
        AuditLogRepository, InMemoryAuditLogRepository, InMemoryLeadRepository,
        InMemoryOrderLinkRepository, LeadFilters, LeadRepository,
    };

    use crate::quotes::{LeadSnapshot, QuoteDraftError, QuoteDraftId, QuoteDrafter};
    use crate::service::{LeadService, ServiceError};

    #[derive(Default)]
    struct RecordingQuoteDrafter {
        calls: Mutex<Vec<LeadSnapshot>>,
        fail: bool,
    }

    impl RecordingQuoteDrafter {
        fn failing() -> Self {
            Self { calls: Mutex::new(Vec::new()), fail: true }
        }

        fn calls(&self) -> Vec<LeadSnapshot> {
            self.calls.lock().expect("drafter lock").clone()
        }
    }

    #[async_trait]
    impl QuoteDrafter for RecordingQuoteDrafter {
        async fn create_draft(
            &self,
            snapshot: LeadSnapshot,
        ) -> Result<QuoteDraftId, QuoteDraftError> {
            self.calls.lock().expect("drafter lock").push(snapshot);
            if self.fail {
                return Err(QuoteDraftError::Transport("connection refused".to_owned()));
            }
            Ok(QuoteDraftId("QD-0001".to_owned()))
        }
    }

    struct Harness {
        service: LeadService,
        leads: Arc<InMemoryLeadRepository>,
        audit: Arc<InMemoryAuditLogRepository>,
        orders: Arc<InMemoryOrderLinkRepository>,
        drafter: Arc<RecordingQuoteDrafter>,
    }

    fn harness_with(router: AssignmentRouter, drafter: RecordingQuoteDrafter) -> Harness {
        let leads = Arc::new(InMemoryLeadRepository::default());
        let audit = Arc::new(InMemoryAuditLogRepository::default());
        let orders = Arc::new(InMemoryOrderLinkRepository::default());
        let drafter = Arc::new(drafter);

        let service = LeadService::new(
            leads.clone(),
            audit.clone(),
            orders.clone(),
            drafter.clone(),
            router,
            SlaPolicySet::default(),
        );
        Harness { service, leads, audit, orders, drafter }
    }

    fn harness() -> Harness {
        harness_with(AssignmentRouter::default(), RecordingQuoteDrafter::default())
    }

    async fn created_lead(harness: &Harness) -> LeadId {
        harness
            .service
            .create_lead(
                "sup-1",
                NewLead { name: Some("Avi Cohen".to_owned()), ..NewLead::default() },
                "user-1",
            )
            .await
            .expect("create lead")
            .lead
            .id
    }

    #[tokio::test]
    async fn five_no_answers_escalate_and_clear_the_streak() {
        let harness = harness();
        let id = created_lead(&harness).await;

        let mut version = 1;
        let mut view = None;
        for _ in 0..5 {
            let updated = harness
                .service
                .change_status(&id, LeadStatus::NoAnswer, version, "user-1")
                .await
                .expect("no_answer attempt");
            version = updated.lead.version;
            view = Some(updated);
        }

        let view = view.expect("final view");
        assert_eq!(view.lead.status, LeadStatus::NoAnswerX5);
        assert_eq!(view.lead.no_answer_streak, 0);
        assert_eq!(view.lead.version, 6);

        // Streak invariant holds on the stored row too.
        let stored = harness.leads.find_by_id(&id).await.expect("find").expect("exists");
        assert_eq!(stored.no_answer_streak, 0);

        let entries = harness.audit.list_for_lead(&id).await.expect("audit");
        let status_entries: Vec<_> =
            entries.iter().filter(|e| e.change_kind == ChangeKind::Status).collect();
        assert_eq!(status_entries.len(), 5);
        assert_eq!(status_entries[4].new_value.as_deref(), Some("no_answer_x5"));
    }

    #[tokio::test]
    async fn change_status_resets_the_sla_anchor_and_clears_snooze() {
        let harness = harness();
        let id = created_lead(&harness).await;

        harness
            .service
            .snooze(&id, Duration::hours(2), 1, "user-1")
            .await
            .expect("snooze");

        let view = harness
            .service
            .change_status(&id, LeadStatus::Followup, 2, "user-1")
            .await
            .expect("change status");

        assert_eq!(view.lead.status, LeadStatus::Followup);
        assert!(view.lead.snooze_until.is_none());
        assert!(Utc::now() - view.lead.status_entered_at < Duration::seconds(5));
        assert_eq!(view.sla.state, SlaState::Ok);
    }

    #[tokio::test]
    async fn terminal_leads_reject_status_changes_with_the_allowed_set() {
        let harness = harness();
        let id = created_lead(&harness).await;
        harness
            .service
            .change_status(&id, LeadStatus::NotRelevant, 1, "user-1")
            .await
            .expect("close lead");

        let error = harness
            .service
            .change_status(&id, LeadStatus::Followup, 2, "user-1")
            .await
            .expect_err("terminal must reject");

        match error {
            ServiceError::Domain(DomainError::InvalidTransition { allowed, .. }) => {
                assert!(allowed.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_writers_race_on_the_version_counter() {
        let harness = harness();
        let id = created_lead(&harness).await;

        // Move the lead to version 3 so both callers observe it there.
        harness
            .service
            .change_status(&id, LeadStatus::NoAnswer, 1, "user-1")
            .await
            .expect("to no_answer");
        harness
            .service
            .change_status(&id, LeadStatus::Followup, 2, "user-1")
            .await
            .expect("to followup");

        let assigned = harness
            .service
            .assign(&id, Some("u1".to_owned()), 3, "caller-a")
            .await
            .expect("caller A wins");
        assert_eq!(assigned.lead.version, 4);

        let error = harness
            .service
            .change_status(&id, LeadStatus::NoAnswer, 3, "caller-b")
            .await
            .expect_err("caller B must conflict");
        assert!(matches!(error, ServiceError::VersionConflict));

        // B's write left no trace.
        let stored = harness.leads.find_by_id(&id).await.expect("find").expect("exists");
        assert_eq!(stored.status, LeadStatus::Followup);
        assert_eq!(stored.assigned_to.as_deref(), Some("u1"));
        assert_eq!(stored.version, 4);
    }

    #[tokio::test]
    async fn snooze_pauses_the_clock_without_touching_the_anchor() {
        let harness = harness();
        let id = created_lead(&harness).await;
        let before = harness.service.get_lead(&id).await.expect("view");

        let view = harness
            .service
            .snooze(&id, Duration::hours(2), 1, "user-1")
            .await
            .expect("snooze");

        assert_eq!(view.lead.status, LeadStatus::New);
        assert_eq!(view.lead.status_entered_at, before.lead.status_entered_at);
        assert!(view.lead.snooze_until.expect("snooze set") > Utc::now());
        assert_eq!(view.sla.state, SlaState::Ok);
        assert_eq!(view.lead.version, 2);

        let entries = harness.audit.list_for_lead(&id).await.expect("audit");
        assert!(entries.iter().any(|e| e.change_kind == ChangeKind::Snooze));
    }

    #[tokio::test]
    async fn snooze_rejects_terminal_leads_and_bad_durations() {
        let harness = harness();
        let id = created_lead(&harness).await;

        let error = harness
            .service
            .snooze(&id, Duration::zero(), 1, "user-1")
            .await
            .expect_err("zero duration");
        assert!(matches!(error, ServiceError::Domain(DomainError::InvariantViolation(_))));

        harness
            .service
            .change_status(&id, LeadStatus::DeniesContact, 1, "user-1")
            .await
            .expect("close lead");

        let error = harness
            .service
            .snooze(&id, Duration::hours(1), 2, "user-1")
            .await
            .expect_err("terminal lead");
        assert!(matches!(
            error,
            ServiceError::Domain(DomainError::TerminalLead { status: LeadStatus::DeniesContact })
        ));
    }

    #[tokio::test]
    async fn notes_are_appended_with_denormalized_fields_and_audit() {
        let harness = harness();
        let id = created_lead(&harness).await;

        let view = harness
            .service
            .add_note(&id, "user-2", "asked to call back on Sunday")
            .await
            .expect("add note");

        assert_eq!(view.lead.last_activity_note.as_deref(), Some("asked to call back on Sunday"));
        assert!(view.lead.last_activity_date.is_some());
        assert_eq!(view.lead.version, 2);

        let notes = harness.service.list_notes(&id).await.expect("notes");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].author, "user-2");

        let entries = harness.audit.list_for_lead(&id).await.expect("audit");
        assert!(entries.iter().any(|e| e.change_kind == ChangeKind::Note));

        let error =
            harness.service.add_note(&id, "user-2", "   ").await.expect_err("blank note");
        assert!(matches!(error, ServiceError::Domain(DomainError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn notes_remain_allowed_on_terminal_leads() {
        let harness = harness();
        let id = created_lead(&harness).await;
        harness
            .service
            .change_status(&id, LeadStatus::ProjectInProgress, 1, "user-1")
            .await
            .expect("start project");
        harness
            .service
            .change_status(&id, LeadStatus::ProjectCompleted, 2, "user-1")
            .await
            .expect("complete project");

        let view = harness
            .service
            .add_note(&id, "user-1", "final invoice sent")
            .await
            .expect("terminal leads still take notes");
        assert_eq!(view.lead.status, LeadStatus::ProjectCompleted);
        assert_eq!(view.sla.state, SlaState::NotApplicable);
    }

    #[tokio::test]
    async fn assignment_round_trips_and_respects_terminal_leads() {
        let harness = harness();
        let id = created_lead(&harness).await;

        let assigned = harness
            .service
            .assign(&id, Some("u-7".to_owned()), 1, "user-1")
            .await
            .expect("assign");
        assert_eq!(assigned.lead.assigned_to.as_deref(), Some("u-7"));

        let unassigned =
            harness.service.assign(&id, None, 2, "user-1").await.expect("unassign");
        assert_eq!(unassigned.lead.assigned_to, None);

        harness
            .service
            .change_status(&id, LeadStatus::NotRelevant, 3, "user-1")
            .await
            .expect("close lead");
        let error = harness
            .service
            .assign(&id, Some("u-8".to_owned()), 4, "user-1")
            .await
            .expect_err("terminal lead");
        assert!(matches!(error, ServiceError::Domain(DomainError::TerminalLead { .. })));
    }

    #[tokio::test]
    async fn assignment_does_not_touch_the_sla_anchor() {
        let harness = harness();
        let id = created_lead(&harness).await;
        let before = harness.service.get_lead(&id).await.expect("view");

        let after = harness
            .service
            .assign(&id, Some("u-7".to_owned()), 1, "user-1")
            .await
            .expect("assign");

        assert_eq!(after.lead.status_entered_at, before.lead.status_entered_at);
    }

    #[tokio::test]
    async fn creation_uses_the_configured_auto_assignee() {
        let harness = harness_with(
            AssignmentRouter::new(Some("u-dispatch".to_owned())),
            RecordingQuoteDrafter::default(),
        );

        let view = harness
            .service
            .create_lead("sup-1", NewLead::default(), "ingest")
            .await
            .expect("create");
        assert_eq!(view.lead.assigned_to.as_deref(), Some("u-dispatch"));

        let entries = harness.audit.list_for_lead(&view.lead.id).await.expect("audit");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].change_kind, ChangeKind::Assignment);
        assert_eq!(entries[0].new_value.as_deref(), Some("u-dispatch"));
    }

    #[tokio::test]
    async fn quote_draft_forwards_the_collaborator_result() {
        let harness = harness();
        let id = created_lead(&harness).await;

        let quote_id =
            harness.service.create_quote_draft(&id, "user-1").await.expect("draft created");
        assert_eq!(quote_id.0, "QD-0001");

        let calls = harness.drafter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].lead_id, id.0);
    }

    #[tokio::test]
    async fn quote_draft_failure_is_surfaced_without_mutating_the_lead() {
        let harness =
            harness_with(AssignmentRouter::default(), RecordingQuoteDrafter::failing());
        let id = created_lead(&harness).await;

        let error =
            harness.service.create_quote_draft(&id, "user-1").await.expect_err("must fail");
        assert!(matches!(error, ServiceError::Downstream(_)));

        let stored = harness.leads.find_by_id(&id).await.expect("find").expect("exists");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn deletion_detaches_order_references_first() {
        let harness = harness();
        let id = created_lead(&harness).await;
        harness.orders.attach("ord-1", &id).await;
        harness.orders.attach("ord-2", &id).await;

        harness.service.delete_lead(&id, "user-1").await.expect("delete");

        assert!(harness.leads.find_by_id(&id).await.expect("find").is_none());
        let entries = harness.audit.list_for_lead(&id).await.expect("audit");
        assert!(entries.iter().any(|e| e.change_kind == ChangeKind::Deletion));

        let error =
            harness.service.delete_lead(&id, "user-1").await.expect_err("already gone");
        assert!(matches!(error, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn listing_returns_views_with_badges_and_allowed_sets() {
        let harness = harness();
        let id = created_lead(&harness).await;
        harness
            .service
            .change_status(&id, LeadStatus::NoAnswer, 1, "user-1")
            .await
            .expect("to no_answer");

        let views =
            harness.service.list_leads("sup-1", &LeadFilters::default()).await.expect("list");
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].lead.status, LeadStatus::NoAnswer);
        assert_eq!(views[0].sla.state, SlaState::Ok);
        assert!(views[0].allowed_transitions.contains(&LeadStatus::Followup));
        assert!(!views[0].allowed_transitions.contains(&LeadStatus::NoAnswerX5));

        let missing = harness.service.get_lead(&LeadId("missing".to_owned())).await;
        assert!(matches!(missing, Err(ServiceError::NotFound)));
    }
}
