//! Status transition rules and the no-answer escalation plan.
//!
//! `validate` enforces the transition table; `plan` additionally computes the
//! streak bookkeeping and the automatic `no_answer_x5` override so callers
//! apply one deterministic outcome per request.

use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadStatus;
use crate::errors::DomainError;

/// Consecutive unanswered attempts that trip the escalation override.
pub const ESCALATION_THRESHOLD: u32 = 5;

/// Targets a caller may request from `current`. `NoAnswerX5` never appears:
/// it is produced by the escalation rule only.
pub fn allowed_targets(current: LeadStatus) -> &'static [LeadStatus] {
    use LeadStatus::{
        DeniesContact, Error, Followup, NoAnswer, NotRelevant, ProjectCompleted,
        ProjectInProgress,
    };

    match current {
        LeadStatus::New => {
            &[NoAnswer, Followup, NotRelevant, Error, DeniesContact, ProjectInProgress]
        }
        LeadStatus::NoAnswer | LeadStatus::NoAnswerX5 => {
            &[NoAnswer, Followup, NotRelevant, Error, DeniesContact, ProjectInProgress]
        }
        LeadStatus::Followup => {
            &[NoAnswer, NotRelevant, Error, DeniesContact, ProjectInProgress]
        }
        LeadStatus::ProjectInProgress => &[ProjectCompleted],
        LeadStatus::NotRelevant
        | LeadStatus::Error
        | LeadStatus::DeniesContact
        | LeadStatus::ProjectCompleted => &[],
    }
}

pub fn validate(current: LeadStatus, requested: LeadStatus) -> Result<(), DomainError> {
    if requested != LeadStatus::NoAnswerX5 && allowed_targets(current).contains(&requested) {
        return Ok(());
    }

    Err(DomainError::InvalidTransition {
        from: current,
        to: requested,
        allowed: allowed_targets(current).to_vec(),
    })
}

/// The resolved effect of one accepted status change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPlan {
    pub from: LeadStatus,
    pub to: LeadStatus,
    pub streak: u32,
    pub escalated: bool,
}

/// Validate `requested` and fold in the streak rules: entering `no_answer`
/// from `new`/`no_answer`/`no_answer_x5` increments the streak, entering it
/// from anywhere else resets it, and hitting the threshold overrides the
/// result to `no_answer_x5` with the streak cleared. Any other accepted
/// transition clears the streak.
pub fn plan(
    current: LeadStatus,
    streak: u32,
    requested: LeadStatus,
) -> Result<TransitionPlan, DomainError> {
    validate(current, requested)?;

    if requested != LeadStatus::NoAnswer {
        return Ok(TransitionPlan { from: current, to: requested, streak: 0, escalated: false });
    }

    let next_streak = match current {
        LeadStatus::New | LeadStatus::NoAnswer | LeadStatus::NoAnswerX5 => streak + 1,
        _ => 0,
    };

    if next_streak >= ESCALATION_THRESHOLD {
        return Ok(TransitionPlan {
            from: current,
            to: LeadStatus::NoAnswerX5,
            streak: 0,
            escalated: true,
        });
    }

    Ok(TransitionPlan { from: current, to: LeadStatus::NoAnswer, streak: next_streak, escalated: false })
}
