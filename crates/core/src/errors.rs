use thiserror::Error;

use crate::domain::lead::LeadStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid lead transition from {from:?} to {to:?}")]
    InvalidTransition { from: LeadStatus, to: LeadStatus, allowed: Vec<LeadStatus> },
    #[error("lead is in terminal status {status:?}")]
    TerminalLead { status: LeadStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
