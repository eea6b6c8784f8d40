pub mod assignment;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod sla;
pub mod transitions;

pub use assignment::AssignmentRouter;
pub use audit::{AuditEntry, ChangeKind};
pub use domain::lead::{Lead, LeadId, LeadNote, LeadStatus, NewLead, NoteId, Priority};
pub use errors::DomainError;
pub use sla::{SlaBadge, SlaPolicy, SlaPolicySet, SlaState};
pub use transitions::{TransitionPlan, ESCALATION_THRESHOLD};
