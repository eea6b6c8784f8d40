use crate::domain::lead::Lead;
use crate::errors::DomainError;

/// Resolves lead ownership. Authorization of *who* may be assigned is an
/// upstream concern; the router only decides the initial owner and guards
/// terminal leads against reassignment.
#[derive(Clone, Debug, Default)]
pub struct AssignmentRouter {
    auto_assign_to: Option<String>,
}

impl AssignmentRouter {
    pub fn new(auto_assign_to: Option<String>) -> Self {
        Self { auto_assign_to }
    }

    /// An explicit request wins; otherwise the configured default, if any.
    pub fn initial_assignee(&self, requested: Option<String>) -> Option<String> {
        requested.or_else(|| self.auto_assign_to.clone())
    }

    pub fn validate_reassignment(&self, lead: &Lead) -> Result<(), DomainError> {
        if lead.is_terminal() {
            return Err(DomainError::TerminalLead { status: lead.status });
        }
        Ok(())
    }
}
