use async_trait::async_trait;
use thiserror::Error;

use leadflow_core::audit::AuditEntry;
use leadflow_core::domain::lead::{Lead, LeadId, LeadNote, LeadStatus};

pub mod audit;
pub mod lead;
pub mod memory;
pub mod orders;

pub use audit::SqlAuditLogRepository;
pub use lead::SqlLeadRepository;
pub use memory::{InMemoryAuditLogRepository, InMemoryLeadRepository, InMemoryOrderLinkRepository};
pub use orders::SqlOrderLinkRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("version conflict")]
    VersionConflict,
    #[error("not found")]
    NotFound,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    CreatedAsc,
    #[default]
    CreatedDesc,
}

/// Listing filters for the kanban board and search box.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadFilters {
    pub statuses: Vec<LeadStatus>,
    pub source: Option<String>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;

    async fn list(
        &self,
        supplier_id: &str,
        filters: &LeadFilters,
    ) -> Result<Vec<Lead>, RepositoryError>;

    async fn insert(&self, lead: Lead) -> Result<(), RepositoryError>;

    /// Compare-and-swap write: persists `lead`'s fields with
    /// `version = expected_version + 1` only if the stored version still
    /// equals `expected_version`. Nothing is written on a conflict.
    async fn save(&self, lead: Lead, expected_version: i64) -> Result<Lead, RepositoryError>;

    /// Insert the note and refresh the lead's denormalized
    /// `last_activity_*` fields (plus a version bump) in one transaction.
    async fn append_note(&self, note: LeadNote) -> Result<Lead, RepositoryError>;

    async fn list_notes(&self, lead_id: &LeadId) -> Result<Vec<LeadNote>, RepositoryError>;

    async fn delete(&self, id: &LeadId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<(), RepositoryError>;

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<AuditEntry>, RepositoryError>;
}

/// External order rows may reference a lead; deletion detaches them first.
#[async_trait]
pub trait OrderLinkRepository: Send + Sync {
    async fn count_references(&self, lead_id: &LeadId) -> Result<i64, RepositoryError>;

    async fn detach(&self, lead_id: &LeadId) -> Result<u64, RepositoryError>;
}
