use std::collections::HashMap;

use tokio::sync::RwLock;

use leadflow_core::audit::AuditEntry;
use leadflow_core::domain::lead::{Lead, LeadId, LeadNote};

use super::{
    AuditLogRepository, LeadFilters, LeadRepository, OrderLinkRepository, RepositoryError,
    SortOrder,
};

/// Test double mirroring `SqlLeadRepository` semantics, including the
/// compare-and-swap on `version`.
#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<HashMap<String, Lead>>,
    notes: RwLock<Vec<LeadNote>>,
}

fn matches_search(lead: &Lead, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let haystacks = [&lead.name, &lead.contact_phone, &lead.contact_email];
    haystacks
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
}

#[async_trait::async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.get(&id.0).cloned())
    }

    async fn list(
        &self,
        supplier_id: &str,
        filters: &LeadFilters,
    ) -> Result<Vec<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        let mut matched: Vec<Lead> = leads
            .values()
            .filter(|lead| lead.supplier_id == supplier_id)
            .filter(|lead| filters.statuses.is_empty() || filters.statuses.contains(&lead.status))
            .filter(|lead| {
                filters.source.as_ref().map_or(true, |source| lead.source_key.as_ref() == Some(source))
            })
            .filter(|lead| {
                filters.search.as_ref().map_or(true, |needle| matches_search(lead, needle))
            })
            .cloned()
            .collect();

        match filters.sort {
            SortOrder::CreatedAsc => matched.sort_by_key(|lead| lead.created_at),
            SortOrder::CreatedDesc => {
                matched.sort_by_key(|lead| std::cmp::Reverse(lead.created_at))
            }
        }
        Ok(matched)
    }

    async fn insert(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut leads = self.leads.write().await;
        leads.insert(lead.id.0.clone(), lead);
        Ok(())
    }

    async fn save(&self, lead: Lead, expected_version: i64) -> Result<Lead, RepositoryError> {
        let mut leads = self.leads.write().await;
        let stored = leads.get(&lead.id.0).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::VersionConflict);
        }

        let updated = Lead { version: expected_version + 1, ..lead };
        leads.insert(updated.id.0.clone(), updated.clone());
        Ok(updated)
    }

    async fn append_note(&self, note: LeadNote) -> Result<Lead, RepositoryError> {
        let mut leads = self.leads.write().await;
        let stored = leads.get_mut(&note.lead_id.0).ok_or(RepositoryError::NotFound)?;

        stored.last_activity_note = Some(note.text.clone());
        stored.last_activity_date = Some(note.created_at);
        stored.version += 1;
        let updated = stored.clone();

        let mut notes = self.notes.write().await;
        notes.push(note);
        Ok(updated)
    }

    async fn list_notes(&self, lead_id: &LeadId) -> Result<Vec<LeadNote>, RepositoryError> {
        let notes = self.notes.read().await;
        let mut matched: Vec<LeadNote> =
            notes.iter().filter(|note| &note.lead_id == lead_id).cloned().collect();
        matched.sort_by_key(|note| note.created_at);
        Ok(matched)
    }

    async fn delete(&self, id: &LeadId) -> Result<(), RepositoryError> {
        let mut leads = self.leads.write().await;
        if leads.remove(&id.0).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let mut notes = self.notes.write().await;
        notes.retain(|note| &note.lead_id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAuditLogRepository {
    entries: RwLock<Vec<AuditEntry>>,
}

#[async_trait::async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, entry: AuditEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn list_for_lead(&self, lead_id: &LeadId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|entry| &entry.lead_id == lead_id).cloned().collect())
    }
}

/// Order rows keyed by order id, holding an optional lead reference.
#[derive(Default)]
pub struct InMemoryOrderLinkRepository {
    orders: RwLock<HashMap<String, Option<String>>>,
}

impl InMemoryOrderLinkRepository {
    pub async fn attach(&self, order_id: impl Into<String>, lead_id: &LeadId) {
        let mut orders = self.orders.write().await;
        orders.insert(order_id.into(), Some(lead_id.0.clone()));
    }
}

#[async_trait::async_trait]
impl OrderLinkRepository for InMemoryOrderLinkRepository {
    async fn count_references(&self, lead_id: &LeadId) -> Result<i64, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.values().filter(|reference| reference.as_deref() == Some(&lead_id.0)).count()
            as i64)
    }

    async fn detach(&self, lead_id: &LeadId) -> Result<u64, RepositoryError> {
        let mut orders = self.orders.write().await;
        let mut detached = 0;
        for reference in orders.values_mut() {
            if reference.as_deref() == Some(&lead_id.0) {
                *reference = None;
                detached += 1;
            }
        }
        Ok(detached)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use leadflow_core::domain::lead::{Lead, LeadNote, LeadStatus, NewLead};

    use crate::repositories::{
        InMemoryLeadRepository, InMemoryOrderLinkRepository, LeadFilters, LeadRepository,
        OrderLinkRepository, RepositoryError,
    };

    fn lead(supplier: &str, name: &str) -> Lead {
        Lead::create(
            supplier,
            NewLead { name: Some(name.to_string()), ..NewLead::default() },
            None,
            Utc::now(),
        )
        .expect("create lead")
    }

    #[tokio::test]
    async fn cas_save_matches_the_sql_contract() {
        let repo = InMemoryLeadRepository::default();
        let lead = lead("sup-1", "Avi");
        repo.insert(lead.clone()).await.expect("insert");

        let mut update = lead.clone();
        update.status = LeadStatus::NoAnswer;
        let saved = repo.save(update.clone(), 1).await.expect("save");
        assert_eq!(saved.version, 2);

        let error = repo.save(update, 1).await.expect_err("stale version");
        assert!(matches!(error, RepositoryError::VersionConflict));
    }

    #[tokio::test]
    async fn note_append_bumps_version_and_denormalized_fields() {
        let repo = InMemoryLeadRepository::default();
        let lead = lead("sup-1", "Avi");
        repo.insert(lead.clone()).await.expect("insert");

        let note = LeadNote::new(lead.id.clone(), "user-1", "called twice", Utc::now());
        let updated = repo.append_note(note).await.expect("append");

        assert_eq!(updated.version, 2);
        assert_eq!(updated.last_activity_note.as_deref(), Some("called twice"));
        assert_eq!(repo.list_notes(&lead.id).await.expect("notes").len(), 1);
    }

    #[tokio::test]
    async fn filters_match_the_sql_repository_behavior() {
        let repo = InMemoryLeadRepository::default();
        let mut a = lead("sup-1", "Avi Cohen");
        a.status = LeadStatus::NoAnswer;
        let b = lead("sup-1", "Batya Levi");
        repo.insert(a.clone()).await.expect("insert a");
        repo.insert(b).await.expect("insert b");

        let filtered = repo
            .list(
                "sup-1",
                &LeadFilters {
                    statuses: vec![LeadStatus::NoAnswer],
                    search: Some("avi".to_string()),
                    ..LeadFilters::default()
                },
            )
            .await
            .expect("list");

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, a.id);
    }

    #[tokio::test]
    async fn order_links_detach_without_losing_rows() {
        let repo = InMemoryLeadRepository::default();
        let lead = lead("sup-1", "Avi");
        repo.insert(lead.clone()).await.expect("insert");

        let orders = InMemoryOrderLinkRepository::default();
        orders.attach("ord-1", &lead.id).await;
        orders.attach("ord-2", &lead.id).await;

        assert_eq!(orders.count_references(&lead.id).await.expect("count"), 2);
        assert_eq!(orders.detach(&lead.id).await.expect("detach"), 2);
        assert_eq!(orders.count_references(&lead.id).await.expect("recount"), 0);
    }
}
