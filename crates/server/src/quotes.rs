//! Quote-drafting collaborator. Fire-and-report: the engine forwards the
//! collaborator's answer or its failure verbatim and never retries.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use leadflow_core::config::QuoteDraftConfig;
use leadflow_core::domain::lead::Lead;

/// The contact and provenance context handed to the drafting service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeadSnapshot {
    pub lead_id: String,
    pub supplier_id: String,
    pub name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub source_key: Option<String>,
    pub campaign_name: Option<String>,
}

impl From<&Lead> for LeadSnapshot {
    fn from(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id.0.clone(),
            supplier_id: lead.supplier_id.clone(),
            name: lead.name.clone(),
            contact_phone: lead.contact_phone.clone(),
            contact_email: lead.contact_email.clone(),
            source_key: lead.source_key.clone(),
            campaign_name: lead.campaign_name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDraftId(pub String);

#[derive(Debug, Error)]
pub enum QuoteDraftError {
    #[error("quote drafting is not configured")]
    Disabled,
    #[error("quote draft request failed: {0}")]
    Transport(String),
    #[error("quote draft rejected with status {status}")]
    Rejected { status: u16 },
}

#[async_trait]
pub trait QuoteDrafter: Send + Sync {
    async fn create_draft(&self, snapshot: LeadSnapshot) -> Result<QuoteDraftId, QuoteDraftError>;
}

/// Stands in when `[quotes]` is disabled; callers get a typed failure
/// instead of a silent no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledQuoteDrafter;

#[async_trait]
impl QuoteDrafter for DisabledQuoteDrafter {
    async fn create_draft(&self, _snapshot: LeadSnapshot) -> Result<QuoteDraftId, QuoteDraftError> {
        Err(QuoteDraftError::Disabled)
    }
}

pub struct HttpQuoteDrafter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    quote_id: String,
}

impl HttpQuoteDrafter {
    pub fn from_config(config: &QuoteDraftConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let base_url = config.base_url.clone()?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .ok()?;

        Some(Self { client, base_url, api_key: config.api_key.clone() })
    }
}

#[async_trait]
impl QuoteDrafter for HttpQuoteDrafter {
    async fn create_draft(&self, snapshot: LeadSnapshot) -> Result<QuoteDraftId, QuoteDraftError> {
        let url = format!("{}/drafts", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&snapshot);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response =
            request.send().await.map_err(|e| QuoteDraftError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuoteDraftError::Rejected { status: response.status().as_u16() });
        }

        let body: DraftResponse =
            response.json().await.map_err(|e| QuoteDraftError::Transport(e.to_string()))?;
        Ok(QuoteDraftId(body.quote_id))
    }
}
