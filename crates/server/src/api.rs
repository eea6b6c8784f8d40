//! JSON API surface. Handlers translate transport concerns and delegate to
//! the lead service; every mutating response carries the updated view so
//! callers can refresh their board without a second round trip.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use leadflow_core::audit::AuditEntry;
use leadflow_core::domain::lead::{LeadId, LeadNote, LeadStatus, NewLead};
use leadflow_core::errors::DomainError;
use leadflow_db::repositories::{LeadFilters, SortOrder};

use crate::service::{LeadService, LeadView, ServiceError};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<LeadService>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/suppliers/{supplier_id}/leads", get(list_leads).post(create_lead))
        .route("/api/leads/{id}", get(get_lead).delete(delete_lead))
        .route("/api/leads/{id}/status", post(change_status))
        .route("/api/leads/{id}/snooze", post(snooze))
        .route("/api/leads/{id}/notes", get(list_notes).post(add_note))
        .route("/api/leads/{id}/assign", post(assign))
        .route("/api/leads/{id}/quote-draft", post(create_quote_draft))
        .route("/api/leads/{id}/audit", get(list_audit))
        .with_state(state)
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_transitions: Option<Vec<LeadStatus>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody { error: message, allowed_transitions: None },
            ),
            Self::Service(error) => match &error {
                ServiceError::Domain(DomainError::InvalidTransition { allowed, .. }) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorBody {
                        error: error.to_string(),
                        allowed_transitions: Some(allowed.clone()),
                    },
                ),
                ServiceError::Domain(DomainError::TerminalLead { .. }) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorBody { error: error.to_string(), allowed_transitions: None },
                ),
                ServiceError::Domain(DomainError::InvariantViolation(_)) => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody { error: error.to_string(), allowed_transitions: None },
                ),
                ServiceError::NotFound => (
                    StatusCode::NOT_FOUND,
                    ErrorBody { error: error.to_string(), allowed_transitions: None },
                ),
                ServiceError::VersionConflict | ServiceError::Blocked { .. } => (
                    StatusCode::CONFLICT,
                    ErrorBody { error: error.to_string(), allowed_transitions: None },
                ),
                ServiceError::Downstream(_) => (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody { error: error.to_string(), allowed_transitions: None },
                ),
                ServiceError::Persistence(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody { error: error.to_string(), allowed_transitions: None },
                ),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    status: Option<String>,
    source: Option<String>,
    q: Option<String>,
    sort: Option<String>,
}

fn filters_from_query(query: ListQuery) -> Result<LeadFilters, ApiError> {
    let mut statuses = Vec::new();
    if let Some(raw) = query.status {
        for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let status = LeadStatus::from_str(part)
                .map_err(|_| ApiError::BadRequest(format!("unknown status filter `{part}`")))?;
            statuses.push(status);
        }
    }

    let sort = match query.sort.as_deref() {
        None => SortOrder::default(),
        Some("asc") => SortOrder::CreatedAsc,
        Some("desc") => SortOrder::CreatedDesc,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "unknown sort `{other}` (expected asc|desc)"
            )))
        }
    };

    Ok(LeadFilters { statuses, source: query.source, search: query.q, sort })
}

#[derive(Debug, Deserialize)]
struct CreateLeadRequest {
    actor: String,
    #[serde(flatten)]
    lead: NewLead,
}

#[derive(Debug, Deserialize)]
struct ChangeStatusRequest {
    requested_status: LeadStatus,
    expected_version: i64,
    actor: String,
}

#[derive(Debug, Deserialize)]
struct SnoozeRequest {
    minutes: i64,
    expected_version: i64,
    actor: String,
}

#[derive(Debug, Deserialize)]
struct NoteRequest {
    text: String,
    author: String,
}

#[derive(Debug, Deserialize)]
struct AssignRequest {
    assignee: Option<String>,
    expected_version: i64,
    actor: String,
}

#[derive(Debug, Deserialize)]
struct ActorRequest {
    actor: String,
}

#[derive(Debug, Serialize)]
struct DraftReceipt {
    quote_id: String,
}

async fn list_leads(
    State(state): State<ApiState>,
    Path(supplier_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LeadView>>, ApiError> {
    let filters = filters_from_query(query)?;
    let views = state.service.list_leads(&supplier_id, &filters).await?;
    Ok(Json(views))
}

async fn create_lead(
    State(state): State<ApiState>,
    Path(supplier_id): Path<String>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<LeadView>), ApiError> {
    let view = state.service.create_lead(&supplier_id, request.lead, &request.actor).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_lead(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<LeadView>, ApiError> {
    let view = state.service.get_lead(&LeadId(id)).await?;
    Ok(Json(view))
}

async fn change_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<LeadView>, ApiError> {
    let view = state
        .service
        .change_status(
            &LeadId(id),
            request.requested_status,
            request.expected_version,
            &request.actor,
        )
        .await?;
    Ok(Json(view))
}

async fn snooze(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<SnoozeRequest>,
) -> Result<Json<LeadView>, ApiError> {
    let view = state
        .service
        .snooze(
            &LeadId(id),
            Duration::minutes(request.minutes),
            request.expected_version,
            &request.actor,
        )
        .await?;
    Ok(Json(view))
}

async fn add_note(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<NoteRequest>,
) -> Result<Json<LeadView>, ApiError> {
    let view = state.service.add_note(&LeadId(id), &request.author, &request.text).await?;
    Ok(Json(view))
}

async fn list_notes(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LeadNote>>, ApiError> {
    let notes = state.service.list_notes(&LeadId(id)).await?;
    Ok(Json(notes))
}

async fn assign(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<LeadView>, ApiError> {
    let view = state
        .service
        .assign(&LeadId(id), request.assignee, request.expected_version, &request.actor)
        .await?;
    Ok(Json(view))
}

async fn create_quote_draft(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<DraftReceipt>, ApiError> {
    let quote_id = state.service.create_quote_draft(&LeadId(id), &request.actor).await?;
    Ok(Json(DraftReceipt { quote_id: quote_id.0 }))
}

async fn delete_lead(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_lead(&LeadId(id), &request.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_audit(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let entries = state.service.list_audit(&LeadId(id)).await?;
    Ok(Json(entries))
}
