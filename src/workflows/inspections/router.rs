use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::approval::{ApprovalAction, ApprovalDecision, ApprovalError};
use super::domain::{Actor, ActorRole, InspectionDraft, InspectionId, UserId};
use super::repository::{DecisionNotifier, InspectionStore, RepositoryError, WorkflowDirectory};
use super::service::{InspectionService, InspectionServiceError};

/// Router builder exposing HTTP endpoints for submission and approval.
pub fn inspection_router<S, W, N>(service: Arc<InspectionService<S, W, N>>) -> Router
where
    S: InspectionStore + 'static,
    W: WorkflowDirectory + 'static,
    N: DecisionNotifier + 'static,
{
    Router::new()
        .route("/api/v1/inspections", post(submit_handler::<S, W, N>))
        .route(
            "/api/v1/inspections/:inspection_id",
            get(status_handler::<S, W, N>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/decisions",
            post(decision_handler::<S, W, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub approver_id: String,
    pub role: ActorRole,
    pub decision: ApprovalDecision,
    #[serde(default)]
    pub remarks: Option<String>,
}

pub(crate) async fn submit_handler<S, W, N>(
    State(service): State<Arc<InspectionService<S, W, N>>>,
    axum::Json(draft): axum::Json<InspectionDraft>,
) -> Response
where
    S: InspectionStore + 'static,
    W: WorkflowDirectory + 'static,
    N: DecisionNotifier + 'static,
{
    match service.submit(draft) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<S, W, N>(
    State(service): State<Arc<InspectionService<S, W, N>>>,
    Path(inspection_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    S: InspectionStore + 'static,
    W: WorkflowDirectory + 'static,
    N: DecisionNotifier + 'static,
{
    let actor = Actor {
        id: UserId(request.approver_id),
        role: request.role,
    };
    let action = ApprovalAction {
        decision: request.decision,
        remarks: request.remarks,
    };

    match service.record_decision(&InspectionId(inspection_id), &actor, action) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S, W, N>(
    State(service): State<Arc<InspectionService<S, W, N>>>,
    Path(inspection_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    W: WorkflowDirectory + 'static,
    N: DecisionNotifier + 'static,
{
    match service.get(&InspectionId(inspection_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: InspectionServiceError) -> Response {
    let status = match &error {
        InspectionServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        InspectionServiceError::Approval(approval) => match approval {
            ApprovalError::UnknownApprover(_) => StatusCode::FORBIDDEN,
            ApprovalError::OutOfTurn { .. } | ApprovalError::AlreadyDecided(_) => {
                StatusCode::CONFLICT
            }
        },
        InspectionServiceError::MissingCapability { .. } => StatusCode::FORBIDDEN,
        InspectionServiceError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
        InspectionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        InspectionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        InspectionServiceError::ConflictRetriesExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
        InspectionServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
