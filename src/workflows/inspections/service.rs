use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::{debug, info, warn};

use super::approval::{self, ApprovalAction, ApprovalError, Transition};
use super::domain::{
    Actor, Capability, InspectionDraft, InspectionId, InspectionStatus, WorkflowId,
};
use super::evaluation;
use super::frequency;
use super::intake::{self, ValidationError};
use super::repository::{
    DecisionNotice, DecisionNotifier, InspectionRecord, InspectionStore, RepositoryError,
    WorkflowDirectory,
};

const DEFAULT_MAX_DECISION_RETRIES: u32 = 3;

static INSPECTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_inspection_id() -> InspectionId {
    let id = INSPECTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InspectionId(format!("insp-{id:06}"))
}

/// Service composing the intake guard, rule evaluator, frequency tracker, and
/// approval state machine over the storage seams.
pub struct InspectionService<S, W, N> {
    store: Arc<S>,
    workflows: Arc<W>,
    notifier: Arc<N>,
    max_decision_retries: u32,
}

impl<S, W, N> InspectionService<S, W, N>
where
    S: InspectionStore + 'static,
    W: WorkflowDirectory + 'static,
    N: DecisionNotifier + 'static,
{
    pub fn new(store: Arc<S>, workflows: Arc<W>, notifier: Arc<N>) -> Self {
        Self::with_retry_limit(store, workflows, notifier, DEFAULT_MAX_DECISION_RETRIES)
    }

    pub fn with_retry_limit(
        store: Arc<S>,
        workflows: Arc<W>,
        notifier: Arc<N>,
        max_decision_retries: u32,
    ) -> Self {
        Self {
            store,
            workflows,
            notifier,
            max_decision_retries: max_decision_retries.max(1),
        }
    }

    /// Submit a filled inspection and run the auto-approval decision exactly
    /// once, against the workflow configuration as it exists right now.
    pub fn submit(
        &self,
        draft: InspectionDraft,
    ) -> Result<InspectionRecord, InspectionServiceError> {
        let workflow = self
            .workflows
            .fetch(&draft.workflow_id)?
            .ok_or_else(|| InspectionServiceError::WorkflowNotFound(draft.workflow_id.clone()))?;

        intake::validate_draft(&draft, &workflow)?;

        let evaluation = evaluation::evaluate(workflow.auto_approval.as_ref(), &draft);
        let auto_approve = if evaluation.accepted() {
            self.frequency_allows(&workflow, &draft)?
        } else {
            debug!(
                verdict = ?evaluation.verdict,
                "rule did not qualify the draft, routing to manual approval"
            );
            false
        };

        let status = if auto_approve {
            InspectionStatus::AutoApproved
        } else {
            InspectionStatus::Pending
        };

        let record = InspectionRecord {
            id: next_inspection_id(),
            workflow_id: draft.workflow_id.clone(),
            assigned_to: draft.assigned_to.clone(),
            approvers: intake::initial_slots(&draft),
            consensus: workflow.consensus,
            status,
            auto_approved: auto_approve,
            meter_reading: draft.meter_reading,
            reading_date: draft.reading_date,
            inspection_date: draft.inspection_date,
            filled_steps: draft.filled_steps,
            created_at: Utc::now(),
            version: 0,
        };

        let stored = self.store.insert(record)?;
        info!(
            inspection = %stored.id.0,
            workflow = %stored.workflow_id.0,
            status = stored.status.label(),
            "inspection submitted"
        );

        if stored.status.is_terminal() {
            self.notify(&stored);
        }

        Ok(stored)
    }

    /// Record one approver's decision, atomically against the version read.
    ///
    /// The fetch, transition, and versioned update form one read-modify-write
    /// cycle; a version conflict retries the whole cycle up to the configured
    /// bound. Caller errors (unknown approver, out of turn, missing
    /// capability) surface immediately and are never retried.
    pub fn record_decision(
        &self,
        inspection_id: &InspectionId,
        actor: &Actor,
        action: ApprovalAction,
    ) -> Result<InspectionRecord, InspectionServiceError> {
        if !actor.role.can(Capability::RecordDecision) {
            return Err(InspectionServiceError::MissingCapability {
                actor: actor.id.0.clone(),
                capability: Capability::RecordDecision,
            });
        }
        let override_order = actor.role.can(Capability::OverrideOrder);

        let mut attempts = 0;
        loop {
            let record = self
                .store
                .fetch(inspection_id)?
                .ok_or(RepositoryError::NotFound)?;
            let read_version = record.version;

            let decided_at = Local::now().naive_local();
            match approval::apply_decision(&record, &actor.id, &action, decided_at, override_order)?
            {
                Transition::AlreadyResolved(frozen) => {
                    debug!(
                        inspection = %frozen.id.0,
                        status = frozen.status.label(),
                        "decision arrived after terminal state, returning frozen record"
                    );
                    return Ok(frozen);
                }
                Transition::Applied(updated) => match self.store.update(updated, read_version) {
                    Ok(stored) => {
                        info!(
                            inspection = %stored.id.0,
                            approver = %actor.id.0,
                            status = stored.status.label(),
                            "approver decision recorded"
                        );
                        if stored.status.is_terminal() {
                            self.notify(&stored);
                        }
                        return Ok(stored);
                    }
                    Err(RepositoryError::VersionConflict) => {
                        attempts += 1;
                        if attempts >= self.max_decision_retries {
                            warn!(
                                inspection = %inspection_id.0,
                                attempts,
                                "concurrent updates exhausted the retry budget"
                            );
                            return Err(InspectionServiceError::ConflictRetriesExhausted(
                                attempts,
                            ));
                        }
                        debug!(
                            inspection = %inspection_id.0,
                            attempt = attempts,
                            "version conflict, retrying decision cycle"
                        );
                    }
                    Err(other) => return Err(other.into()),
                },
            }
        }
    }

    /// Fetch an inspection for status views.
    pub fn get(
        &self,
        inspection_id: &InspectionId,
    ) -> Result<InspectionRecord, InspectionServiceError> {
        let record = self
            .store
            .fetch(inspection_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn frequency_allows(
        &self,
        workflow: &super::domain::WorkflowConfig,
        draft: &InspectionDraft,
    ) -> Result<bool, InspectionServiceError> {
        let Some(rule) = workflow.auto_approval.as_ref() else {
            return Ok(false);
        };
        let Some(limit) = rule.frequency_limit else {
            return Ok(true);
        };

        let count = frequency::count_recent(
            self.store.as_ref(),
            &draft.assigned_to,
            &draft.workflow_id,
            rule.frequency_period,
            draft.inspection_date,
        )?;
        if count >= u64::from(limit) {
            info!(
                workflow = %draft.workflow_id.0,
                assignee = %draft.assigned_to.0,
                count,
                limit,
                "frequency cap engaged, overriding passing rule"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Publish the terminal notice. The record is already committed at this
    /// point; a publish failure is logged and never fails the caller.
    fn notify(&self, record: &InspectionRecord) {
        let notice = DecisionNotice {
            inspection_id: record.id.clone(),
            status: record.status,
            auto_approved: record.auto_approved,
        };
        if let Err(error) = self.notifier.publish(notice) {
            warn!(
                inspection = %record.id.0,
                %error,
                "terminal notice was not delivered"
            );
        }
    }
}

/// Error raised by the inspection service.
#[derive(Debug, thiserror::Error)]
pub enum InspectionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("workflow '{0:?}' not found")]
    WorkflowNotFound(WorkflowId),
    #[error("actor '{actor}' lacks the {capability:?} capability")]
    MissingCapability {
        actor: String,
        capability: Capability,
    },
    #[error("decision abandoned after {0} conflicting update attempt(s)")]
    ConflictRetriesExhausted(u32),
}
