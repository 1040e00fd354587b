use std::collections::HashSet;

use super::domain::{ApproverSlot, ConsensusPolicy, InspectionDraft, WorkflowConfig};

/// Boundary rejections raised before any decision is made. These are caller
/// errors; the orchestrator never runs against an invalid draft.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("an inspection requires at least one approver")]
    NoApprovers,
    #[error("approver '{0}' is listed more than once")]
    DuplicateApprover(String),
    #[error("consensus policy '{policy}' is incompatible with {approver_count} approver(s)")]
    PolicyMismatch {
        policy: &'static str,
        approver_count: usize,
    },
    #[error("filled step '{0}' does not exist in the workflow")]
    UnknownStep(String),
    #[error("workflow step '{0}' requires media but the filled step carries none")]
    MissingRequiredMedia(String),
}

/// Validate a draft against its workflow template.
pub(crate) fn validate_draft(
    draft: &InspectionDraft,
    workflow: &WorkflowConfig,
) -> Result<(), ValidationError> {
    if draft.approvers.is_empty() {
        return Err(ValidationError::NoApprovers);
    }

    let mut seen = HashSet::new();
    for approver in &draft.approvers {
        if !seen.insert(approver) {
            return Err(ValidationError::DuplicateApprover(approver.0.clone()));
        }
    }

    if workflow.consensus == ConsensusPolicy::Single && draft.approvers.len() != 1 {
        return Err(ValidationError::PolicyMismatch {
            policy: workflow.consensus.label(),
            approver_count: draft.approvers.len(),
        });
    }

    for filled in &draft.filled_steps {
        let Some(definition) = workflow.step(&filled.step_id) else {
            return Err(ValidationError::UnknownStep(filled.step_id.clone()));
        };
        if definition.media_required && !filled.has_media() {
            return Err(ValidationError::MissingRequiredMedia(filled.step_id.clone()));
        }
    }

    Ok(())
}

/// Initialize the ordered approver list, every slot pending.
pub(crate) fn initial_slots(draft: &InspectionDraft) -> Vec<ApproverSlot> {
    draft
        .approvers
        .iter()
        .cloned()
        .map(ApproverSlot::pending)
        .collect()
}
