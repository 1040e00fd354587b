use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{ApproverStatus, ConsensusPolicy, InspectionStatus, UserId};
use super::repository::InspectionRecord;

/// An approver's verdict on one inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

/// One approver action against the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalAction {
    pub decision: ApprovalDecision,
    pub remarks: Option<String>,
}

/// Outcome of applying an action. `AlreadyResolved` is the idempotent case:
/// the inspection was terminal before the action, the frozen record comes back
/// untouched and without error.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(InspectionRecord),
    AlreadyResolved(InspectionRecord),
}

/// Caller errors raised by the transition function. None of these warrant a
/// retry; only storage version conflicts do, and those are handled one layer
/// up in the service.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("{0:?} is not a listed approver for this inspection")]
    UnknownApprover(UserId),
    #[error("out of turn: slot {position} must wait for {waiting_on:?} to approve")]
    OutOfTurn { position: usize, waiting_on: UserId },
    #[error("{0:?} already recorded a decision for this inspection")]
    AlreadyDecided(UserId),
}

/// Apply one approver action to a record, producing the updated record and
/// recomputed overall status.
///
/// Pure: the caller owns persistence and must commit the result atomically
/// against the version it read (the record's slot write and the termination
/// check below belong to one logical transaction).
pub fn apply_decision(
    record: &InspectionRecord,
    actor: &UserId,
    action: &ApprovalAction,
    decided_at: NaiveDateTime,
    override_order: bool,
) -> Result<Transition, ApprovalError> {
    if record.status.is_terminal() {
        return Ok(Transition::AlreadyResolved(record.clone()));
    }

    let position = record
        .approvers
        .iter()
        .position(|slot| slot.approver == *actor)
        .ok_or_else(|| ApprovalError::UnknownApprover(actor.clone()))?;

    if record.approvers[position].status != ApproverStatus::Pending {
        return Err(ApprovalError::AlreadyDecided(actor.clone()));
    }

    if record.consensus == ConsensusPolicy::Sequential && !override_order {
        if let Some(blocking) = record.approvers[..position]
            .iter()
            .find(|slot| slot.status != ApproverStatus::Approved)
        {
            return Err(ApprovalError::OutOfTurn {
                position,
                waiting_on: blocking.approver.clone(),
            });
        }
    }

    let mut updated = record.clone();
    {
        let slot = &mut updated.approvers[position];
        slot.status = match action.decision {
            ApprovalDecision::Approve => ApproverStatus::Approved,
            ApprovalDecision::Reject => ApproverStatus::Rejected,
        };
        slot.remarks = action.remarks.clone();
        slot.decided_at = Some(decided_at);
    }
    updated.status = consensus_status(&updated);

    Ok(Transition::Applied(updated))
}

/// Overall status as a pure function of the approver slots. A single rejection
/// dominates under every policy; approval requires unanimity.
fn consensus_status(record: &InspectionRecord) -> InspectionStatus {
    if record
        .approvers
        .iter()
        .any(|slot| slot.status == ApproverStatus::Rejected)
    {
        return InspectionStatus::Rejected;
    }
    if record
        .approvers
        .iter()
        .all(|slot| slot.status == ApproverStatus::Approved)
    {
        return InspectionStatus::Approved;
    }
    InspectionStatus::Pending
}
