use chrono::Utc;

use super::common::*;
use crate::workflows::inspections::approval::{
    apply_decision, ApprovalAction, ApprovalDecision, ApprovalError, Transition,
};
use crate::workflows::inspections::domain::{
    ApproverSlot, ApproverStatus, ConsensusPolicy, InspectionId, InspectionStatus, UserId,
};
use crate::workflows::inspections::repository::InspectionRecord;

fn pending_record(approvers: &[&str], consensus: ConsensusPolicy) -> InspectionRecord {
    let draft = draft(approvers, Some(10.0), at(9, 0));
    InspectionRecord {
        id: InspectionId("insp-test".to_string()),
        workflow_id: draft.workflow_id,
        assigned_to: draft.assigned_to,
        approvers: approvers
            .iter()
            .map(|name| ApproverSlot::pending(UserId((*name).to_string())))
            .collect(),
        consensus,
        status: InspectionStatus::Pending,
        auto_approved: false,
        meter_reading: draft.meter_reading,
        reading_date: draft.reading_date,
        inspection_date: draft.inspection_date,
        filled_steps: draft.filled_steps,
        created_at: Utc::now(),
        version: 0,
    }
}

fn approve() -> ApprovalAction {
    ApprovalAction {
        decision: ApprovalDecision::Approve,
        remarks: None,
    }
}

fn reject(remarks: &str) -> ApprovalAction {
    ApprovalAction {
        decision: ApprovalDecision::Reject,
        remarks: Some(remarks.to_string()),
    }
}

fn applied(transition: Transition) -> InspectionRecord {
    match transition {
        Transition::Applied(record) => record,
        Transition::AlreadyResolved(record) => {
            panic!("expected an applied transition, got frozen {:?}", record.status)
        }
    }
}

#[test]
fn single_approver_resolves_on_one_approval() {
    let record = pending_record(&["anne"], ConsensusPolicy::Single);
    let anne = UserId("anne".to_string());

    let updated = applied(
        apply_decision(&record, &anne, &approve(), at(10, 0), false).expect("valid action"),
    );

    assert_eq!(updated.status, InspectionStatus::Approved);
    assert_eq!(updated.approvers[0].status, ApproverStatus::Approved);
    assert_eq!(updated.approvers[0].decided_at, Some(at(10, 0)));
}

#[test]
fn unknown_approver_is_a_caller_error() {
    let record = pending_record(&["anne"], ConsensusPolicy::Single);
    let stranger = UserId("stranger".to_string());

    match apply_decision(&record, &stranger, &approve(), at(10, 0), false) {
        Err(ApprovalError::UnknownApprover(id)) => assert_eq!(id, stranger),
        other => panic!("expected unknown approver error, got {other:?}"),
    }
}

#[test]
fn terminal_record_returns_frozen_without_error() {
    let mut record = pending_record(&["anne"], ConsensusPolicy::Single);
    record.status = InspectionStatus::Rejected;
    record.approvers[0].status = ApproverStatus::Rejected;
    let anne = UserId("anne".to_string());

    match apply_decision(&record, &anne, &approve(), at(11, 0), false) {
        Ok(Transition::AlreadyResolved(frozen)) => {
            assert_eq!(frozen.status, InspectionStatus::Rejected);
            assert_eq!(frozen.approvers[0].status, ApproverStatus::Rejected);
        }
        other => panic!("expected frozen record, got {other:?}"),
    }
}

#[test]
fn auto_approved_record_is_frozen_with_untouched_slots() {
    let mut record = pending_record(&["anne"], ConsensusPolicy::Single);
    record.status = InspectionStatus::AutoApproved;
    record.auto_approved = true;
    let anne = UserId("anne".to_string());

    match apply_decision(&record, &anne, &reject("too late"), at(11, 0), false) {
        Ok(Transition::AlreadyResolved(frozen)) => {
            assert_eq!(frozen.approvers[0].status, ApproverStatus::Pending);
            assert!(frozen.auto_approved);
        }
        other => panic!("expected frozen record, got {other:?}"),
    }
}

#[test]
fn repeated_decision_by_same_approver_is_rejected() {
    let record = pending_record(&["anne", "ben"], ConsensusPolicy::Parallel);
    let anne = UserId("anne".to_string());

    let updated = applied(
        apply_decision(&record, &anne, &approve(), at(10, 0), false).expect("first decision"),
    );
    assert_eq!(updated.status, InspectionStatus::Pending);

    match apply_decision(&updated, &anne, &reject("changed my mind"), at(10, 5), false) {
        Err(ApprovalError::AlreadyDecided(id)) => assert_eq!(id, anne),
        other => panic!("expected already-decided error, got {other:?}"),
    }
}

#[test]
fn sequential_policy_blocks_out_of_turn_actions() {
    let record = pending_record(&["anne", "ben"], ConsensusPolicy::Sequential);
    let ben = UserId("ben".to_string());

    match apply_decision(&record, &ben, &approve(), at(10, 0), false) {
        Err(ApprovalError::OutOfTurn {
            position,
            waiting_on,
        }) => {
            assert_eq!(position, 1);
            assert_eq!(waiting_on, UserId("anne".to_string()));
        }
        other => panic!("expected out-of-turn error, got {other:?}"),
    }
}

#[test]
fn sequential_policy_resolves_in_order() {
    let record = pending_record(&["anne", "ben"], ConsensusPolicy::Sequential);
    let anne = UserId("anne".to_string());
    let ben = UserId("ben".to_string());

    let after_anne = applied(
        apply_decision(&record, &anne, &approve(), at(10, 0), false).expect("anne in turn"),
    );
    assert_eq!(after_anne.status, InspectionStatus::Pending);

    let after_ben = applied(
        apply_decision(&after_anne, &ben, &approve(), at(10, 30), false).expect("ben in turn"),
    );
    assert_eq!(after_ben.status, InspectionStatus::Approved);
}

#[test]
fn override_order_bypasses_the_sequential_gate() {
    let record = pending_record(&["anne", "ben"], ConsensusPolicy::Sequential);
    let ben = UserId("ben".to_string());

    let updated = applied(
        apply_decision(&record, &ben, &approve(), at(10, 0), true).expect("override allowed"),
    );

    assert_eq!(updated.approvers[1].status, ApproverStatus::Approved);
    assert_eq!(updated.status, InspectionStatus::Pending);
}

#[test]
fn any_rejection_dominates_under_parallel_policy() {
    let record = pending_record(&["anne", "ben", "cara"], ConsensusPolicy::Parallel);
    let anne = UserId("anne".to_string());
    let ben = UserId("ben".to_string());

    let after_anne = applied(
        apply_decision(&record, &anne, &approve(), at(10, 0), false).expect("anne decides"),
    );
    let after_ben = applied(
        apply_decision(&after_anne, &ben, &reject("leak under the panel"), at(10, 5), false)
            .expect("ben decides"),
    );

    assert_eq!(after_ben.status, InspectionStatus::Rejected);
    assert_eq!(
        after_ben.approvers[1].remarks.as_deref(),
        Some("leak under the panel")
    );
}

#[test]
fn parallel_policy_requires_unanimity_to_approve() {
    let record = pending_record(&["anne", "ben"], ConsensusPolicy::Parallel);
    let anne = UserId("anne".to_string());
    let ben = UserId("ben".to_string());

    let after_ben = applied(
        apply_decision(&record, &ben, &approve(), at(10, 0), false).expect("any order allowed"),
    );
    assert_eq!(after_ben.status, InspectionStatus::Pending);

    let after_anne = applied(
        apply_decision(&after_ben, &anne, &approve(), at(10, 5), false).expect("anne decides"),
    );
    assert_eq!(after_anne.status, InspectionStatus::Approved);
}
