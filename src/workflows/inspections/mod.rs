//! Inspection decision engine: rule-based auto-approval at submission time and
//! the multi-approver state machine that drives everything else to a single,
//! non-racing terminal resolution.
//!
//! Storage, workflow lookup, and notification delivery are trait seams so the
//! engine can run against any document store; in-memory implementations back
//! the default server wiring and the tests.

pub mod approval;
pub mod domain;
pub mod evaluation;
pub(crate) mod frequency;
pub(crate) mod intake;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use approval::{ApprovalAction, ApprovalDecision, ApprovalError, Transition};
pub use domain::{
    Actor, ActorRole, ApproverSlot, ApproverStatus, AutoApprovalRule, Capability, ConsensusPolicy,
    FilledStep, FrequencyPeriod, InspectionDraft, InspectionId, InspectionStatus, MediaKind,
    MediaRef, StepDefinition, UserId, ValueField, WorkflowConfig, WorkflowId,
};
pub use evaluation::{
    InapplicableReason, RejectReason, RuleCheck, RuleEvaluation, RuleVerdict,
};
pub use frequency::FrequencyWindow;
pub use intake::ValidationError;
pub use memory::{LogNotifier, MemoryInspectionStore, MemoryNotifier, StaticWorkflowDirectory};
pub use repository::{
    ApproverView, DecisionNotice, DecisionNotifier, InspectionRecord, InspectionStatusView,
    InspectionStore, NotifyError, RepositoryError, WorkflowDirectory,
};
pub use router::inspection_router;
pub use service::{InspectionService, InspectionServiceError};
