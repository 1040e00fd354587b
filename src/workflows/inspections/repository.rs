use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApproverSlot, ApproverStatus, ConsensusPolicy, FilledStep, InspectionId, InspectionStatus,
    UserId, WorkflowId,
};
use super::frequency::FrequencyWindow;

/// Persisted inspection aggregate. Decision fields are only ever mutated
/// through the approval transition function; `version` backs the store's
/// compare-and-swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: InspectionId,
    pub workflow_id: WorkflowId,
    pub assigned_to: UserId,
    pub filled_steps: Vec<FilledStep>,
    pub approvers: Vec<ApproverSlot>,
    /// Consensus policy snapshotted from the workflow at submission time.
    pub consensus: ConsensusPolicy,
    pub status: InspectionStatus,
    pub auto_approved: bool,
    pub meter_reading: Option<f64>,
    pub reading_date: Option<NaiveDate>,
    pub inspection_date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl InspectionRecord {
    pub fn decision_rationale(&self) -> String {
        match self.status {
            InspectionStatus::AutoApproved => "auto-approved by workflow rule".to_string(),
            InspectionStatus::Approved => "approved by all listed approvers".to_string(),
            InspectionStatus::Rejected => {
                let by = self
                    .approvers
                    .iter()
                    .find(|slot| slot.status == ApproverStatus::Rejected)
                    .map(|slot| slot.approver.0.as_str())
                    .unwrap_or("an approver");
                format!("rejected by {by}")
            }
            InspectionStatus::Pending => {
                let decided = self
                    .approvers
                    .iter()
                    .filter(|slot| slot.status != ApproverStatus::Pending)
                    .count();
                format!("awaiting approval ({decided}/{} decided)", self.approvers.len())
            }
        }
    }

    pub fn status_view(&self) -> InspectionStatusView {
        InspectionStatusView {
            inspection_id: self.id.clone(),
            status: self.status.label(),
            auto_approved: self.auto_approved,
            decision_rationale: self.decision_rationale(),
            approvals: self
                .approvers
                .iter()
                .map(|slot| ApproverView {
                    approver: slot.approver.clone(),
                    status: slot.status.label(),
                    remarks: slot.remarks.clone(),
                    decided_at: slot.decided_at,
                })
                .collect(),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update` is the atomicity seam: it must only apply when the stored version
/// still equals `expected_version`, and must bump the version on success.
pub trait InspectionStore: Send + Sync {
    fn insert(&self, record: InspectionRecord) -> Result<InspectionRecord, RepositoryError>;
    fn fetch(&self, id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError>;
    fn update(
        &self,
        record: InspectionRecord,
        expected_version: u64,
    ) -> Result<InspectionRecord, RepositoryError>;
    fn count_in_window(
        &self,
        assignee: &UserId,
        workflow: &WorkflowId,
        window: &FrequencyWindow,
    ) -> Result<u64, RepositoryError>;
}

/// Read-only lookup of workflow configurations.
pub trait WorkflowDirectory: Send + Sync {
    fn fetch(
        &self,
        id: &WorkflowId,
    ) -> Result<Option<super::domain::WorkflowConfig>, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    VersionConflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook informed whenever an inspection reaches a terminal state.
/// Delivery mechanics (mail, webhooks) live outside the engine.
pub trait DecisionNotifier: Send + Sync {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotifyError>;
}

/// Payload emitted on every terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotice {
    pub inspection_id: InspectionId,
    pub status: InspectionStatus,
    pub auto_approved: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an inspection's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionStatusView {
    pub inspection_id: InspectionId,
    pub status: &'static str,
    pub auto_approved: bool,
    pub decision_rationale: String,
    pub approvals: Vec<ApproverView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproverView {
    pub approver: UserId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<NaiveDateTime>,
}
