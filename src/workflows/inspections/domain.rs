use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted inspections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InspectionId(pub String);

/// Identifier wrapper for workflow configurations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub String);

/// Identifier wrapper for inspectors, approvers, and admins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Pointer to externally stored evidence attached to a step response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub storage_key: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

/// One answered step of a submitted inspection. Immutable after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledStep {
    pub step_id: String,
    pub title: String,
    pub response: String,
    pub media: Vec<MediaRef>,
    pub recorded_at: NaiveDateTime,
}

impl FilledStep {
    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}

/// Inbound submission payload produced by the inspector's client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionDraft {
    pub workflow_id: WorkflowId,
    pub assigned_to: UserId,
    pub filled_steps: Vec<FilledStep>,
    pub approvers: Vec<UserId>,
    pub meter_reading: Option<f64>,
    pub reading_date: Option<NaiveDate>,
    /// Inspection-local wall clock; drives both the rule time window and the
    /// frequency window.
    pub inspection_date: NaiveDateTime,
}

/// Per-approver decision slot. Slot index is the sequential order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproverSlot {
    pub approver: UserId,
    pub status: ApproverStatus,
    pub remarks: Option<String>,
    pub decided_at: Option<NaiveDateTime>,
}

impl ApproverSlot {
    pub fn pending(approver: UserId) -> Self {
        Self {
            approver,
            status: ApproverStatus::Pending,
            remarks: None,
            decided_at: None,
        }
    }
}

/// Individual approver verdict within an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApproverStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApproverStatus::Pending => "pending",
            ApproverStatus::Approved => "approved",
            ApproverStatus::Rejected => "rejected",
        }
    }
}

/// Overall inspection status. Terminal states are immutable once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Pending,
    Approved,
    Rejected,
    AutoApproved,
}

impl InspectionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InspectionStatus::Pending => "pending",
            InspectionStatus::Approved => "approved",
            InspectionStatus::Rejected => "rejected",
            InspectionStatus::AutoApproved => "auto_approved",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, InspectionStatus::Pending)
    }
}

/// Per-organization workflow template. Read-only to the engine; the relevant
/// parts are snapshotted onto the inspection record at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub id: WorkflowId,
    pub name: String,
    pub steps: Vec<StepDefinition>,
    /// `None` means auto-approval is disabled for this workflow.
    pub auto_approval: Option<AutoApprovalRule>,
    pub consensus: ConsensusPolicy,
}

impl WorkflowConfig {
    pub fn step(&self, step_id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.step_id == step_id)
    }
}

/// Template for one inspection step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub step_id: String,
    pub title: String,
    pub instructions: String,
    pub media_required: bool,
}

/// Parameters governing rule-based auto-approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoApprovalRule {
    /// Inclusive window over the inspection-local time of day. A window whose
    /// end precedes its start spans midnight.
    pub time_range_start: NaiveTime,
    pub time_range_end: NaiveTime,
    pub value_field: ValueField,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub require_photo: bool,
    pub frequency_limit: Option<u32>,
    pub frequency_period: FrequencyPeriod,
}

/// Which numeric response the rule tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    MeterReading,
    StepResponse { step_id: String },
}

/// Rolling window used to cap auto-approval frequency per assignee/workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyPeriod {
    Hour,
    Day,
    Week,
}

impl FrequencyPeriod {
    pub fn duration(self) -> Duration {
        match self {
            FrequencyPeriod::Hour => Duration::hours(1),
            FrequencyPeriod::Day => Duration::days(1),
            FrequencyPeriod::Week => Duration::weeks(1),
        }
    }
}

/// How individual approver verdicts combine into the overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusPolicy {
    /// Exactly one approver decides alone.
    Single,
    /// Approvers act in slot order; everyone must approve.
    Sequential,
    /// Approvers act in any order; everyone must approve.
    Parallel,
}

impl ConsensusPolicy {
    pub const fn label(self) -> &'static str {
        match self {
            ConsensusPolicy::Single => "single",
            ConsensusPolicy::Sequential => "sequential",
            ConsensusPolicy::Parallel => "parallel",
        }
    }
}

/// Caller identity presented at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: ActorRole,
}

/// Closed set of roles recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Inspector,
    Approver,
    Admin,
}

/// Capabilities granted to a role. Checked before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SubmitInspection,
    RecordDecision,
    OverrideOrder,
}

impl ActorRole {
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            ActorRole::Inspector => &[Capability::SubmitInspection],
            ActorRole::Approver => &[Capability::RecordDecision],
            ActorRole::Admin => &[
                Capability::SubmitInspection,
                Capability::RecordDecision,
                Capability::OverrideOrder,
            ],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}
