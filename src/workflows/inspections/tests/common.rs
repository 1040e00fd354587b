use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::workflows::inspections::domain::{
    Actor, ActorRole, AutoApprovalRule, ConsensusPolicy, FilledStep, FrequencyPeriod,
    InspectionDraft, InspectionId, InspectionStatus, MediaKind, MediaRef, StepDefinition, UserId,
    ValueField, WorkflowConfig, WorkflowId,
};
use crate::workflows::inspections::frequency::FrequencyWindow;
use crate::workflows::inspections::memory::{
    MemoryInspectionStore, MemoryNotifier, StaticWorkflowDirectory,
};
use crate::workflows::inspections::repository::{
    InspectionRecord, InspectionStore, RepositoryError,
};
use crate::workflows::inspections::service::InspectionService;
use crate::workflows::inspections::intake;

pub(super) fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 10)
        .expect("valid date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn meter_rule() -> AutoApprovalRule {
    AutoApprovalRule {
        time_range_start: time(6, 0),
        time_range_end: time(18, 0),
        value_field: ValueField::MeterReading,
        min_value: Some(0.0),
        max_value: Some(100.0),
        require_photo: false,
        frequency_limit: None,
        frequency_period: FrequencyPeriod::Day,
    }
}

pub(super) fn workflow(
    consensus: ConsensusPolicy,
    auto_approval: Option<AutoApprovalRule>,
) -> WorkflowConfig {
    WorkflowConfig {
        id: WorkflowId("wf-meter".to_string()),
        name: "Meter room walkthrough".to_string(),
        steps: vec![
            StepDefinition {
                step_id: "reading".to_string(),
                title: "Record the meter".to_string(),
                instructions: "Note the display value".to_string(),
                media_required: false,
            },
            StepDefinition {
                step_id: "panel".to_string(),
                title: "Photograph the panel".to_string(),
                instructions: "Wide shot of the breaker panel".to_string(),
                media_required: false,
            },
        ],
        auto_approval,
        consensus,
    }
}

pub(super) fn filled_step(step_id: &str, response: &str, with_media: bool) -> FilledStep {
    FilledStep {
        step_id: step_id.to_string(),
        title: step_id.to_string(),
        response: response.to_string(),
        media: if with_media {
            vec![MediaRef {
                storage_key: format!("s3://inspections/{step_id}.jpg"),
                kind: MediaKind::Photo,
            }]
        } else {
            Vec::new()
        },
        recorded_at: at(9, 0),
    }
}

pub(super) fn draft(
    approvers: &[&str],
    meter_reading: Option<f64>,
    inspection_date: NaiveDateTime,
) -> InspectionDraft {
    InspectionDraft {
        workflow_id: WorkflowId("wf-meter".to_string()),
        assigned_to: UserId("inspector-ivy".to_string()),
        filled_steps: vec![filled_step("reading", "nominal", false)],
        approvers: approvers
            .iter()
            .map(|name| UserId((*name).to_string()))
            .collect(),
        meter_reading,
        reading_date: Some(inspection_date.date()),
        inspection_date,
    }
}

pub(super) fn approver(name: &str) -> Actor {
    Actor {
        id: UserId(name.to_string()),
        role: ActorRole::Approver,
    }
}

pub(super) fn admin(name: &str) -> Actor {
    Actor {
        id: UserId(name.to_string()),
        role: ActorRole::Admin,
    }
}

pub(super) type TestService<S = MemoryInspectionStore> =
    InspectionService<S, StaticWorkflowDirectory, MemoryNotifier>;

pub(super) fn build_service(
    workflow: WorkflowConfig,
) -> (
    TestService,
    Arc<MemoryInspectionStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryInspectionStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let directory = Arc::new(StaticWorkflowDirectory::with_workflows([workflow]));
    let service = InspectionService::new(store.clone(), directory, notifier.clone());
    (service, store, notifier)
}

/// Seed a manual-path record directly into the store, bypassing the service,
/// so frequency tests can shape history precisely.
pub(super) fn seed_record(
    store: &MemoryInspectionStore,
    id: &str,
    inspection_date: NaiveDateTime,
) -> InspectionRecord {
    let draft = draft(&["approver-anne"], Some(10.0), inspection_date);
    let record = InspectionRecord {
        id: InspectionId(id.to_string()),
        workflow_id: draft.workflow_id.clone(),
        assigned_to: draft.assigned_to.clone(),
        approvers: intake::initial_slots(&draft),
        consensus: ConsensusPolicy::Single,
        status: InspectionStatus::AutoApproved,
        auto_approved: true,
        meter_reading: draft.meter_reading,
        reading_date: draft.reading_date,
        inspection_date: draft.inspection_date,
        filled_steps: draft.filled_steps,
        created_at: Utc::now(),
        version: 0,
    };
    store.insert(record).expect("seed record inserts")
}

/// Store wrapper that reports a fixed number of version conflicts before
/// letting updates through, to exercise the service's retry loop.
pub(super) struct FlakyStore {
    inner: MemoryInspectionStore,
    conflicts_left: AtomicU32,
}

impl FlakyStore {
    pub(super) fn conflicting(conflicts: u32) -> Self {
        Self {
            inner: MemoryInspectionStore::default(),
            conflicts_left: AtomicU32::new(conflicts),
        }
    }
}

impl InspectionStore for FlakyStore {
    fn insert(&self, record: InspectionRecord) -> Result<InspectionRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update(
        &self,
        record: InspectionRecord,
        expected_version: u64,
    ) -> Result<InspectionRecord, RepositoryError> {
        let left = self.conflicts_left.load(Ordering::Acquire);
        if left > 0 {
            self.conflicts_left.store(left - 1, Ordering::Release);
            return Err(RepositoryError::VersionConflict);
        }
        self.inner.update(record, expected_version)
    }

    fn count_in_window(
        &self,
        assignee: &UserId,
        workflow: &WorkflowId,
        window: &FrequencyWindow,
    ) -> Result<u64, RepositoryError> {
        self.inner.count_in_window(assignee, workflow, window)
    }
}

pub(super) fn build_flaky_service(
    workflow: WorkflowConfig,
    conflicts: u32,
    retry_limit: u32,
) -> (TestService<FlakyStore>, Arc<FlakyStore>, Arc<MemoryNotifier>) {
    let store = Arc::new(FlakyStore::conflicting(conflicts));
    let notifier = Arc::new(MemoryNotifier::default());
    let directory = Arc::new(StaticWorkflowDirectory::with_workflows([workflow]));
    let service =
        InspectionService::with_retry_limit(store.clone(), directory, notifier.clone(), retry_limit);
    (service, store, notifier)
}
