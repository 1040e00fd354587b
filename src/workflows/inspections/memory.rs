//! In-memory collaborators backing the server's default wiring, the offline
//! `decide` command, and the test suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use super::domain::{InspectionId, UserId, WorkflowConfig, WorkflowId};
use super::frequency::FrequencyWindow;
use super::repository::{
    DecisionNotice, DecisionNotifier, InspectionRecord, InspectionStore, NotifyError,
    RepositoryError, WorkflowDirectory,
};

/// Mutex-backed store with compare-and-swap updates keyed on record version.
#[derive(Default, Clone)]
pub struct MemoryInspectionStore {
    records: Arc<Mutex<HashMap<InspectionId, InspectionRecord>>>,
}

impl InspectionStore for MemoryInspectionStore {
    fn insert(&self, record: InspectionRecord) -> Result<InspectionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        mut record: InspectionRecord,
        expected_version: u64,
    ) -> Result<InspectionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let current_version = guard
            .get(&record.id)
            .ok_or(RepositoryError::NotFound)?
            .version;
        if current_version != expected_version {
            return Err(RepositoryError::VersionConflict);
        }
        record.version = expected_version + 1;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn count_in_window(
        &self,
        assignee: &UserId,
        workflow: &WorkflowId,
        window: &FrequencyWindow,
    ) -> Result<u64, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let count = guard
            .values()
            .filter(|record| {
                record.assigned_to == *assignee
                    && record.workflow_id == *workflow
                    && window.contains(record.inspection_date)
            })
            .count();
        Ok(count as u64)
    }
}

/// Fixed set of workflow configurations loaded at startup.
#[derive(Default, Clone)]
pub struct StaticWorkflowDirectory {
    workflows: Arc<Mutex<HashMap<WorkflowId, WorkflowConfig>>>,
}

impl StaticWorkflowDirectory {
    pub fn with_workflows(workflows: impl IntoIterator<Item = WorkflowConfig>) -> Self {
        let map = workflows
            .into_iter()
            .map(|workflow| (workflow.id.clone(), workflow))
            .collect();
        Self {
            workflows: Arc::new(Mutex::new(map)),
        }
    }

    pub fn register(&self, workflow: WorkflowConfig) {
        let mut guard = self.workflows.lock().expect("directory mutex poisoned");
        guard.insert(workflow.id.clone(), workflow);
    }
}

impl WorkflowDirectory for StaticWorkflowDirectory {
    fn fetch(&self, id: &WorkflowId) -> Result<Option<WorkflowConfig>, RepositoryError> {
        let guard = self.workflows.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// Notifier that records terminal transitions in the service log only.
#[derive(Default, Clone)]
pub struct LogNotifier;

impl DecisionNotifier for LogNotifier {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotifyError> {
        info!(
            inspection = %notice.inspection_id.0,
            status = notice.status.label(),
            auto_approved = notice.auto_approved,
            "inspection resolved"
        );
        Ok(())
    }
}

/// Notifier that captures notices so tests can assert integration boundaries.
#[derive(Default, Clone)]
pub struct MemoryNotifier {
    notices: Arc<Mutex<Vec<DecisionNotice>>>,
}

impl MemoryNotifier {
    pub fn notices(&self) -> Vec<DecisionNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl DecisionNotifier for MemoryNotifier {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}
