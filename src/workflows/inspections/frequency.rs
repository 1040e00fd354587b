use chrono::NaiveDateTime;

use super::domain::{FrequencyPeriod, UserId, WorkflowId};
use super::repository::{InspectionStore, RepositoryError};

/// Half-open rolling window `[as_of - period, as_of)` over inspection-local
/// timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl FrequencyWindow {
    pub fn ending_at(period: FrequencyPeriod, as_of: NaiveDateTime) -> Self {
        Self {
            start: as_of - period.duration(),
            end: as_of,
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

/// Count prior inspections for the assignee/workflow pair inside the rolling
/// window ending at `as_of`, matching on `inspection_date`.
///
/// This is a point-in-time read with no slot reservation; concurrent
/// submissions inside the same window may observe the same count.
pub fn count_recent<S: InspectionStore + ?Sized>(
    store: &S,
    assignee: &UserId,
    workflow: &WorkflowId,
    period: FrequencyPeriod,
    as_of: NaiveDateTime,
) -> Result<u64, RepositoryError> {
    let window = FrequencyWindow::ending_at(period, as_of);
    store.count_in_window(assignee, workflow, &window)
}
