use chrono::NaiveTime;

use super::super::domain::{FilledStep, InspectionDraft, ValueField};

/// True if any filled step carries at least one media attachment.
pub(crate) fn has_evidence(steps: &[FilledStep]) -> bool {
    steps.iter().any(FilledStep::has_media)
}

/// Inclusive time-of-day window test. A window whose end precedes its start
/// spans midnight and accepts times on either side of it.
pub(crate) fn within_window(start: NaiveTime, end: NaiveTime, at: NaiveTime) -> bool {
    if end < start {
        at >= start || at <= end
    } else {
        at >= start && at <= end
    }
}

/// Resolve the configured value field against the draft, if present. A NaN
/// reading is unresolvable, not comparable.
pub(crate) fn resolve_value(field: &ValueField, draft: &InspectionDraft) -> Option<f64> {
    let value = match field {
        ValueField::MeterReading => draft.meter_reading,
        ValueField::StepResponse { step_id } => draft
            .filled_steps
            .iter()
            .find(|step| step.step_id == *step_id)
            .and_then(|step| step.response.trim().parse::<f64>().ok()),
    };
    value.filter(|value| !value.is_nan())
}

/// Inclusive bounds test; a missing bound is unbounded on that side.
pub(crate) fn within_bounds(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    if let Some(min) = min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = max {
        if value > max {
            return false;
        }
    }
    true
}
