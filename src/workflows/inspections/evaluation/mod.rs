mod rules;

use serde::{Deserialize, Serialize};

use super::domain::{AutoApprovalRule, InspectionDraft, ValueField};

/// Result of running a workflow's auto-approval rule against a draft.
///
/// Deterministic for fixed inputs: the same rule, steps, and timestamps always
/// yield the same verdict and the same check trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEvaluation {
    pub verdict: RuleVerdict,
    pub checks: Vec<RuleCheck>,
}

impl RuleEvaluation {
    pub fn accepted(&self) -> bool {
        matches!(self.verdict, RuleVerdict::Accept)
    }
}

/// Three-way outcome. `Reject` is an explicit disqualification and routes the
/// inspection to manual approval; it is never silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleVerdict {
    Accept,
    Reject(RejectReason),
    Inapplicable(InapplicableReason),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ValueOutOfBounds {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    OutsideTimeWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InapplicableReason {
    RuleDisabled,
    PhotoRequired,
    ValueUnresolved(ValueField),
}

/// Discrete contribution to an evaluation, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCheck {
    pub name: &'static str,
    pub passed: bool,
    pub note: String,
}

/// Evaluate a workflow's auto-approval rule against a submitted draft.
///
/// Pure and side-effect free. `rule` is `None` when auto-approval is disabled
/// for the workflow, which short-circuits to `Inapplicable`.
pub fn evaluate(rule: Option<&AutoApprovalRule>, draft: &InspectionDraft) -> RuleEvaluation {
    let mut checks = Vec::new();

    let Some(rule) = rule else {
        return RuleEvaluation {
            verdict: RuleVerdict::Inapplicable(InapplicableReason::RuleDisabled),
            checks,
        };
    };

    if rule.require_photo {
        let evidenced = rules::has_evidence(&draft.filled_steps);
        checks.push(RuleCheck {
            name: "photo_evidence",
            passed: evidenced,
            note: if evidenced {
                "at least one step carries media".to_string()
            } else {
                "photo required but no step carries media".to_string()
            },
        });
        if !evidenced {
            return RuleEvaluation {
                verdict: RuleVerdict::Inapplicable(InapplicableReason::PhotoRequired),
                checks,
            };
        }
    }

    let Some(value) = rules::resolve_value(&rule.value_field, draft) else {
        checks.push(RuleCheck {
            name: "value_resolution",
            passed: false,
            note: format!("{:?} not resolvable from the submission", rule.value_field),
        });
        return RuleEvaluation {
            verdict: RuleVerdict::Inapplicable(InapplicableReason::ValueUnresolved(
                rule.value_field.clone(),
            )),
            checks,
        };
    };
    checks.push(RuleCheck {
        name: "value_resolution",
        passed: true,
        note: format!("resolved {:?} to {value}", rule.value_field),
    });

    let at = draft.inspection_date.time();
    let in_window = rules::within_window(rule.time_range_start, rule.time_range_end, at);
    checks.push(RuleCheck {
        name: "time_window",
        passed: in_window,
        note: format!(
            "submitted {at} against window {}..={}",
            rule.time_range_start, rule.time_range_end
        ),
    });
    if !in_window {
        return RuleEvaluation {
            verdict: RuleVerdict::Reject(RejectReason::OutsideTimeWindow),
            checks,
        };
    }

    let in_bounds = rules::within_bounds(value, rule.min_value, rule.max_value);
    checks.push(RuleCheck {
        name: "value_bounds",
        passed: in_bounds,
        note: format!(
            "value {value} against bounds {:?}..={:?}",
            rule.min_value, rule.max_value
        ),
    });
    if !in_bounds {
        return RuleEvaluation {
            verdict: RuleVerdict::Reject(RejectReason::ValueOutOfBounds {
                value,
                min: rule.min_value,
                max: rule.max_value,
            }),
            checks,
        };
    }

    RuleEvaluation {
        verdict: RuleVerdict::Accept,
        checks,
    }
}
