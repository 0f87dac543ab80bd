//! Random-search scoring loop.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use ks_expr::eval_signal_expr;
use ks_model::{CaseSpec, Frame, ModelSnapshot, RunStatus, build_signals};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

use crate::apply::apply_design_vars;
use crate::spec::{Comparator, Direction, SearchSpec};
use crate::{OptError, OptResult};

/// Failed objective evaluations score as a large finite penalty instead of
/// aborting the trial.
const EVAL_FAILURE_VALUE: f64 = 1e9;
/// Per-pair violation added when a constraint expression fails to evaluate,
/// and the multiplier that turns total violation into a score penalty.
const VIOLATION_PENALTY: f64 = 1e6;

/// One simulated case: per-step frames plus the simulator's own summary and
/// status records.
#[derive(Debug, Clone, Default)]
pub struct SimRun {
    pub frames: Vec<Frame>,
    pub summary: serde_json::Value,
    pub status: RunStatus,
}

/// External simulator seam. Trials call it once per required case; any
/// error aborts the whole search.
pub trait Simulator {
    fn simulate_case(&self, snapshot: &ModelSnapshot, spec: &CaseSpec) -> OptResult<SimRun>;
}

/// Full record of the best trial found so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRecord {
    pub score: f64,
    pub vars: BTreeMap<String, f64>,
    /// First enabled objective's case-averaged value, before direction
    /// negation (what the user asked to minimize or maximize).
    pub objective: f64,
    /// One entry per (enabled constraint x scoped case) pair, in spec
    /// order; failed evaluations record 0.0 to keep the list aligned.
    pub constraints: Vec<f64>,
    pub summaries: BTreeMap<String, serde_json::Value>,
    pub statuses: BTreeMap<String, RunStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub best: Option<BestRecord>,
    pub cancelled: bool,
    pub trials_run: usize,
}

/// Run the search loop to completion or cancellation.
///
/// Each trial samples enabled variables uniformly within bounds (in
/// declaration order, from a run-scoped RNG), applies them to a copy of the
/// model, simulates every case any enabled objective or constraint needs,
/// and scores `first_objective_avg + violation * 1e6`. Strictly smaller
/// scores replace the best record, so ties keep the earlier trial and a
/// fixed seed makes the whole run reproducible.
///
/// Only the first enabled objective contributes to the score; additional
/// objectives are evaluated and reported but not weighted in.
///
/// Reversed variable bounds are normalized before sampling; non-finite
/// bounds fail the search up front as [`OptError::InvalidBounds`].
///
/// `cancel` is checked once per trial boundary. `on_progress` fires after
/// every scored trial with the running best.
pub fn run_search(
    simulator: &dyn Simulator,
    model_snapshot: &ModelSnapshot,
    case_specs: &BTreeMap<String, CaseSpec>,
    search: &SearchSpec,
    cancel: &AtomicBool,
    mut on_progress: impl FnMut(usize, Option<&BestRecord>),
) -> OptResult<SearchOutcome> {
    if case_specs.is_empty() {
        return Err(OptError::NoCases);
    }
    for var in search.variables.iter().filter(|v| v.enabled) {
        if !var.lower.is_finite() || !var.upper.is_finite() {
            return Err(OptError::InvalidBounds {
                name: var.name.clone(),
                lower: var.lower,
                upper: var.upper,
            });
        }
    }
    let all_case_ids: Vec<String> = case_specs.keys().cloned().collect();
    let mut rng = match search.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let evals = search.evals.max(1);

    let mut best: Option<BestRecord> = None;
    let mut trials_run = 0usize;

    for index in 1..=evals {
        if cancel.load(Ordering::Relaxed) {
            return Ok(SearchOutcome {
                best,
                cancelled: true,
                trials_run,
            });
        }

        let mut candidate: BTreeMap<String, f64> = BTreeMap::new();
        for var in &search.variables {
            if !var.enabled {
                continue;
            }
            // Reversed bounds are accepted; the interval is the same.
            let lo = var.lower.min(var.upper);
            let hi = var.lower.max(var.upper);
            candidate.insert(var.name.clone(), rng.gen_range(lo..=hi));
        }

        let mut apply_warnings = Vec::new();
        let snapshot = apply_design_vars(model_snapshot, &candidate, &mut apply_warnings);
        for warning in &apply_warnings {
            warn!(trial = index, "{warning}");
        }

        let mut required: BTreeSet<&str> = BTreeSet::new();
        for obj in search.objectives.iter().filter(|o| o.enabled) {
            scope_into(&mut required, obj.case_ids.as_deref(), &all_case_ids);
        }
        for con in search.constraints.iter().filter(|c| c.enabled) {
            scope_into(&mut required, con.case_ids.as_deref(), &all_case_ids);
        }
        if required.is_empty() {
            required.extend(all_case_ids.iter().map(String::as_str));
        }

        let mut signals_by_case = BTreeMap::new();
        let mut summaries = BTreeMap::new();
        let mut statuses = BTreeMap::new();
        for case_id in &required {
            let Some(case_spec) = case_specs.get(*case_id) else {
                continue;
            };
            let run = simulator.simulate_case(&snapshot, case_spec)?;
            signals_by_case.insert(
                case_id.to_string(),
                build_signals(&run.frames, Some(&snapshot)),
            );
            summaries.insert(case_id.to_string(), run.summary);
            statuses.insert(case_id.to_string(), run.status);
        }

        let mut obj_scores = Vec::new();
        let mut obj_displays = Vec::new();
        for obj in search.objectives.iter().filter(|o| o.enabled) {
            let mut case_scores = Vec::new();
            let mut case_displays = Vec::new();
            for case_id in obj.case_ids.as_deref().unwrap_or(&all_case_ids) {
                let Some(signals) = signals_by_case.get(case_id.as_str()) else {
                    continue;
                };
                match eval_signal_expr(&obj.expression, signals) {
                    Ok(value) => {
                        case_scores.push(match obj.direction {
                            Direction::Max => -value,
                            Direction::Min => value,
                        });
                        case_displays.push(value);
                    }
                    Err(_) => {
                        case_scores.push(EVAL_FAILURE_VALUE);
                        case_displays.push(EVAL_FAILURE_VALUE);
                    }
                }
            }
            if !case_scores.is_empty() {
                obj_scores.push(mean(&case_scores));
            }
            if !case_displays.is_empty() {
                obj_displays.push(mean(&case_displays));
            }
        }
        let base_score = obj_scores.first().copied().unwrap_or(0.0);
        let base_display = obj_displays.first().copied().unwrap_or(0.0);

        let mut violation = 0.0;
        let mut con_vals = Vec::new();
        for con in search.constraints.iter().filter(|c| c.enabled) {
            for case_id in con.case_ids.as_deref().unwrap_or(&all_case_ids) {
                let Some(signals) = signals_by_case.get(case_id.as_str()) else {
                    continue;
                };
                match eval_signal_expr(&con.expression, signals) {
                    Ok(value) => {
                        con_vals.push(value);
                        violation += match con.comparator {
                            Comparator::Le => (value - con.limit).max(0.0),
                            Comparator::Ge => (con.limit - value).max(0.0),
                        };
                    }
                    Err(_) => {
                        violation += VIOLATION_PENALTY;
                        con_vals.push(0.0);
                    }
                }
            }
        }

        let score = base_score + violation * VIOLATION_PENALTY;
        trials_run = index;
        debug!(
            trial = index,
            score,
            objective = base_display,
            violation,
            "trial scored"
        );

        if best.as_ref().is_none_or(|b| score < b.score) {
            best = Some(BestRecord {
                score,
                vars: candidate,
                objective: base_display,
                constraints: con_vals,
                summaries,
                statuses,
            });
        }
        on_progress(index, best.as_ref());
    }

    Ok(SearchOutcome {
        best,
        cancelled: false,
        trials_run,
    })
}

fn scope_into<'a>(
    required: &mut BTreeSet<&'a str>,
    scope: Option<&'a [String]>,
    all: &'a [String],
) {
    required.extend(scope.unwrap_or(all).iter().map(String::as_str));
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
