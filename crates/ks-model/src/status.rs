//! Simulator status records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome record produced by the simulator for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub elapsed_sec: f64,
    /// Failure-reason histogram across steps (reason -> count).
    #[serde(default)]
    pub fail_reason_hist: BTreeMap<String, u64>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver_error: Option<String>,
    #[serde(default)]
    pub finished_utc: String,
}
