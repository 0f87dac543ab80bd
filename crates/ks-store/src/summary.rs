//! Run summary computation over frame tables.

use std::collections::BTreeMap;

use ks_model::{Frame, RunStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub rms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub n_steps: usize,
    #[serde(default)]
    pub elapsed_sec: f64,
    #[serde(default)]
    pub max_hard_err: f64,
    #[serde(default)]
    pub fail_reason_hist: BTreeMap<String, u64>,
    #[serde(default)]
    pub signals: BTreeMap<String, SignalStats>,
}

struct Accumulator {
    min: f64,
    max: f64,
    sum: f64,
    sum_sq: f64,
    count: u64,
}

/// Compute the persisted summary for one run.
///
/// `success_rate` counts frames with a truthy `success` field;
/// `max_hard_err` treats missing/null `hard_err` as 0.0. Per-signal stats
/// cover every numeric field except `time`, `solver` and `success`.
pub fn build_summary(frames: &[Frame], status: &RunStatus) -> RunSummary {
    let n_steps = frames.len();
    let success_steps = frames
        .iter()
        .filter(|f| f.get("success").map(|v| v.is_truthy()).unwrap_or(false))
        .count();
    let success_rate = if n_steps > 0 {
        success_steps as f64 / n_steps as f64
    } else {
        0.0
    };

    let max_hard_err = if n_steps == 0 {
        0.0
    } else {
        frames
            .iter()
            .map(|f| f.get("hard_err").and_then(|v| v.as_num()).unwrap_or(0.0))
            .fold(f64::NEG_INFINITY, f64::max)
    };

    let mut acc: BTreeMap<String, Accumulator> = BTreeMap::new();
    for frame in frames {
        for (key, value) in frame.iter() {
            if matches!(key, "time" | "solver" | "success") {
                continue;
            }
            let Some(number) = value.as_num() else {
                continue;
            };
            let entry = acc.entry(key.to_string()).or_insert(Accumulator {
                min: number,
                max: number,
                sum: 0.0,
                sum_sq: 0.0,
                count: 0,
            });
            entry.min = entry.min.min(number);
            entry.max = entry.max.max(number);
            entry.sum += number;
            entry.sum_sq += number * number;
            entry.count += 1;
        }
    }

    let signals = acc
        .into_iter()
        .map(|(key, entry)| {
            let count = entry.count.max(1) as f64;
            (
                key,
                SignalStats {
                    min: entry.min,
                    max: entry.max,
                    mean: entry.sum / count,
                    rms: (entry.sum_sq / count).sqrt(),
                },
            )
        })
        .collect();

    RunSummary {
        success: status.success,
        success_rate,
        n_steps,
        elapsed_sec: status.elapsed_sec,
        max_hard_err,
        fail_reason_hist: status.fail_reason_hist.clone(),
        signals,
    }
}
