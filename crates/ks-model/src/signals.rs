//! Signal table construction from simulation frames and model snapshots.

use std::collections::BTreeMap;

use ks_expr::{Signal, SignalTable};

use crate::frame::Frame;
use crate::snapshot::ModelSnapshot;

/// Build the flat signal table for one simulation run.
///
/// Frame fields become per-step series; snapshot geometry and parameters
/// become scalar signals that override trace keys of the same name.
pub fn build_signals(frames: &[Frame], snapshot: Option<&ModelSnapshot>) -> SignalTable {
    let mut table = signals_from_frames(frames);
    if let Some(snapshot) = snapshot {
        for (key, value) in model_variable_signals(snapshot) {
            table.insert(key, Signal::Scalar(value));
        }
    }
    table
}

fn signals_from_frames(frames: &[Frame]) -> SignalTable {
    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();
    for frame in frames {
        for (key, value) in frame.iter() {
            if key == "solver" || key == "time" {
                continue;
            }
            let Some(number) = value.as_num() else {
                continue;
            };
            if !series.contains_key(key) {
                order.push(key.to_string());
            }
            series.entry(key.to_string()).or_default().push(number);
        }
    }

    let mut table: SignalTable = SignalTable::new();
    // Load channels carry space-separated names ("load P9 Mag"); alias them
    // under dotted keys so expressions can reach them.
    for key in &order {
        let values = &series[key];
        if key.to_lowercase().starts_with("load ") {
            let alias = key.replace("load ", "load.").replace(' ', ".");
            table.insert(alias, Signal::Series(values.clone()));
        }
        table.insert(key.clone(), Signal::Series(values.clone()));
    }
    table
}

/// Scalar signals derived from the model snapshot itself: point positions,
/// link lengths, and named parameters.
pub fn model_variable_signals(snapshot: &ModelSnapshot) -> Vec<(String, f64)> {
    let mut signals = Vec::new();
    for point in &snapshot.points {
        signals.push((format!("P{}.x", point.id), point.x));
        signals.push((format!("P{}.y", point.id), point.y));
    }
    for link in &snapshot.links {
        signals.push((format!("Link{}.L", link.id), link.length));
    }
    for param in &snapshot.parameters {
        let name = param.name.trim();
        if name.is_empty() {
            continue;
        }
        signals.push((format!("Param.{name}"), param.value));
    }
    signals
}
