use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ks_model::{CaseSpec, Frame, ModelSnapshot, RunStatus};
use ks_store::CaseRunStore;
use serde_json::json;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn store() -> CaseRunStore {
    let project_dir = unique_temp_dir("ks_store_runs");
    fs::create_dir_all(&project_dir).expect("failed to create temp project dir");
    CaseRunStore::new(&project_dir).expect("failed to create store")
}

fn snapshot() -> ModelSnapshot {
    serde_json::from_value(json!({
        "points": [
            {"id": 1, "x": 0.0, "y": 0.0},
            {"id": 2, "x": 1.0, "y": 0.5, "x_expr": "arm"},
        ],
        "links": [{"id": 1, "L": 1.25}],
        "parameters": [{"name": "arm", "value": 1.0}],
    }))
    .expect("snapshot json")
}

fn frames() -> Vec<Frame> {
    (0..4)
        .map(|step| {
            let mut frame = Frame::new();
            frame.set("time", step as f64 * 0.1);
            frame.set("P2.x", 1.0 + step as f64);
            frame.set("success", true);
            frame.set("hard_err", 1e-9 * step as f64);
            frame
        })
        .collect()
}

fn status() -> RunStatus {
    RunStatus {
        success: true,
        elapsed_sec: 0.75,
        fail_reason_hist: Default::default(),
        reason: "completed".to_string(),
        solver_error: None,
        finished_utc: "2026-08-29T12:00:00Z".to_string(),
    }
}

#[test]
fn save_run_writes_all_artifacts() {
    let store = store();
    let spec = CaseSpec {
        name: Some("roundtrip".to_string()),
        driver: json!({"kind": "angle"}),
        ..Default::default()
    };

    let run_dir = store
        .save_run(&spec, &snapshot(), Some(&snapshot()), &frames(), &status())
        .expect("save run");

    for artifact in [
        "model.json",
        "model_end.json",
        "case.json",
        "status.json",
        "log.txt",
        "results/frames.csv",
        "results/summary.json",
    ] {
        assert!(run_dir.join(artifact).exists(), "missing {artifact}");
    }

    let csv = fs::read_to_string(run_dir.join("results/frames.csv")).expect("csv");
    assert!(csv.starts_with("time,P2.x,success,hard_err\n"));
    assert_eq!(csv.lines().count(), 5);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(run_dir.join("results/summary.json")).unwrap())
            .expect("summary json");
    assert_eq!(summary["n_steps"], json!(4));
    assert_eq!(summary["success_rate"], json!(1.0));
}

#[test]
fn runs_are_append_only_and_listed_newest_first() {
    let store = store();
    let spec = CaseSpec::default();
    let info = store.get_or_create_case(&spec).expect("case");

    let first = store
        .save_run(&spec, &snapshot(), None, &frames(), &status())
        .expect("first run");
    let second = store
        .save_run(&spec, &snapshot(), None, &frames(), &status())
        .expect("second run");
    assert_ne!(first, second);

    let runs = store.list_runs(&info.case_id).expect("list");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].success, Some(true));
    assert_eq!(runs[0].n_steps, Some(4));
    // Newest first by id, which sorts by timestamp.
    assert!(runs[0].run_id >= runs[1].run_id);

    let latest = store
        .latest_run_for_case(&info.case_id)
        .expect("latest")
        .expect("one exists");
    assert_eq!(latest.run_id, runs[0].run_id);

    let marker = store.last_run_path().expect("marker");
    assert!(marker.ends_with(&latest.run_id));
}

#[test]
fn latest_snapshot_prefers_model_end() {
    let store = store();
    let spec = CaseSpec::default();
    let info = store.get_or_create_case(&spec).expect("case");

    let mut end = snapshot();
    end.points[0].x = 42.0;
    store
        .save_run(&spec, &snapshot(), Some(&end), &frames(), &status())
        .expect("save");

    let loaded = store
        .load_latest_model_snapshot(&info.case_id)
        .expect("load")
        .expect("present");
    assert_eq!(loaded.points[0].x, 42.0);
}

#[test]
fn delete_case_runs_keeps_the_case() {
    let store = store();
    let spec = CaseSpec::default();
    let info = store.get_or_create_case(&spec).expect("case");
    store
        .save_run(&spec, &snapshot(), None, &frames(), &status())
        .expect("save");

    assert!(store.delete_case_runs(&info.case_id).expect("delete runs"));
    assert!(store.list_runs(&info.case_id).expect("list").is_empty());
    assert!(store.find_case(&info.case_id).is_some());
    assert!(store.last_run_path().is_none());
    assert!(!store.delete_case_runs(&info.case_id).expect("already gone"));
}

#[test]
fn log_includes_solver_error_when_present() {
    let store = store();
    let spec = CaseSpec::default();
    let info = store.get_or_create_case(&spec).expect("case");

    let mut failed = status();
    failed.success = false;
    failed.reason = "diverged at step 3".to_string();
    failed.solver_error = Some("singular jacobian".to_string());

    let run_dir = store
        .save_run(&spec, &snapshot(), None, &[], &failed)
        .expect("save");
    let log = fs::read_to_string(run_dir.join("log.txt")).expect("log");
    assert_eq!(log, "diverged at step 3\nsolver_error: singular jacobian");
}
