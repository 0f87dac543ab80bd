use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ks_model::CaseSpec;
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

fn store() -> (CaseRunStore, PathBuf) {
    let project_dir = unique_temp_dir("ks_store_project");
    fs::create_dir_all(&project_dir).expect("failed to create temp project dir");
    let store = CaseRunStore::new(&project_dir).expect("failed to create store");
    (store, project_dir)
}

fn spec_a() -> CaseSpec {
    CaseSpec {
        name: Some("crank sweep".to_string()),
        driver: json!({"kind": "angle", "deg_per_step": 2.0, "steps": 180}),
        solver: json!({"tol": 1e-9}),
        ..Default::default()
    }
}

#[test]
fn same_content_reuses_the_case() {
    let (store, _dir) = store();
    let first = store.get_or_create_case(&spec_a()).expect("create");
    let second = store.get_or_create_case(&spec_a()).expect("reuse");
    assert_eq!(first.case_id, second.case_id);
    assert_eq!(store.list_cases().len(), 1);
}

#[test]
fn renamed_spec_still_maps_to_the_same_case() {
    let (store, _dir) = store();
    let first = store.get_or_create_case(&spec_a()).expect("create");
    let mut renamed = spec_a();
    renamed.name = Some("crank sweep v2".to_string());
    let second = store.get_or_create_case(&renamed).expect("reuse");
    assert_eq!(first.case_id, second.case_id);
    // A hash hit keeps the stored display name.
    assert_eq!(second.name, "crank sweep");
    assert_eq!(store.find_case(&first.case_id).expect("listed").name, "crank sweep");
}

#[test]
fn different_content_makes_a_new_case() {
    let (store, _dir) = store();
    let first = store.get_or_create_case(&spec_a()).expect("create");
    let mut other = spec_a();
    other.loads = json!([{"point": 4, "fy": -9.81}]);
    let second = store.get_or_create_case(&other).expect("create other");
    assert_ne!(first.case_id, second.case_id);
    assert_eq!(store.list_cases().len(), 2);
}

#[test]
fn case_record_carries_identity_fields() {
    let (store, dir) = store();
    let info = store.get_or_create_case(&spec_a()).expect("create");
    let record = fs::read_to_string(dir.join("cases").join(format!("{}.case.json", info.case_id)))
        .expect("case record exists");
    let record: serde_json::Value = serde_json::from_str(&record).expect("valid json");
    assert_eq!(record["case_id"], json!(info.case_id));
    assert_eq!(record["schema_version"], json!("1.0"));
    assert_eq!(record["driver"]["kind"], json!("angle"));
}

#[test]
fn rename_case_id_moves_everything() {
    let (store, _dir) = store();
    let info = store.get_or_create_case(&spec_a()).expect("create");
    store.set_active_case(Some(&info.case_id)).expect("activate");

    assert!(store.rename_case_id(&info.case_id, "baseline").expect("rename"));
    assert!(store.find_case(&info.case_id).is_none());
    let renamed = store.find_case("baseline").expect("renamed case exists");
    assert_eq!(renamed.case_hash, info.case_hash);
    assert_eq!(store.active_case().as_deref(), Some("baseline"));
    assert_eq!(
        store.load_case_spec("baseline").driver["kind"],
        json!("angle")
    );
    assert_eq!(store.load_case_spec(&info.case_id), CaseSpec::default());

    // The content hash still resolves to the renamed case.
    let again = store.get_or_create_case(&spec_a()).expect("reuse");
    assert_eq!(again.case_id, "baseline");
}

#[test]
fn rename_rejects_bad_targets() {
    let (store, _dir) = store();
    let info = store.get_or_create_case(&spec_a()).expect("create");
    assert!(!store.rename_case_id(&info.case_id, "").expect("blank"));
    assert!(!store.rename_case_id(&info.case_id, "a/b").expect("separator"));
    assert!(!store.rename_case_id("nope", "fresh").expect("unknown old id"));
    assert!(!store
        .rename_case_id(&info.case_id, &info.case_id)
        .expect("same id"));
}

#[test]
fn delete_case_clears_index_and_active_marker() {
    let (store, _dir) = store();
    let info = store.get_or_create_case(&spec_a()).expect("create");
    store.set_active_case(Some(&info.case_id)).expect("activate");

    assert!(store.delete_case(&info.case_id).expect("delete"));
    assert!(store.list_cases().is_empty());
    assert!(store.active_case().is_none());
    assert!(!store.delete_case(&info.case_id).expect("second delete"));
}

#[test]
fn update_case_name_trims_and_validates() {
    let (store, _dir) = store();
    let info = store.get_or_create_case(&spec_a()).expect("create");
    assert!(store.update_case_name(&info.case_id, "  final  ").expect("rename"));
    assert_eq!(store.find_case(&info.case_id).unwrap().name, "final");
    assert!(!store.update_case_name(&info.case_id, "   ").expect("blank"));
    assert!(!store.update_case_name("nope", "x").expect("unknown id"));
}
