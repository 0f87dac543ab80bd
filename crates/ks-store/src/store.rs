//! Case and run storage API.

use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use chrono::Utc;
use ks_model::{CaseSpec, Frame, FrameValue, ModelSnapshot, RunStatus};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::hash::{case_hash, case_id_from_hash};
use crate::summary::build_summary;
use crate::types::{CaseEntry, CaseIndex, CaseInfo, RunEntry};
use crate::{RunSummary, StoreResult};

const SCHEMA_VERSION: &str = "1.0";

#[derive(Clone)]
pub struct CaseRunStore {
    cases_dir: PathBuf,
    runs_dir: PathBuf,
}

impl CaseRunStore {
    pub fn new(project_dir: &Path) -> StoreResult<Self> {
        let cases_dir = project_dir.join("cases");
        let runs_dir = project_dir.join("runs");
        if !cases_dir.exists() {
            fs::create_dir_all(&cases_dir)?;
        }
        if !runs_dir.exists() {
            fs::create_dir_all(&runs_dir)?;
        }
        Ok(Self {
            cases_dir,
            runs_dir,
        })
    }

    pub fn cases_dir(&self) -> &Path {
        &self.cases_dir
    }

    pub fn runs_dir(&self) -> &Path {
        &self.runs_dir
    }

    fn index_path(&self) -> PathBuf {
        self.cases_dir.join("index.json")
    }

    fn case_record_path(&self, case_id: &str) -> PathBuf {
        self.cases_dir.join(format!("{case_id}.case.json"))
    }

    fn case_runs_dir(&self, case_id: &str) -> PathBuf {
        self.runs_dir.join(case_id)
    }

    fn active_case_path(&self) -> PathBuf {
        self.cases_dir.join("active_case.txt")
    }

    fn last_run_marker(&self) -> PathBuf {
        self.runs_dir.join("last_run.txt")
    }

    fn load_index(&self) -> CaseIndex {
        read_json_or_default(&self.index_path())
    }

    fn save_index(&self, index: &CaseIndex) -> StoreResult<()> {
        write_json(&self.index_path(), index)
    }

    /// Look up the case matching `spec` by content hash, creating it when it
    /// does not exist yet. Either way the on-disk case record is refreshed.
    pub fn get_or_create_case(&self, spec: &CaseSpec) -> StoreResult<CaseInfo> {
        let hash = case_hash(spec);
        let now = now_utc();
        let mut index = self.load_index();

        if let Some(case_id) = index.hash_map.get(&hash).cloned() {
            if let Some(entry) = index.cases.iter_mut().find(|e| e.case_id == case_id) {
                // Hash hit keeps the stored display name; update_case_name
                // is the only rename path.
                entry.updated_utc = now;
                let info = entry.info();
                self.write_case_record(spec, &info)?;
                self.save_index(&index)?;
                return Ok(info);
            }
            // Stale hash_map entry: fall through and recreate the case.
            index.hash_map.remove(&hash);
        }

        let case_id = case_id_from_hash(&hash);
        let name = spec
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("case {case_id}"));
        let entry = CaseEntry {
            case_id: case_id.clone(),
            name,
            created_utc: now.clone(),
            updated_utc: now,
            case_hash: hash.clone(),
        };
        let info = entry.info();
        index.cases.push(entry);
        index.hash_map.insert(hash, case_id);
        self.write_case_record(spec, &info)?;
        self.save_index(&index)?;
        Ok(info)
    }

    /// Persist the resolved case record: the spec plus identity and
    /// bookkeeping fields, as one sorted-key JSON object.
    fn write_case_record(&self, spec: &CaseSpec, info: &CaseInfo) -> StoreResult<()> {
        let mut record = match serde_json::to_value(spec)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        record.insert("schema_version".into(), SCHEMA_VERSION.into());
        record.insert("case_id".into(), info.case_id.clone().into());
        record.insert("name".into(), info.name.clone().into());
        record.insert("created_utc".into(), info.created_utc.clone().into());
        record.insert("updated_utc".into(), info.updated_utc.clone().into());
        write_json(&self.case_record_path(&info.case_id), &record)
    }

    /// All known cases, most recently updated first.
    pub fn list_cases(&self) -> Vec<CaseInfo> {
        let index = self.load_index();
        let mut cases: Vec<CaseInfo> = index.cases.iter().map(CaseEntry::info).collect();
        cases.sort_by(|a, b| b.updated_utc.cmp(&a.updated_utc));
        cases
    }

    pub fn find_case(&self, case_id: &str) -> Option<CaseInfo> {
        self.load_index()
            .cases
            .iter()
            .find(|e| e.case_id == case_id)
            .map(CaseEntry::info)
    }

    /// Set the display name of a case. Returns false for an unknown id or a
    /// blank name.
    pub fn update_case_name(&self, case_id: &str, name: &str) -> StoreResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        let mut index = self.load_index();
        let Some(entry) = index.cases.iter_mut().find(|e| e.case_id == case_id) else {
            return Ok(false);
        };
        entry.name = name.to_string();
        entry.updated_utc = now_utc();
        let info = entry.info();
        self.save_index(&index)?;

        // Keep the on-disk record consistent if one exists.
        if let Some(mut record) =
            read_json_opt::<serde_json::Map<String, serde_json::Value>>(
                &self.case_record_path(case_id),
            )
        {
            record.insert("name".into(), info.name.into());
            record.insert("updated_utc".into(), info.updated_utc.into());
            write_json(&self.case_record_path(case_id), &record)?;
        }
        Ok(true)
    }

    /// Relabel a case id everywhere it appears: index, case record, runs
    /// directory, active-case marker and last-run marker. Returns false when
    /// the old id is unknown, the new id is invalid or already taken.
    pub fn rename_case_id(&self, old_id: &str, new_id: &str) -> StoreResult<bool> {
        let new_id = new_id.trim();
        if new_id.is_empty()
            || new_id.contains(['/', '\\'])
            || new_id == old_id
            || self.find_case(new_id).is_some()
        {
            return Ok(false);
        }
        let mut index = self.load_index();
        let Some(entry) = index.cases.iter_mut().find(|e| e.case_id == old_id) else {
            return Ok(false);
        };
        entry.case_id = new_id.to_string();
        entry.updated_utc = now_utc();
        let info = entry.info();
        for mapped in index.hash_map.values_mut() {
            if mapped == old_id {
                *mapped = new_id.to_string();
            }
        }
        self.save_index(&index)?;

        let old_record = self.case_record_path(old_id);
        if let Some(mut record) =
            read_json_opt::<serde_json::Map<String, serde_json::Value>>(&old_record)
        {
            record.insert("case_id".into(), new_id.into());
            record.insert("updated_utc".into(), info.updated_utc.into());
            write_json(&self.case_record_path(new_id), &record)?;
            fs::remove_file(&old_record)?;
        }

        let old_runs = self.case_runs_dir(old_id);
        if old_runs.exists() {
            fs::rename(&old_runs, self.case_runs_dir(new_id))?;
        }

        if self.active_case().as_deref() == Some(old_id) {
            self.set_active_case(Some(new_id))?;
        }

        // Last-run marker stores an absolute path that may pass through the
        // old case directory.
        if let Ok(marker) = fs::read_to_string(self.last_run_marker()) {
            let needle = format!("{MAIN_SEPARATOR}{old_id}{MAIN_SEPARATOR}");
            if marker.contains(&needle) {
                let replacement = format!("{MAIN_SEPARATOR}{new_id}{MAIN_SEPARATOR}");
                fs::write(self.last_run_marker(), marker.replace(&needle, &replacement))?;
            }
        }
        Ok(true)
    }

    /// Delete every run of a case, keeping the case itself. Clears the
    /// last-run marker if it pointed inside the deleted tree.
    pub fn delete_case_runs(&self, case_id: &str) -> StoreResult<bool> {
        let dir = self.case_runs_dir(case_id);
        if !dir.exists() {
            return Ok(false);
        }
        if let Some(last) = self.last_run_path()
            && last.starts_with(dir.canonicalize().unwrap_or_else(|_| dir.clone()))
        {
            fs::write(self.last_run_marker(), "")?;
        }
        fs::remove_dir_all(dir)?;
        Ok(true)
    }

    /// Delete a case and all of its runs.
    pub fn delete_case(&self, case_id: &str) -> StoreResult<bool> {
        let mut index = self.load_index();
        let before = index.cases.len();
        index.cases.retain(|e| e.case_id != case_id);
        if index.cases.len() == before {
            return Ok(false);
        }
        index.hash_map.retain(|_, mapped| mapped != case_id);
        self.save_index(&index)?;

        let record = self.case_record_path(case_id);
        if record.exists() {
            fs::remove_file(record)?;
        }
        self.delete_case_runs(case_id)?;
        if self.active_case().as_deref() == Some(case_id) {
            self.set_active_case(None)?;
        }
        Ok(true)
    }

    pub fn set_active_case(&self, case_id: Option<&str>) -> StoreResult<()> {
        fs::write(self.active_case_path(), case_id.unwrap_or(""))?;
        Ok(())
    }

    pub fn active_case(&self) -> Option<String> {
        let text = fs::read_to_string(self.active_case_path()).ok()?;
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Case spec as persisted on disk; an unknown id loads as the default
    /// (empty) spec.
    pub fn load_case_spec(&self, case_id: &str) -> CaseSpec {
        read_json_or_default(&self.case_record_path(case_id))
    }

    /// Persist one completed run, resolving or creating its case from the
    /// spec. Returns the run directory.
    ///
    /// Run directories are append-only: each save mints a fresh id from the
    /// UTC timestamp plus a random suffix, so history is never overwritten.
    pub fn save_run(
        &self,
        spec: &CaseSpec,
        model: &ModelSnapshot,
        model_end: Option<&ModelSnapshot>,
        frames: &[Frame],
        status: &RunStatus,
    ) -> StoreResult<PathBuf> {
        let info = self.get_or_create_case(spec)?;
        let run_id = new_run_id();
        let run_dir = self.case_runs_dir(&info.case_id).join(&run_id);
        let results_dir = run_dir.join("results");
        fs::create_dir_all(&results_dir)?;

        write_json(&run_dir.join("model.json"), model)?;
        if let Some(end) = model_end {
            write_json(&run_dir.join("model_end.json"), end)?;
        }
        self.write_run_case_record(&run_dir, spec, &info)?;
        write_json(&run_dir.join("status.json"), status)?;

        let mut log = status.reason.clone();
        if let Some(err) = &status.solver_error {
            log.push_str("\nsolver_error: ");
            log.push_str(err);
        }
        fs::write(run_dir.join("log.txt"), log)?;

        fs::write(results_dir.join("frames.csv"), frames_to_csv(frames))?;
        write_json(
            &results_dir.join("summary.json"),
            &build_summary(frames, status),
        )?;

        let absolute = run_dir.canonicalize().unwrap_or_else(|_| run_dir.clone());
        fs::write(self.last_run_marker(), absolute.to_string_lossy().as_bytes())?;
        Ok(run_dir)
    }

    fn write_run_case_record(
        &self,
        run_dir: &Path,
        spec: &CaseSpec,
        info: &CaseInfo,
    ) -> StoreResult<()> {
        let mut record = match serde_json::to_value(spec)? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        record.insert("schema_version".into(), SCHEMA_VERSION.into());
        record.insert("case_id".into(), info.case_id.clone().into());
        record.insert("name".into(), info.name.clone().into());
        record.insert("created_utc".into(), info.created_utc.clone().into());
        record.insert("updated_utc".into(), info.updated_utc.clone().into());
        write_json(&run_dir.join("case.json"), &record)
    }

    /// Runs of a case, newest first. Summary and status fields are filled in
    /// on a best-effort basis; a run with unreadable artifacts still lists.
    pub fn list_runs(&self, case_id: &str) -> StoreResult<Vec<RunEntry>> {
        let dir = self.case_runs_dir(case_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut run_ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                run_ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        // Run ids start with a UTC timestamp, so name order is time order.
        run_ids.sort_by(|a, b| b.cmp(a));

        let mut runs = Vec::new();
        for run_id in run_ids {
            let path = dir.join(&run_id);
            let summary: Option<RunSummary> = read_json_opt(&path.join("results/summary.json"));
            let status: Option<RunStatus> = read_json_opt(&path.join("status.json"));
            runs.push(RunEntry {
                run_id,
                success: summary
                    .as_ref()
                    .map(|s| s.success)
                    .or_else(|| status.as_ref().map(|s| s.success)),
                n_steps: summary.as_ref().map(|s| s.n_steps),
                success_rate: summary.as_ref().map(|s| s.success_rate),
                max_hard_err: summary.as_ref().map(|s| s.max_hard_err),
                elapsed_sec: summary
                    .as_ref()
                    .map(|s| s.elapsed_sec)
                    .or_else(|| status.as_ref().map(|s| s.elapsed_sec)),
                updated_utc: status.map(|s| s.finished_utc).unwrap_or_default(),
                path,
            });
        }
        Ok(runs)
    }

    pub fn latest_run_for_case(&self, case_id: &str) -> StoreResult<Option<RunEntry>> {
        Ok(self.list_runs(case_id)?.into_iter().next())
    }

    /// Ending geometry of the most recent run, preferring `model_end.json`
    /// over the starting snapshot.
    pub fn load_latest_model_snapshot(
        &self,
        case_id: &str,
    ) -> StoreResult<Option<ModelSnapshot>> {
        let Some(run) = self.latest_run_for_case(case_id)? else {
            return Ok(None);
        };
        if let Some(end) = read_json_opt(&run.path.join("model_end.json")) {
            return Ok(Some(end));
        }
        Ok(read_json_opt(&run.path.join("model.json")))
    }

    pub fn last_run_path(&self) -> Option<PathBuf> {
        let text = fs::read_to_string(self.last_run_marker()).ok()?;
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(PathBuf::from(text))
        }
    }
}

fn now_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn new_run_id() -> String {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let suffix = rand::random::<u32>() & 0x00ff_ffff;
    format!("{stamp}_{suffix:06x}")
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    read_json_opt(path).unwrap_or_default()
}

fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Pretty JSON with sorted object keys. Round-tripping through `Value` sorts
/// because its object type is a BTreeMap.
fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let value = serde_json::to_value(value)?;
    fs::write(path, serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

/// Frames as CSV. Column order is first-seen field order across the whole
/// run; frames missing a column leave the cell empty.
fn frames_to_csv(frames: &[Frame]) -> String {
    let mut columns: Vec<String> = Vec::new();
    for frame in frames {
        for (key, _) in frame.iter() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&columns.join(","));
    out.push('\n');
    for frame in frames {
        let row: Vec<String> = columns
            .iter()
            .map(|col| frame.get(col).map(csv_cell).unwrap_or_default())
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_cell(value: &FrameValue) -> String {
    match value {
        FrameValue::Null => String::new(),
        FrameValue::Bool(flag) => flag.to_string(),
        FrameValue::Num(number) => format!("{number}"),
        FrameValue::Text(text) => {
            if text.contains([',', '"', '\n']) {
                format!("\"{}\"", text.replace('"', "\"\""))
            } else {
                text.clone()
            }
        }
    }
}
