//! Store data types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One case as seen by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseInfo {
    pub case_id: String,
    pub name: String,
    pub created_utc: String,
    pub updated_utc: String,
    pub case_hash: String,
}

/// Persisted index of all cases in a project (`cases/index.json`).
/// Every field defaults so indexes from other schema versions still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CaseIndex {
    #[serde(default)]
    pub cases: Vec<CaseEntry>,
    #[serde(default)]
    pub hash_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CaseEntry {
    #[serde(default)]
    pub case_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_utc: String,
    #[serde(default)]
    pub updated_utc: String,
    #[serde(default)]
    pub case_hash: String,
}

impl CaseEntry {
    pub fn info(&self) -> CaseInfo {
        CaseInfo {
            case_id: self.case_id.clone(),
            name: self.name.clone(),
            created_utc: self.created_utc.clone(),
            updated_utc: self.updated_utc.clone(),
            case_hash: self.case_hash.clone(),
        }
    }
}

/// One run as reported by `list_runs`: identity plus whatever summary and
/// status fields could be read back (best-effort).
#[derive(Debug, Clone, Default)]
pub struct RunEntry {
    pub run_id: String,
    pub path: PathBuf,
    pub success: Option<bool>,
    pub n_steps: Option<usize>,
    pub success_rate: Option<f64>,
    pub max_hard_err: Option<f64>,
    pub elapsed_sec: Option<f64>,
    pub updated_utc: String,
}
