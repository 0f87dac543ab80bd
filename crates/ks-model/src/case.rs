//! Simulation case specification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable description of one simulation setup.
///
/// The eight content fields (`driver` … `measurements`) define case
/// identity; `name` is display-only and never affects the content hash.
/// They stay loosely typed (`serde_json::Value`): their internals belong to
/// the simulator, the core only hashes and persists them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub driver: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub drivers: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub outputs: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub sweep: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub solver: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub loads: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub measurements: Value,
}
