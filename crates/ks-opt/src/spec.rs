//! Search problem description.

use serde::{Deserialize, Serialize};

/// A named, bounded scalar the search may choose per trial.
///
/// The name encodes the target inside the model snapshot: `P{id}.x|y` for a
/// point coordinate, `Link{id}.L` for a link length, `Param.{name}` for a
/// named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVariable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub expression: String,
    pub direction: Direction,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Case scope; `None` means every available case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub expression: String,
    pub comparator: Comparator,
    pub limit: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_ids: Option<Vec<String>>,
}

/// Everything a search run needs besides the model and the case specs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    #[serde(default)]
    pub variables: Vec<DesignVariable>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveSpec>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
    /// Trial budget; clamped to at least one.
    #[serde(default)]
    pub evals: usize,
    /// Explicit seed for reproducible searches; unseeded runs draw from the
    /// OS entropy source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comparator_serializes_as_operator_text() {
        let spec = ConstraintSpec {
            expression: "max(hard_err)".to_string(),
            comparator: Comparator::Le,
            limit: 1e-6,
            enabled: true,
            case_ids: None,
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["comparator"], json!("<="));
        let back: ConstraintSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back.comparator, Comparator::Le);
    }

    #[test]
    fn enabled_defaults_to_true() {
        let var: DesignVariable = serde_json::from_value(json!({
            "name": "Param.arm",
            "lower": 0.1,
            "upper": 2.0,
        }))
        .unwrap();
        assert!(var.enabled);
        assert!(var.case_ids.is_none());
    }

    #[test]
    fn direction_is_lowercase_text() {
        let obj: ObjectiveSpec = serde_json::from_value(json!({
            "expression": "mean(P4.y)",
            "direction": "max",
        }))
        .unwrap();
        assert_eq!(obj.direction, Direction::Max);
    }
}
