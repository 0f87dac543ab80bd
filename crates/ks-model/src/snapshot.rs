//! Serialized sketch model: geometry, dimensions, parameters.
//!
//! All fields are `#[serde(default)]` so snapshots written by other schema
//! versions still load; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::registry::ParameterRegistry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub angles: Vec<AngleDim>,
    #[serde(default)]
    pub parameters: Vec<ParamEntry>,
    #[serde(default)]
    pub constraints: Vec<SnapshotConstraint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_expr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: u32,
    /// Link length. Reference links (`ref`) mirror solved geometry and are
    /// never driven by expressions or design variables.
    #[serde(rename = "L", default)]
    pub length: f64,
    #[serde(rename = "L_expr", default, skip_serializing_if = "Option::is_none")]
    pub length_expr: Option<String>,
    #[serde(rename = "ref", default)]
    pub is_ref: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleDim {
    pub id: u32,
    #[serde(default)]
    pub deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deg_expr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: f64,
}

/// Solver-side constraint mirrored in the snapshot. Length constraints are
/// kept in sync when a design variable drives the matching link length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConstraint {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub value: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SnapshotConstraint {
    fn default() -> Self {
        Self {
            kind: String::new(),
            id: None,
            value: 0.0,
            enabled: true,
        }
    }
}

impl ModelSnapshot {
    /// Re-derive every expression-backed numeric field from the current
    /// parameter list. Failed evaluations leave the stored number as-is.
    pub fn recompute_from_parameters(&mut self) {
        let mut registry = ParameterRegistry::new();
        registry.load_list(&self.parameters);

        for point in &mut self.points {
            if let Some(value) = eval_opt(&registry, point.x_expr.as_deref()) {
                point.x = value;
            }
            if let Some(value) = eval_opt(&registry, point.y_expr.as_deref()) {
                point.y = value;
            }
        }
        for link in &mut self.links {
            if link.is_ref {
                continue;
            }
            if let Some(value) = eval_opt(&registry, link.length_expr.as_deref()) {
                link.length = value;
            }
        }
        for angle in &mut self.angles {
            if let Some(value) = eval_opt(&registry, angle.deg_expr.as_deref()) {
                angle.deg = value;
            }
        }
    }
}

fn eval_opt(registry: &ParameterRegistry, expr: Option<&str>) -> Option<f64> {
    let expr = expr?.trim();
    if expr.is_empty() {
        return None;
    }
    registry.eval(expr).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_derives_expression_fields() {
        let mut snapshot = ModelSnapshot {
            points: vec![Point {
                id: 1,
                x: 0.0,
                y: 0.0,
                x_expr: Some("w * 2".to_string()),
                y_expr: None,
            }],
            links: vec![
                Link {
                    id: 3,
                    length: 10.0,
                    length_expr: Some("w + 1".to_string()),
                    is_ref: false,
                },
                Link {
                    id: 4,
                    length: 99.0,
                    length_expr: Some("w".to_string()),
                    is_ref: true,
                },
            ],
            angles: vec![AngleDim {
                id: 7,
                deg: 0.0,
                deg_expr: Some("w * 10".to_string()),
            }],
            parameters: vec![ParamEntry {
                name: "w".to_string(),
                value: 5.0,
            }],
            constraints: vec![],
        };

        snapshot.recompute_from_parameters();

        assert_eq!(snapshot.points[0].x, 10.0);
        assert_eq!(snapshot.points[0].y, 0.0);
        assert_eq!(snapshot.links[0].length, 6.0);
        // Reference links are never expression-driven.
        assert_eq!(snapshot.links[1].length, 99.0);
        assert_eq!(snapshot.angles[0].deg, 50.0);
    }

    #[test]
    fn recompute_keeps_value_on_bad_expression() {
        let mut snapshot = ModelSnapshot {
            points: vec![Point {
                id: 1,
                x: 3.0,
                y: 0.0,
                x_expr: Some("missing_param".to_string()),
                y_expr: None,
            }],
            ..Default::default()
        };
        snapshot.recompute_from_parameters();
        assert_eq!(snapshot.points[0].x, 3.0);
    }

    #[test]
    fn lenient_deserialization() {
        let snapshot: ModelSnapshot = serde_json::from_str(
            r#"{"points":[{"id":2,"x":1.5,"unknown_field":true}],"future_section":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.points.len(), 1);
        assert_eq!(snapshot.points[0].x, 1.5);
        assert!(snapshot.links.is_empty());
    }

    #[test]
    fn link_field_names_round_trip() {
        let link = Link {
            id: 1,
            length: 2.0,
            length_expr: None,
            is_ref: true,
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["L"], 2.0);
        assert_eq!(json["ref"], true);
    }
}
