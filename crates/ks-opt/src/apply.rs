//! Routing of design-variable values into a model snapshot.

use std::collections::BTreeMap;

use ks_model::{ModelSnapshot, ParamEntry};

/// Apply a candidate assignment to a copy of `base`.
///
/// Variable names route by pattern: `Param.{name}` upserts into the
/// parameter list (triggering a full recompute of expression-derived
/// fields), `Link{id}.L` sets the link length directly, `P{id}.x|y` sets
/// the point coordinate directly. Unroutable names are ignored. A driven
/// link length is also written into any enabled length constraint for that
/// link; a missing constraint is reported through `warnings`.
pub fn apply_design_vars(
    base: &ModelSnapshot,
    variables: &BTreeMap<String, f64>,
    warnings: &mut Vec<String>,
) -> ModelSnapshot {
    let mut snapshot = base.clone();

    let mut point_vars: BTreeMap<(u32, char), f64> = BTreeMap::new();
    let mut link_vars: BTreeMap<u32, f64> = BTreeMap::new();
    let mut param_vars: BTreeMap<String, f64> = BTreeMap::new();

    for (name, value) in variables {
        if let Some(param) = name.strip_prefix("Param.") {
            if !param.is_empty() {
                param_vars.insert(param.to_string(), *value);
            }
        } else if let Some(id) = link_target(name) {
            link_vars.insert(id, *value);
        } else if let Some(target) = point_target(name) {
            point_vars.insert(target, *value);
        }
    }

    if !param_vars.is_empty() {
        for (name, value) in param_vars {
            match snapshot.parameters.iter_mut().find(|p| p.name == name) {
                Some(entry) => entry.value = value,
                None => snapshot.parameters.push(ParamEntry { name, value }),
            }
        }
        snapshot.recompute_from_parameters();
    }

    for point in &mut snapshot.points {
        if let Some(value) = point_vars.get(&(point.id, 'x')) {
            point.x = *value;
        }
        if let Some(value) = point_vars.get(&(point.id, 'y')) {
            point.y = *value;
        }
    }

    for link in &mut snapshot.links {
        if link.is_ref {
            continue;
        }
        if let Some(value) = link_vars.get(&link.id) {
            link.length = *value;
        }
    }
    for (id, length) in &link_vars {
        update_length_constraints(&mut snapshot, *id, *length, warnings);
    }

    snapshot
}

fn link_target(name: &str) -> Option<u32> {
    name.strip_prefix("Link")?.strip_suffix(".L")?.parse().ok()
}

fn point_target(name: &str) -> Option<(u32, char)> {
    let rest = name.strip_prefix('P')?;
    let (id, axis) = rest.split_once('.')?;
    let axis = match axis {
        "x" => 'x',
        "y" => 'y',
        _ => return None,
    };
    Some((id.parse().ok()?, axis))
}

/// Mirror a driven link length into the solver constraint that pins it.
fn update_length_constraints(
    snapshot: &mut ModelSnapshot,
    link_id: u32,
    new_length: f64,
    warnings: &mut Vec<String>,
) {
    let mut matched = false;
    for constraint in &mut snapshot.constraints {
        if !matches!(constraint.kind.to_lowercase().as_str(), "length" | "link_length" | "link") {
            continue;
        }
        if constraint.id != Some(i64::from(link_id)) {
            continue;
        }
        if !constraint.enabled {
            continue;
        }
        constraint.value = new_length;
        matched = true;
    }
    if !matched {
        warnings.push(format!("length constraint not found for Link{link_id}.L"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_model::{Link, Point, SnapshotConstraint};

    fn base() -> ModelSnapshot {
        ModelSnapshot {
            points: vec![
                Point {
                    id: 1,
                    x: 0.0,
                    y: 0.0,
                    x_expr: None,
                    y_expr: None,
                },
                Point {
                    id: 2,
                    x: 1.0,
                    y: 1.0,
                    x_expr: Some("arm * 2".to_string()),
                    y_expr: None,
                },
            ],
            links: vec![
                Link {
                    id: 3,
                    length: 5.0,
                    length_expr: None,
                    is_ref: false,
                },
                Link {
                    id: 4,
                    length: 7.0,
                    length_expr: None,
                    is_ref: true,
                },
            ],
            parameters: vec![ParamEntry {
                name: "arm".to_string(),
                value: 1.0,
            }],
            constraints: vec![SnapshotConstraint {
                kind: "length".to_string(),
                id: Some(3),
                value: 5.0,
                enabled: true,
            }],
            ..Default::default()
        }
    }

    fn vars(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn point_coordinates_are_set_directly() {
        let mut warnings = Vec::new();
        let out = apply_design_vars(&base(), &vars(&[("P1.x", 2.5), ("P1.y", -1.0)]), &mut warnings);
        assert_eq!(out.points[0].x, 2.5);
        assert_eq!(out.points[0].y, -1.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn param_upsert_triggers_recompute() {
        let mut warnings = Vec::new();
        let out = apply_design_vars(&base(), &vars(&[("Param.arm", 3.0)]), &mut warnings);
        assert_eq!(out.parameters[0].value, 3.0);
        // P2.x is derived from "arm * 2".
        assert_eq!(out.points[1].x, 6.0);
    }

    #[test]
    fn unknown_param_is_appended() {
        let mut warnings = Vec::new();
        let out = apply_design_vars(&base(), &vars(&[("Param.offset", 0.5)]), &mut warnings);
        assert!(out.parameters.iter().any(|p| p.name == "offset" && p.value == 0.5));
    }

    #[test]
    fn link_length_updates_link_and_constraint() {
        let mut warnings = Vec::new();
        let out = apply_design_vars(&base(), &vars(&[("Link3.L", 9.0)]), &mut warnings);
        assert_eq!(out.links[0].length, 9.0);
        assert_eq!(out.constraints[0].value, 9.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn ref_links_are_never_driven() {
        let mut warnings = Vec::new();
        let out = apply_design_vars(&base(), &vars(&[("Link4.L", 9.0)]), &mut warnings);
        assert_eq!(out.links[1].length, 7.0);
        assert_eq!(warnings, vec!["length constraint not found for Link4.L"]);
    }

    #[test]
    fn unroutable_names_are_ignored() {
        let mut warnings = Vec::new();
        let out = apply_design_vars(
            &base(),
            &vars(&[("nonsense", 1.0), ("LinkX.L", 2.0), ("P9.z", 3.0)]),
            &mut warnings,
        );
        assert_eq!(out, base());
        assert!(warnings.is_empty());
    }

    #[test]
    fn base_snapshot_is_untouched() {
        let original = base();
        let mut warnings = Vec::new();
        let _ = apply_design_vars(&original, &vars(&[("P1.x", 99.0)]), &mut warnings);
        assert_eq!(original.points[0].x, 0.0);
    }
}
