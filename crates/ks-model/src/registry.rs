//! Named parameter store with safe expression derivation.

use std::collections::BTreeMap;

use ks_expr::{ExprResult, eval_param_expr};

use crate::snapshot::ParamEntry;
use crate::{ModelError, ModelResult};

pub(crate) fn is_valid_param_name(name: &str) -> bool {
    let name = name.trim();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Case-sensitive name → value store backing expression-derived geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterRegistry {
    params: BTreeMap<String, f64>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a parameter. Fails on an invalid name; invalid
    /// names must never corrupt the registry.
    pub fn set(&mut self, name: &str, value: f64) -> ModelResult<()> {
        if !is_valid_param_name(name) {
            return Err(ModelError::InvalidParamName(name.to_string()));
        }
        self.params.insert(name.trim().to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// Delete a parameter; absent names are a no-op.
    pub fn delete(&mut self, name: &str) {
        self.params.remove(name);
    }

    /// Rename preserving the value. No-op when `old` is absent; fails on an
    /// invalid `new` name.
    pub fn rename(&mut self, old: &str, new: &str) -> ModelResult<()> {
        if !self.params.contains_key(old) {
            return Ok(());
        }
        if !is_valid_param_name(new) {
            return Err(ModelError::InvalidParamName(new.to_string()));
        }
        if let Some(value) = self.params.remove(old) {
            self.params.insert(new.trim().to_string(), value);
        }
        Ok(())
    }

    /// Ordered (by name) list for serialization.
    pub fn to_list(&self) -> Vec<ParamEntry> {
        self.params
            .iter()
            .map(|(name, value)| ParamEntry {
                name: name.clone(),
                value: *value,
            })
            .collect()
    }

    /// Replace contents from persisted entries, silently skipping malformed
    /// ones. Persisted data may come from a newer or older schema.
    pub fn load_list(&mut self, items: &[ParamEntry]) {
        self.params.clear();
        for item in items {
            let name = item.name.trim();
            if is_valid_param_name(name) {
                self.params.insert(name.to_string(), item.value);
            }
        }
    }

    /// Evaluate an expression against the current values.
    pub fn eval(&self, expr: &str) -> ExprResult<f64> {
        eval_param_expr(expr, &self.params)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_expr::ExprError;

    #[test]
    fn set_then_eval_returns_value() {
        let mut registry = ParameterRegistry::new();
        registry.set("width", 42.5).unwrap();
        assert_eq!(registry.eval("width"), Ok(42.5));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut registry = ParameterRegistry::new();
        for name in ["", "1abc", "a-b", "a b", "a.b"] {
            assert!(registry.set(name, 1.0).is_err(), "{name:?}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn delete_is_noop_when_absent() {
        let mut registry = ParameterRegistry::new();
        registry.delete("missing");
        registry.set("a", 1.0).unwrap();
        registry.delete("a");
        assert_eq!(registry.get("a"), None);
    }

    #[test]
    fn rename_preserves_value() {
        let mut registry = ParameterRegistry::new();
        registry.set("old", 7.0).unwrap();
        registry.rename("old", "new").unwrap();
        assert_eq!(registry.get("old"), None);
        assert_eq!(registry.get("new"), Some(7.0));

        // Absent source is a no-op, even with a bad target name.
        registry.rename("missing", "!!").unwrap();
        // Present source with a bad target fails and keeps the value.
        assert!(registry.rename("new", "9bad").is_err());
        assert_eq!(registry.get("new"), Some(7.0));
    }

    #[test]
    fn load_list_skips_malformed_entries() {
        let mut registry = ParameterRegistry::new();
        registry.set("stale", 1.0).unwrap();
        registry.load_list(&[
            ParamEntry {
                name: "good".to_string(),
                value: 2.0,
            },
            ParamEntry {
                name: "2bad".to_string(),
                value: 3.0,
            },
            ParamEntry {
                name: "  padded  ".to_string(),
                value: 4.0,
            },
        ]);
        assert_eq!(registry.get("stale"), None);
        assert_eq!(registry.get("good"), Some(2.0));
        assert_eq!(registry.get("2bad"), None);
        assert_eq!(registry.get("padded"), Some(4.0));
    }

    #[test]
    fn to_list_is_sorted_by_name() {
        let mut registry = ParameterRegistry::new();
        registry.set("b", 2.0).unwrap();
        registry.set("a", 1.0).unwrap();
        let names: Vec<_> = registry.to_list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn eval_reports_unknown_symbols() {
        let registry = ParameterRegistry::new();
        assert_eq!(
            registry.eval("ghost"),
            Err(ExprError::UnknownSymbols("ghost".to_string()))
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn set_eval_round_trip(
                name in "[A-Za-z_][A-Za-z0-9_]{0,15}",
                value in -1.0e12f64..1.0e12,
            ) {
                // Guard against colliding with the evaluator's constants.
                prop_assume!(name != "pi" && name != "E");
                let mut registry = ParameterRegistry::new();
                registry.set(&name, value).unwrap();
                prop_assert_eq!(registry.eval(&name).unwrap(), value);
            }
        }
    }
}
