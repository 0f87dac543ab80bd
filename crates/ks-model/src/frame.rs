//! Dynamic per-step simulation records.
//!
//! Field names are unknown until runtime, so a frame is an ordered mapping
//! from name to a loosely typed scalar rather than a fixed record type.
//! First-seen field order is preserved; it determines CSV column order when
//! frames are persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameValue {
    Null,
    Bool(bool),
    Num(f64),
    Text(String),
}

impl FrameValue {
    /// Numeric view: booleans coerce to 0/1, text and null do not count.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            FrameValue::Num(value) => Some(*value),
            FrameValue::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            FrameValue::Text(_) | FrameValue::Null => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FrameValue::Num(value) => *value != 0.0,
            FrameValue::Bool(flag) => *flag,
            FrameValue::Text(text) => !text.is_empty(),
            FrameValue::Null => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FrameValue::Null)
    }
}

impl From<f64> for FrameValue {
    fn from(value: f64) -> Self {
        FrameValue::Num(value)
    }
}

impl From<bool> for FrameValue {
    fn from(flag: bool) -> Self {
        FrameValue::Bool(flag)
    }
}

impl From<&str> for FrameValue {
    fn from(text: &str) -> Self {
        FrameValue::Text(text.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    fields: Vec<(String, FrameValue)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field, keeping first-seen position on overwrite.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FrameValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FrameValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrameValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>, V: Into<FrameValue>> FromIterator<(S, V)> for Frame {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        let mut frame = Frame::new();
        for (name, value) in iter {
            frame.set(name, value);
        }
        frame
    }
}
