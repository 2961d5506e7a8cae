//! Assessment input: named document sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{GammaError, Result};

/// Caller-defined section ids mapped to raw text.
///
/// A section that is missing, empty, or whitespace-only is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentBundle {
    sections: BTreeMap<String, String>,
}

impl AssessmentBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.sections.insert(id.into(), text.into());
        self
    }

    /// Text of section `id`, if present and non-blank.
    pub fn section(&self, id: &str) -> Option<&str> {
        self.sections
            .get(id)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }

    /// Ids of every non-blank section.
    pub fn present_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Build a bundle from an untyped JSON value.
    ///
    /// The value must be an object. String members become sections; any
    /// other member (null, numbers, nested metadata) is skipped.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            GammaError::MalformedBundle(format!("expected an object, got {}", kind_of(value)))
        })?;

        let mut sections = BTreeMap::new();
        for (id, member) in object {
            match member {
                Value::String(text) => {
                    sections.insert(id.clone(), text.clone());
                }
                other => {
                    debug!(member = %id, kind = kind_of(other), "skipping non-text bundle member");
                }
            }
        }
        Ok(Self { sections })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AssessmentBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            sections: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
