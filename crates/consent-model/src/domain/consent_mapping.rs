use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// One form field copied onto one contact property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentField {
    /// Field name as it appears in the form submission values.
    #[serde(alias = "sourceFieldName")]
    pub source: String,
    /// Contact property that receives the submitted value.
    #[serde(alias = "targetPropertyName")]
    pub target: String,
}

impl ConsentField {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Ordered list of consent fields used for a whole run.
///
/// Always non-empty, every target property appears once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConsentMapping(Vec<ConsentField>);

impl ConsentMapping {
    pub fn new(fields: Vec<ConsentField>) -> Result<Self, ModelError> {
        if fields.is_empty() {
            return Err(ModelError::EmptyMapping);
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.source.trim().is_empty() || field.target.trim().is_empty() {
                return Err(ModelError::InvalidMappingEntry(format!(
                    "{}={}",
                    field.source, field.target
                )));
            }
            if !seen.insert(field.target.as_str()) {
                return Err(ModelError::DuplicateTarget(field.target.clone()));
            }
        }
        Ok(Self(fields))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsentField> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for ConsentMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fields = Vec::<ConsentField>::deserialize(deserializer)?;
        ConsentMapping::new(fields).map_err(serde::de::Error::custom)
    }
}

/// Parses `source=target` pairs separated by commas.
impl FromStr for ConsentMapping {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (source, target) = entry
                .split_once('=')
                .ok_or_else(|| ModelError::InvalidMappingEntry(entry.to_string()))?;
            fields.push(ConsentField::new(source.trim(), target.trim()));
        }
        ConsentMapping::new(fields)
    }
}
