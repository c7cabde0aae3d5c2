use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::EMAIL_FIELD;

/// Consent values keyed by target contact property.
pub type ConsentValues = BTreeMap<String, String>;

/// A single `{name, value}` pair of a form submission.
///
/// Non-string values are kept as `None` instead of failing the whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub value: Option<String>,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Submission exactly as returned by the forms endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    #[serde(default)]
    pub conversion_id: String,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub submitted_at: i64,
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

impl RawSubmission {
    /// First string value submitted under `name`.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name && v.value.is_some())
            .and_then(|v| v.value.as_deref())
    }

    /// Submitted email with surrounding whitespace removed, if non-blank.
    pub fn email(&self) -> Option<&str> {
        self.value_of(EMAIL_FIELD)
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// Submission reduced to what a recovery needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub email: String,
    pub consent_values: ConsentValues,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Str(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Str(s)) => Some(s),
        Some(Loose::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upstream_shape() {
        let raw: RawSubmission = serde_json::from_str(
            r#"{
                "conversionId": "c-1",
                "submittedAt": 1700000000000,
                "pageUrl": "https://example.com/form",
                "values": [
                    {"name": "email", "value": "  jo@example.com "},
                    {"name": "portal_terms", "value": "Checked", "objectTypeId": "0-1"},
                    {"name": "age", "value": 42}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(raw.conversion_id, "c-1");
        assert_eq!(raw.submitted_at, 1_700_000_000_000);
        assert_eq!(raw.email(), Some("jo@example.com"));
        assert_eq!(raw.value_of("portal_terms"), Some("Checked"));
        assert_eq!(raw.value_of("age"), None);
    }

    #[test]
    fn blank_email_is_absent() {
        let raw = RawSubmission {
            conversion_id: "c".into(),
            submitted_at: 0,
            values: vec![FieldValue::new("email", "   ")],
        };
        assert_eq!(raw.email(), None);
    }
}
