//! Request/response bodies of the HubSpot endpoints in use.
use consent_model::{ConsentValues, EMAIL_FIELD, RawSubmission};
use serde::{Deserialize, Serialize};

/// Upper bound of search results; two is enough to detect ambiguity.
const SEARCH_LIMIT: u32 = 2;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionsResponse {
    #[serde(default)]
    pub results: Vec<RawSubmission>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl SubmissionsResponse {
    pub fn next_cursor(&self) -> Option<String> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .map(|n| n.after.clone())
            .filter(|after| !after.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging {
    #[serde(default)]
    pub next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextPage {
    #[serde(default)]
    pub after: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest {
    #[serde(rename = "filterGroups")]
    filter_groups: Vec<FilterGroup>,
    properties: Vec<String>,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct FilterGroup {
    filters: Vec<Filter>,
}

#[derive(Debug, Serialize)]
struct Filter {
    #[serde(rename = "propertyName")]
    property_name: String,
    operator: String,
    value: String,
}

impl SearchRequest {
    pub fn email_equals(email: &str) -> Self {
        Self {
            filter_groups: vec![FilterGroup {
                filters: vec![Filter {
                    property_name: EMAIL_FIELD.to_string(),
                    operator: "EQ".to_string(),
                    value: email.to_string(),
                }],
            }],
            properties: vec![EMAIL_FIELD.to_string()],
            limit: SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<CrmObject>,
}

impl SearchResponse {
    pub fn into_ids(self) -> Vec<String> {
        self.results.into_iter().map(|o| o.id).collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CrmObject {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRequest<'a> {
    pub properties: &'a ConsentValues,
}
