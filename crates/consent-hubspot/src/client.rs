use async_trait::async_trait;
use consent_core::{Paced, SubmissionPage, Upstream, UpstreamError};
use consent_model::ConsentValues;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{instrument, trace};

use crate::{
    config::HubSpotConfig,
    errors::HubSpotError,
    ratelimit::parse_signal,
    wire::{SearchRequest, SearchResponse, SubmissionsResponse, UpdateRequest},
};

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// HubSpot forms + CRM client. One HTTP call per [`Upstream`] method.
#[derive(Clone)]
pub struct HubSpotClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl HubSpotClient {
    pub fn new(config: HubSpotConfig) -> Result<Self, HubSpotError> {
        if config.token.trim().is_empty() {
            return Err(HubSpotError::MissingToken);
        }
        let raw = config.base_url.trim_end_matches('/');
        let invalid = |reason: String| HubSpotError::InvalidBaseUrl {
            url: raw.to_string(),
            reason,
        };
        let base_url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("cannot carry a path".to_string()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token: config.token,
        })
    }

    /// Base url extended by `segments`, each escaped as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                UpstreamError::Transport(format!("base url {} has no path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn submissions_url(
        &self,
        form_id: &str,
        page_size: u32,
        after: Option<&str>,
    ) -> Result<Url, UpstreamError> {
        let mut url = self.endpoint(&[
            "form-integrations",
            "v1",
            "submissions",
            "forms",
            form_id,
        ])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &page_size.to_string());
            if let Some(after) = after {
                query.append_pair("after", after);
            }
        }
        Ok(url)
    }

    /// Send with auth, read the rate-limit signal, map non-2xx to errors.
    async fn send(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<Paced<String>, UpstreamError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let signal = parse_signal(response.headers());
        let body = response.text().await.map_err(transport)?;
        trace!(%status, resource, remaining = signal.map(|s| s.remaining), "upstream response");

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(resource.to_string()));
        }
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate(body),
                signal,
            });
        }
        Ok(Paced::new(body, signal))
    }
}

#[async_trait]
impl Upstream for HubSpotClient {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_submissions(
        &self,
        form_id: &str,
        page_size: u32,
        after: Option<&str>,
    ) -> Result<Paced<SubmissionPage>, UpstreamError> {
        let url = self.submissions_url(form_id, page_size, after)?;
        let resource = format!("form {form_id}");
        let Paced { value, signal } = self.send(self.client.get(url), &resource).await?;

        let page: SubmissionsResponse = decode(&value)?;
        let next = page.next_cursor();
        Ok(Paced::new(
            SubmissionPage {
                results: page.results,
                next,
            },
            signal,
        ))
    }

    #[instrument(level = "debug", skip(self))]
    async fn search_contacts(&self, email: &str) -> Result<Paced<Vec<String>>, UpstreamError> {
        let url = self.endpoint(&["crm", "v3", "objects", "contacts", "search"])?;
        let request = self
            .client
            .post(url)
            .json(&SearchRequest::email_equals(email));
        let Paced { value, signal } = self.send(request, "contacts search").await?;

        let response: SearchResponse = decode(&value)?;
        Ok(Paced::new(response.into_ids(), signal))
    }

    #[instrument(level = "debug", skip(self, properties))]
    async fn update_contact(
        &self,
        contact_id: &str,
        properties: &ConsentValues,
    ) -> Result<Paced<()>, UpstreamError> {
        let url = self.endpoint(&["crm", "v3", "objects", "contacts", contact_id])?;
        let request = self.client.patch(url).json(&UpdateRequest { properties });
        let resource = format!("contact {contact_id}");
        let Paced { signal, .. } = self.send(request, &resource).await?;
        Ok(Paced::new((), signal))
    }
}

fn transport(e: reqwest::Error) -> UpstreamError {
    UpstreamError::Transport(e.to_string())
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, UpstreamError> {
    serde_json::from_str(body).map_err(|e| {
        UpstreamError::InvalidResponse(format!("{e}, body: {}", truncate(body.to_string())))
    })
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
