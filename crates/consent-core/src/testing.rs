//! In-memory upstream used by the unit tests.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use consent_model::{ConsentValues, FieldValue, RawSubmission};
use tokio::sync::Semaphore;

use crate::{
    error::UpstreamError,
    upstream::{Paced, SubmissionPage, Upstream},
};

type SearchHook = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
pub(crate) struct FakeUpstream {
    pages: Vec<Vec<RawSubmission>>,
    contacts: HashMap<String, Vec<String>>,
    fail_fetch_at: Option<usize>,
    missing_form: bool,
    failing_searches: HashSet<String>,
    failing_updates: HashSet<String>,
    search_gate: Option<Arc<Semaphore>>,
    search_hook: Mutex<Option<SearchHook>>,
    fetch_cursors: Mutex<Vec<Option<String>>>,
    searches: Mutex<Vec<String>>,
    updates: Mutex<Vec<(String, ConsentValues)>>,
}

impl FakeUpstream {
    pub fn submission(id: &str, email: &str, consent: &[(&str, &str)]) -> RawSubmission {
        let mut values = vec![FieldValue::new("email", email)];
        values.extend(consent.iter().map(|(n, v)| FieldValue::new(*n, *v)));
        RawSubmission {
            conversion_id: id.to_string(),
            submitted_at: 0,
            values,
        }
    }

    pub fn with_pages(pages: Vec<Vec<RawSubmission>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn with_contact(mut self, email: &str, ids: &[&str]) -> Self {
        self.contacts
            .insert(email.to_string(), ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn failing_fetch_at(mut self, page: usize) -> Self {
        self.fail_fetch_at = Some(page);
        self
    }

    /// Every page request answers 404.
    pub fn missing_form(mut self) -> Self {
        self.missing_form = true;
        self
    }

    pub fn failing_search_for(mut self, email: &str) -> Self {
        self.failing_searches.insert(email.to_string());
        self
    }

    pub fn failing_update_for(mut self, contact_id: &str) -> Self {
        self.failing_updates.insert(contact_id.to_string());
        self
    }

    /// Every search waits for a permit from `gate`.
    pub fn gated_searches(mut self, gate: Arc<Semaphore>) -> Self {
        self.search_gate = Some(gate);
        self
    }

    /// Called with the 1-based search count after each search.
    pub fn on_search(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.search_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn fetch_cursors(&self) -> Vec<Option<String>> {
        self.fetch_cursors.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, ConsentValues)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn fetch_submissions(
        &self,
        form_id: &str,
        _page_size: u32,
        after: Option<&str>,
    ) -> Result<Paced<SubmissionPage>, UpstreamError> {
        self.fetch_cursors
            .lock()
            .unwrap()
            .push(after.map(str::to_string));

        if self.missing_form {
            return Err(UpstreamError::NotFound(format!("form {form_id}")));
        }
        let idx = after.map(|a| a.parse::<usize>().unwrap()).unwrap_or(0);
        if self.fail_fetch_at == Some(idx) {
            return Err(UpstreamError::Status {
                status: 500,
                body: "internal error".into(),
                signal: None,
            });
        }

        let results = self.pages.get(idx).cloned().unwrap_or_default();
        let next = (idx + 1 < self.pages.len()).then(|| (idx + 1).to_string());
        Ok(Paced::bare(SubmissionPage { results, next }))
    }

    async fn search_contacts(&self, email: &str) -> Result<Paced<Vec<String>>, UpstreamError> {
        if let Some(gate) = &self.search_gate {
            gate.acquire().await.unwrap().forget();
        }

        let count = {
            let mut searches = self.searches.lock().unwrap();
            searches.push(email.to_string());
            searches.len()
        };
        if let Some(hook) = self.search_hook.lock().unwrap().as_ref() {
            hook(count);
        }

        if self.failing_searches.contains(email) {
            return Err(UpstreamError::Transport("connection reset".into()));
        }
        Ok(Paced::bare(
            self.contacts.get(email).cloned().unwrap_or_default(),
        ))
    }

    async fn update_contact(
        &self,
        contact_id: &str,
        properties: &ConsentValues,
    ) -> Result<Paced<()>, UpstreamError> {
        self.updates
            .lock()
            .unwrap()
            .push((contact_id.to_string(), properties.clone()));

        if self.failing_updates.contains(contact_id) {
            return Err(UpstreamError::Status {
                status: 400,
                body: "Property values were not valid".into(),
                signal: None,
            });
        }
        Ok(Paced::bare(()))
    }
}
