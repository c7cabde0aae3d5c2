use serde::{Deserialize, Serialize};

use crate::{ConsentField, ConsentMapping, ModelError};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Overrides accepted by the trigger endpoint. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub dry_run: Option<bool>,
    pub form_id: Option<String>,
    #[serde(alias = "batchSize")]
    pub page_size: Option<u32>,
    pub max_submissions: Option<usize>,
    /// Keep only the latest submission per email.
    pub dedupe: Option<bool>,
    /// Skip submissions up to and including this email.
    pub start_after_email: Option<String>,
    pub consent_fields: Option<Vec<ConsentField>>,
}

impl RunRequest {
    /// Layer these overrides on top of the configured defaults.
    pub fn resolve(self, defaults: &RunParams) -> Result<RunParams, ModelError> {
        let mut params = defaults.clone();

        if let Some(dry_run) = self.dry_run {
            params.dry_run = dry_run;
        }
        if let Some(form_id) = self.form_id {
            if form_id.trim().is_empty() {
                return Err(ModelError::InvalidRequest("formId cannot be empty".into()));
            }
            params.form_id = form_id.trim().to_string();
        }
        if let Some(page_size) = self.page_size {
            if page_size == 0 {
                return Err(ModelError::InvalidRequest(
                    "pageSize must be greater than zero".into(),
                ));
            }
            params = params.with_page_size(page_size);
        }
        if let Some(max) = self.max_submissions {
            if max == 0 {
                return Err(ModelError::InvalidRequest(
                    "maxSubmissions must be greater than zero".into(),
                ));
            }
            params.max_submissions = Some(max);
        }
        if let Some(dedupe) = self.dedupe {
            params.dedupe = dedupe;
        }
        if let Some(email) = self.start_after_email {
            let email = email.trim();
            params.start_after_email = (!email.is_empty()).then(|| email.to_string());
        }
        if let Some(fields) = self.consent_fields {
            params.mapping = ConsentMapping::new(fields)?;
        }
        Ok(params)
    }
}

/// Fully resolved parameters of one run; immutable once the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub form_id: String,
    pub mapping: ConsentMapping,
    pub dry_run: bool,
    pub page_size: u32,
    pub max_submissions: Option<usize>,
    pub dedupe: bool,
    pub start_after_email: Option<String>,
}

impl RunParams {
    /// Dry-run by default.
    pub fn new(form_id: impl Into<String>, mapping: ConsentMapping) -> Self {
        Self {
            form_id: form_id.into(),
            mapping,
            dry_run: true,
            page_size: DEFAULT_PAGE_SIZE,
            max_submissions: None,
            dedupe: false,
            start_after_email: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_max_submissions(mut self, max: Option<usize>) -> Self {
        self.max_submissions = max;
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }
}
