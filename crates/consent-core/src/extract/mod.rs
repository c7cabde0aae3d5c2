use consent_model::{ConsentMapping, ConsentValues, RawSubmission, Submission};

/// Maps raw submission values onto the configured consent properties.
pub struct ConsentExtractor<'a> {
    mapping: &'a ConsentMapping,
}

impl<'a> ConsentExtractor<'a> {
    pub fn new(mapping: &'a ConsentMapping) -> Self {
        Self { mapping }
    }

    /// Build a [`Submission`] carrying only the consent fields that were submitted.
    ///
    /// Values are copied verbatim. Returns `None` when the email is missing or
    /// none of the mapped fields are present: such a submission has nothing to
    /// recover and must never be turned into an empty update.
    pub fn extract(&self, raw: &RawSubmission) -> Option<Submission> {
        let email = raw.email()?;

        let consent_values: ConsentValues = self
            .mapping
            .iter()
            .filter_map(|field| {
                raw.value_of(&field.source)
                    .map(|value| (field.target.clone(), value.to_string()))
            })
            .collect();

        if consent_values.is_empty() {
            return None;
        }

        Some(Submission {
            id: raw.conversion_id.clone(),
            email: email.to_string(),
            consent_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consent_model::FieldValue;

    fn mapping() -> ConsentMapping {
        "terms_box=portal_terms,marketing_box=portal_marketing"
            .parse()
            .unwrap()
    }

    fn raw(values: &[(&str, &str)]) -> RawSubmission {
        RawSubmission {
            conversion_id: "conv-1".into(),
            submitted_at: 1,
            values: values.iter().map(|(n, v)| FieldValue::new(*n, *v)).collect(),
        }
    }

    #[test]
    fn extracts_all_mapped_fields() {
        let mapping = mapping();
        let sub = ConsentExtractor::new(&mapping)
            .extract(&raw(&[
                ("email", "a@x.io"),
                ("terms_box", "Checked"),
                ("marketing_box", "Not Checked"),
                ("firstname", "Ann"),
            ]))
            .unwrap();

        assert_eq!(sub.id, "conv-1");
        assert_eq!(sub.email, "a@x.io");
        assert_eq!(sub.consent_values.len(), 2);
        assert_eq!(sub.consent_values["portal_terms"], "Checked");
        assert_eq!(sub.consent_values["portal_marketing"], "Not Checked");
    }

    #[test]
    fn partial_presence_only_supplies_found_fields() {
        let mapping = mapping();
        let sub = ConsentExtractor::new(&mapping)
            .extract(&raw(&[("email", "a@x.io"), ("marketing_box", "Checked")]))
            .unwrap();

        assert_eq!(sub.consent_values.len(), 1);
        assert!(!sub.consent_values.contains_key("portal_terms"));
    }

    #[test]
    fn no_consent_fields_yields_none() {
        let mapping = mapping();
        let out = ConsentExtractor::new(&mapping).extract(&raw(&[("email", "a@x.io")]));
        assert!(out.is_none());
    }

    #[test]
    fn missing_email_yields_none() {
        let mapping = mapping();
        let out = ConsentExtractor::new(&mapping).extract(&raw(&[("terms_box", "Checked")]));
        assert!(out.is_none());
    }

    #[test]
    fn values_are_copied_verbatim() {
        let mapping: ConsentMapping = "portal_terms=portal_terms".parse().unwrap();
        let extractor = ConsentExtractor::new(&mapping);
        let sub = extractor
            .extract(&raw(&[("email", "a@x.io"), ("portal_terms", "Checked")]))
            .unwrap();

        // Replay the recovered value as a fresh submission and extract again.
        let replayed = raw(&[
            ("email", "a@x.io"),
            ("portal_terms", sub.consent_values["portal_terms"].as_str()),
        ]);
        let again = extractor.extract(&replayed).unwrap();
        assert_eq!(again.consent_values["portal_terms"], "Checked");

        let odd = extractor
            .extract(&raw(&[("email", "a@x.io"), ("portal_terms", " cHeCkEd ")]))
            .unwrap();
        assert_eq!(odd.consent_values["portal_terms"], " cHeCkEd ");
    }
}
