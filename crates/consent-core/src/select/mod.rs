//! Narrowing of the fetched submission set before processing.
use std::collections::HashMap;

use consent_model::RawSubmission;

fn email_key(raw: &RawSubmission) -> Option<String> {
    raw.email().map(str::to_lowercase)
}

/// Keep only the latest submission (by `submitted_at`) per email.
///
/// Each email keeps the position of its first appearance. Submissions without
/// an email are kept where they are so they are still counted as skipped.
pub fn dedupe_latest(submissions: Vec<RawSubmission>) -> Vec<RawSubmission> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<RawSubmission> = Vec::with_capacity(submissions.len());

    for raw in submissions {
        match email_key(&raw) {
            Some(key) => match slots.get(&key) {
                Some(&idx) => {
                    if raw.submitted_at > out[idx].submitted_at {
                        out[idx] = raw;
                    }
                }
                None => {
                    slots.insert(key, out.len());
                    out.push(raw);
                }
            },
            None => out.push(raw),
        }
    }
    out
}

/// Drop everything up to and including the first submission from `email`.
///
/// Returns the remaining submissions and how many were skipped, or `None`
/// when the email never appears (the input is then returned untouched).
pub fn resume_after(
    submissions: Vec<RawSubmission>,
    email: &str,
) -> (Vec<RawSubmission>, Option<usize>) {
    let wanted = email.trim().to_lowercase();
    let position = submissions
        .iter()
        .position(|raw| email_key(raw).as_deref() == Some(wanted.as_str()));

    match position {
        Some(idx) => (submissions.into_iter().skip(idx + 1).collect(), Some(idx + 1)),
        None => (submissions, None),
    }
}
