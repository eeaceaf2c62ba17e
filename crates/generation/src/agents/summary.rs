//! Topical summary agent

use super::{
    attempt_failed, complete_with_retry, extract_json, AgentParams, AttemptFailure,
    AttemptOutcome, GenerationAgent,
};
use crate::content::{ContentType, GeneratedContent};
use crate::prompt;
use crate::retriever::RetrievalResult;
use async_trait::async_trait;
use quizforge_common::completion::Completer;
use quizforge_common::errors::{AppError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct SummaryAgent {
    completer: Arc<dyn Completer>,
}

#[derive(Deserialize)]
struct SummaryPayload {
    #[serde(default)]
    summary_text: String,

    #[serde(default)]
    source_pages: Vec<u32>,
}

/// A validated summary with its contributing pages
#[derive(Debug)]
struct ValidatedSummary {
    summary_text: String,
    source_pages: Vec<u32>,
}

impl SummaryAgent {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    fn evaluate(raw: &str, pages: &BTreeSet<u32>) -> AttemptOutcome<ValidatedSummary> {
        let Some(json) = extract_json(raw) else {
            return attempt_failed(vec![
                "the response did not contain a JSON object".to_string()
            ]);
        };

        let payload: SummaryPayload = match serde_json::from_str(json) {
            Ok(payload) => payload,
            Err(e) => {
                return attempt_failed(vec![format!(
                    "the response was not valid JSON for the requested shape: {}",
                    e
                )])
            }
        };

        let mut violations = Vec::new();

        if payload.summary_text.trim().is_empty() {
            violations.push("summary_text is empty".to_string());
        }

        // A summary that omits its citations is attributed to the whole
        // context rather than rejected.
        let mut source_pages: Vec<u32> = if payload.source_pages.is_empty() {
            pages.iter().copied().collect()
        } else {
            payload.source_pages
        };
        source_pages.sort_unstable();
        source_pages.dedup();

        for page in &source_pages {
            if !pages.contains(page) {
                violations.push(format!(
                    "source_pages cites page {} which is not part of the supplied context",
                    page
                ));
            }
        }

        if violations.is_empty() {
            Ok(ValidatedSummary {
                summary_text: payload.summary_text,
                source_pages,
            })
        } else {
            Err(AttemptFailure {
                violations,
                salvage: None,
            })
        }
    }
}

#[async_trait]
impl GenerationAgent for SummaryAgent {
    fn content_type(&self) -> ContentType {
        ContentType::Summary
    }

    async fn generate(
        &self,
        context: &RetrievalResult,
        params: &AgentParams,
    ) -> Result<GeneratedContent> {
        if context.is_empty() {
            return Err(AppError::GenerationError {
                message: "No context is available to summarize".to_string(),
            });
        }

        let pages = context.pages();
        let base_prompt = prompt::summary_prompt(params.topic.as_deref(), context);

        let summary = complete_with_retry(
            self.completer.as_ref(),
            ContentType::Summary,
            &base_prompt,
            |raw| Self::evaluate(raw, &pages),
        )
        .await?;

        Ok(GeneratedContent::Summary {
            summary_text: summary.summary_text,
            source_pages: summary.source_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> BTreeSet<u32> {
        BTreeSet::from([1, 2, 3])
    }

    #[test]
    fn test_valid_summary_accepted() {
        let raw = r#"{"summary_text": "Algebra balances both sides.", "source_pages": [2, 1, 2]}"#;
        let summary = SummaryAgent::evaluate(raw, &pages()).unwrap();
        assert_eq!(summary.summary_text, "Algebra balances both sides.");
        assert_eq!(summary.source_pages, vec![1, 2]);
    }

    #[test]
    fn test_missing_pages_default_to_context() {
        let raw = r#"{"summary_text": "A recap without citations."}"#;
        let summary = SummaryAgent::evaluate(raw, &pages()).unwrap();
        assert_eq!(summary.source_pages, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_text_rejected() {
        let raw = r#"{"summary_text": "   ", "source_pages": [1]}"#;
        let failure = SummaryAgent::evaluate(raw, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("summary_text"));
    }

    #[test]
    fn test_pages_outside_context_rejected() {
        let raw = r#"{"summary_text": "Recap.", "source_pages": [1, 9]}"#;
        let failure = SummaryAgent::evaluate(raw, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("page 9"));
    }
}
