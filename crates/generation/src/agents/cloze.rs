//! Fill-in-the-blank (cloze) agent

use super::{
    attempt_failed, complete_with_retry, extract_json, AgentParams, AttemptFailure,
    AttemptOutcome, GenerationAgent,
};
use crate::content::{ClozeItem, ContentType, GeneratedContent, BLANK_MARKER};
use crate::prompt;
use crate::retriever::RetrievalResult;
use async_trait::async_trait;
use quizforge_common::completion::Completer;
use quizforge_common::errors::{AppError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct ClozeAgent {
    completer: Arc<dyn Completer>,
}

#[derive(Deserialize)]
struct ClozePayload {
    #[serde(default)]
    questions: Vec<ClozeItem>,
}

impl ClozeAgent {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    fn evaluate(
        raw: &str,
        requested: usize,
        pages: &BTreeSet<u32>,
    ) -> AttemptOutcome<Vec<ClozeItem>> {
        let Some(json) = extract_json(raw) else {
            return attempt_failed(vec![
                "the response did not contain a JSON object".to_string()
            ]);
        };

        let payload: ClozePayload = match serde_json::from_str(json) {
            Ok(payload) => payload,
            Err(e) => {
                return attempt_failed(vec![format!(
                    "the response was not valid JSON for the requested shape: {}",
                    e
                )])
            }
        };

        if payload.questions.is_empty() {
            return attempt_failed(vec!["no questions were returned".to_string()]);
        }

        let mut valid = Vec::new();
        let mut violations = Vec::new();
        for (i, item) in payload.questions.into_iter().enumerate() {
            match validate_item(&item, pages) {
                Ok(()) => valid.push(item),
                Err(violation) => violations.push(format!("question {}: {}", i + 1, violation)),
            }
        }

        valid.truncate(requested);

        if violations.is_empty() {
            Ok(valid)
        } else {
            let salvage = if valid.is_empty() {
                None
            } else {
                Some(valid.clone())
            };
            Err(AttemptFailure {
                violations,
                salvage,
            })
        }
    }
}

fn validate_item(item: &ClozeItem, pages: &BTreeSet<u32>) -> std::result::Result<(), String> {
    let blanks = item.sentence.matches(BLANK_MARKER).count();
    if blanks != 1 {
        return Err(format!(
            "the sentence must contain exactly one '{}' marker, found {}",
            BLANK_MARKER, blanks
        ));
    }

    if item.correct_answer.trim().is_empty() {
        return Err("correct_answer is empty".to_string());
    }

    if !pages.contains(&item.source_page) {
        return Err(format!(
            "source_page {} is not part of the supplied context",
            item.source_page
        ));
    }

    Ok(())
}

#[async_trait]
impl GenerationAgent for ClozeAgent {
    fn content_type(&self) -> ContentType {
        ContentType::FillInTheBlank
    }

    async fn generate(
        &self,
        context: &RetrievalResult,
        params: &AgentParams,
    ) -> Result<GeneratedContent> {
        if context.is_empty() {
            return Err(AppError::GenerationError {
                message: "No context is available to ground questions".to_string(),
            });
        }

        let pages = context.pages();
        let requested = params.num_questions;
        let base_prompt = prompt::cloze_prompt(params.topic.as_deref(), requested, context);

        let questions = complete_with_retry(
            self.completer.as_ref(),
            ContentType::FillInTheBlank,
            &base_prompt,
            |raw| Self::evaluate(raw, requested, &pages),
        )
        .await?;

        Ok(GeneratedContent::FillInTheBlank { questions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> BTreeSet<u32> {
        BTreeSet::from([1])
    }

    #[test]
    fn test_valid_cloze_accepted() {
        let raw = format!(
            r#"{{"questions": [{{"sentence": "The rule is to do the same to {} sides.", "correct_answer": "both", "source_page": 1}}]}}"#,
            BLANK_MARKER
        );
        let items = ClozeAgent::evaluate(&raw, 1, &pages()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].correct_answer, "both");
    }

    #[test]
    fn test_sentence_without_marker_rejected() {
        let raw = r#"{"questions": [{"sentence": "No blank here.", "correct_answer": "blank", "source_page": 1}]}"#;
        let failure = ClozeAgent::evaluate(raw, 1, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("exactly one"));
    }

    #[test]
    fn test_sentence_with_two_markers_rejected() {
        let raw = format!(
            r#"{{"questions": [{{"sentence": "{} and {} are both blanks.", "correct_answer": "x", "source_page": 1}}]}}"#,
            BLANK_MARKER, BLANK_MARKER
        );
        let failure = ClozeAgent::evaluate(&raw, 1, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("found 2"));
    }

    #[test]
    fn test_empty_answer_rejected() {
        let raw = format!(
            r#"{{"questions": [{{"sentence": "Fill {} in.", "correct_answer": "  ", "source_page": 1}}]}}"#,
            BLANK_MARKER
        );
        let failure = ClozeAgent::evaluate(&raw, 1, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("correct_answer"));
    }

    #[test]
    fn test_ungrounded_page_rejected() {
        let raw = format!(
            r#"{{"questions": [{{"sentence": "Fill {} in.", "correct_answer": "this", "source_page": 4}}]}}"#,
            BLANK_MARKER
        );
        let failure = ClozeAgent::evaluate(&raw, 1, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("source_page 4"));
    }
}
