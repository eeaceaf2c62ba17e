//! Multiple-choice question agent

use super::{
    attempt_failed, complete_with_retry, extract_json, AgentParams, AttemptFailure,
    AttemptOutcome, GenerationAgent,
};
use crate::content::{ContentType, GeneratedContent, McqItem, MAX_MCQ_OPTIONS, MIN_MCQ_OPTIONS};
use crate::prompt;
use crate::retriever::RetrievalResult;
use async_trait::async_trait;
use quizforge_common::completion::Completer;
use quizforge_common::errors::{AppError, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

pub struct McqAgent {
    completer: Arc<dyn Completer>,
}

#[derive(Deserialize)]
struct McqPayload {
    #[serde(default)]
    questions: Vec<McqItem>,
}

impl McqAgent {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    fn evaluate(
        raw: &str,
        requested: usize,
        pages: &BTreeSet<u32>,
    ) -> AttemptOutcome<Vec<McqItem>> {
        let Some(json) = extract_json(raw) else {
            return attempt_failed(vec![
                "the response did not contain a JSON object".to_string()
            ]);
        };

        let payload: McqPayload = match serde_json::from_str(json) {
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

        // Never more than requested; never padded to reach it.
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

fn validate_item(item: &McqItem, pages: &BTreeSet<u32>) -> std::result::Result<(), String> {
    if item.question.trim().is_empty() {
        return Err("the question text is empty".to_string());
    }

    let distinct: HashSet<&str> = item.options.iter().map(String::as_str).collect();
    if distinct.len() < MIN_MCQ_OPTIONS {
        return Err(format!(
            "at least {} distinct options are required",
            MIN_MCQ_OPTIONS
        ));
    }
    if item.options.len() > MAX_MCQ_OPTIONS {
        return Err(format!("at most {} options are allowed", MAX_MCQ_OPTIONS));
    }

    let matching = item
        .options
        .iter()
        .filter(|option| **option == item.correct_answer)
        .count();
    if matching != 1 {
        return Err("exactly one option must equal correct_answer".to_string());
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
impl GenerationAgent for McqAgent {
    fn content_type(&self) -> ContentType {
        ContentType::Mcq
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
        let base_prompt = prompt::mcq_prompt(params.topic.as_deref(), requested, context);

        let questions = complete_with_retry(
            self.completer.as_ref(),
            ContentType::Mcq,
            &base_prompt,
            |raw| Self::evaluate(raw, requested, &pages),
        )
        .await?;

        Ok(GeneratedContent::Mcq { questions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> BTreeSet<u32> {
        BTreeSet::from([1, 2])
    }

    fn item_json(source_page: u32, correct: &str) -> String {
        format!(
            r#"{{"question": "What balances an equation?", "options": ["Doing the same to both sides", "Guessing"], "correct_answer": "{}", "explanation": "The balance rule.", "source_page": {}}}"#,
            correct, source_page
        )
    }

    #[test]
    fn test_valid_payload_accepted() {
        let raw = format!(r#"{{"questions": [{}]}}"#, item_json(1, "Doing the same to both sides"));
        let items = McqAgent::evaluate(&raw, 1, &pages()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_page, 1);
    }

    #[test]
    fn test_exactly_one_correct_option_enforced() {
        let raw = format!(r#"{{"questions": [{}]}}"#, item_json(1, "Not an option"));
        let failure = McqAgent::evaluate(&raw, 1, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("correct_answer"));
        assert!(failure.salvage.is_none());
    }

    #[test]
    fn test_ungrounded_page_rejected() {
        let raw = format!(r#"{{"questions": [{}]}}"#, item_json(9, "Doing the same to both sides"));
        let failure = McqAgent::evaluate(&raw, 1, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("source_page 9"));
    }

    #[test]
    fn test_excess_items_capped_at_request() {
        let raw = format!(
            r#"{{"questions": [{}, {}, {}]}}"#,
            item_json(1, "Doing the same to both sides"),
            item_json(2, "Doing the same to both sides"),
            item_json(1, "Doing the same to both sides"),
        );
        let items = McqAgent::evaluate(&raw, 2, &pages()).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_partial_validity_offers_salvage() {
        let raw = format!(
            r#"{{"questions": [{}, {}]}}"#,
            item_json(1, "Doing the same to both sides"),
            item_json(9, "Doing the same to both sides"),
        );
        let failure = McqAgent::evaluate(&raw, 2, &pages()).unwrap_err();
        assert_eq!(failure.salvage.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_garbage_is_a_parse_violation() {
        let failure = McqAgent::evaluate("total nonsense", 1, &pages()).unwrap_err();
        assert!(failure.violations[0].contains("JSON"));
    }
}
