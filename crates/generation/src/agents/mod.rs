//! Specialized generation agents
//!
//! Each agent owns one content type end to end: prompt construction, a
//! single completion call per attempt, structured-output parsing, and
//! validation including the grounding invariant (cited pages must appear in
//! the supplied context). A validation failure earns exactly one retry with
//! the concrete violations appended to the prompt; after a failed retry the
//! valid subset is returned when one exists, otherwise the request fails
//! with `GenerationError`.

mod cloze;
mod mcq;
mod summary;

pub use cloze::ClozeAgent;
pub use mcq::McqAgent;
pub use summary::SummaryAgent;

use crate::content::{ContentType, GeneratedContent};
use crate::prompt;
use crate::retriever::RetrievalResult;
use async_trait::async_trait;
use quizforge_common::completion::Completer;
use quizforge_common::errors::{AppError, Result};
use tracing::warn;

/// Parameters an agent receives alongside the retrieved context
#[derive(Debug, Clone)]
pub struct AgentParams {
    /// Topic to focus on; absent means the whole retrieved context
    pub topic: Option<String>,

    /// Requested item count (0 for content types that ignore it)
    pub num_questions: usize,
}

/// Common contract for the content generators
#[async_trait]
pub trait GenerationAgent: Send + Sync {
    /// The content type this agent produces
    fn content_type(&self) -> ContentType;

    /// Generate validated content grounded in the supplied context
    async fn generate(
        &self,
        context: &RetrievalResult,
        params: &AgentParams,
    ) -> Result<GeneratedContent>;
}

/// Why an attempt's output was rejected, and what (if anything) survived
#[derive(Debug)]
pub(crate) struct AttemptFailure<T> {
    /// Concrete violations, phrased for the retry prompt
    pub violations: Vec<String>,

    /// Valid subset of the attempt's items, usable if the retry also fails
    pub salvage: Option<T>,
}

pub(crate) type AttemptOutcome<T> = std::result::Result<T, AttemptFailure<T>>;

/// Drive the attempt/validate/retry loop shared by all agents.
///
/// The completion capability is invoked exactly once per attempt; transport
/// failures propagate immediately as `CompletionUnavailable` without
/// consuming the validation retry.
pub(crate) async fn complete_with_retry<T>(
    completer: &dyn Completer,
    content_type: ContentType,
    base_prompt: &str,
    mut evaluate: impl FnMut(&str) -> AttemptOutcome<T> + Send,
) -> Result<T> {
    let first = completer.complete(base_prompt).await?;
    let failure = match evaluate(&first) {
        Ok(valid) => return Ok(valid),
        Err(failure) => failure,
    };

    warn!(
        content_type = %content_type,
        violations = ?failure.violations,
        "Generated output failed validation, retrying once"
    );

    let retry_prompt = format!(
        "{}{}",
        base_prompt,
        prompt::retry_feedback(&failure.violations)
    );
    let second = completer.complete(&retry_prompt).await?;

    match evaluate(&second) {
        Ok(valid) => Ok(valid),
        Err(failure) => {
            if let Some(salvage) = failure.salvage {
                warn!(
                    content_type = %content_type,
                    violations = ?failure.violations,
                    "Retry still partially invalid, returning the valid subset"
                );
                Ok(salvage)
            } else {
                Err(AppError::GenerationError {
                    message: format!(
                        "Output failed validation after retry: {}",
                        failure.violations.join("; ")
                    ),
                })
            }
        }
    }
}

/// Locate the JSON payload inside raw model output, tolerating code fences
/// and surrounding prose.
pub(crate) fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    let candidate = if let Some(fenced) = trimmed.strip_prefix("```") {
        let body = fenced.strip_prefix("json").unwrap_or(fenced);
        body.split("```").next().unwrap_or(body)
    } else {
        trimmed
    };

    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&candidate[start..=end])
}

/// Error result for an attempt that produced nothing usable
pub(crate) fn attempt_failed<T>(violations: Vec<String>) -> AttemptOutcome<T> {
    Err(AttemptFailure {
        violations,
        salvage: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_common::completion::MockCompleter;

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_json_fenced() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_with_prose() {
        let raw = "Here is your JSON:\n{\"a\": 1}\nLet me know!";
        assert_eq!(extract_json(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_absent() {
        assert_eq!(extract_json("no json here"), None);
    }

    #[tokio::test]
    async fn test_retry_consumes_exactly_two_attempts() {
        let completer = MockCompleter::with_responses(["bad", "bad again", "never reached"]);
        let mut calls = 0;
        let result: Result<()> =
            complete_with_retry(&completer, ContentType::Mcq, "prompt", |_| {
                calls += 1;
                attempt_failed(vec!["not valid".to_string()])
            })
            .await;

        assert!(matches!(result, Err(AppError::GenerationError { .. })));
        assert_eq!(calls, 2);
        // The third scripted response was never requested
        assert_eq!(completer.complete("p").await.unwrap(), "never reached");
    }

    #[tokio::test]
    async fn test_transport_failure_skips_retry() {
        let completer = MockCompleter::new();
        let result: Result<()> =
            complete_with_retry(&completer, ContentType::Summary, "prompt", |_| {
                panic!("evaluate must not run without a completion")
            })
            .await;

        assert!(matches!(result, Err(AppError::CompletionUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_salvage_used_after_failed_retry() {
        let completer = MockCompleter::with_responses(["first", "second"]);
        let result: Result<Vec<u32>> =
            complete_with_retry(&completer, ContentType::Mcq, "prompt", |_| {
                Err(AttemptFailure {
                    violations: vec!["item 2 invalid".to_string()],
                    salvage: Some(vec![7]),
                })
            })
            .await;

        assert_eq!(result.unwrap(), vec![7]);
    }
}
