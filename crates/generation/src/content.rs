//! Request and content types for the generation workflow

use quizforge_common::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Marker inserted where a cloze sentence removes its key term
pub const BLANK_MARKER: &str = "_________";

/// Minimum number of distinct options for an MCQ
pub const MIN_MCQ_OPTIONS: usize = 2;

/// Maximum number of options for an MCQ
pub const MAX_MCQ_OPTIONS: usize = 5;

/// The closed set of content types the workflow can produce.
///
/// Requests carry the content type as a string so an unknown value maps to
/// `InvalidContentType` before any retrieval or generation work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Mcq,
    FillInTheBlank,
    Summary,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Mcq => "MCQ",
            ContentType::FillInTheBlank => "FillInTheBlank",
            ContentType::Summary => "Summary",
        }
    }

    /// Whether requests for this type must carry `num_questions`
    pub fn requires_item_count(&self) -> bool {
        !matches!(self, ContentType::Summary)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MCQ" => Ok(ContentType::Mcq),
            "FillInTheBlank" => Ok(ContentType::FillInTheBlank),
            "Summary" => Ok(ContentType::Summary),
            other => Err(AppError::InvalidContentType {
                requested: other.to_string(),
            }),
        }
    }
}

/// A content generation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerationRequest {
    /// Topic to focus on; absent means the whole retrieved context
    #[validate(length(min = 1, max = 500))]
    pub topic: Option<String>,

    /// Requested content type: MCQ, FillInTheBlank, or Summary
    pub content_type: String,

    /// Number of items to generate (required for MCQ and FillInTheBlank)
    #[validate(range(min = 1))]
    pub num_questions: Option<u32>,

    /// Number of context chunks to retrieve as grounding material
    #[validate(range(min = 1))]
    pub context_chunks: u32,
}

/// A multiple-choice question grounded in a context page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqItem {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub source_page: u32,
}

/// A fill-in-the-blank item: a sentence with exactly one blank marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClozeItem {
    pub sentence: String,
    pub correct_answer: String,
    pub source_page: u32,
}

/// Validated output of a generation request, shaped per content type
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GeneratedContent {
    Mcq {
        questions: Vec<McqItem>,
    },
    FillInTheBlank {
        questions: Vec<ClozeItem>,
    },
    Summary {
        summary_text: String,
        source_pages: Vec<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trip() {
        for name in ["MCQ", "FillInTheBlank", "Summary"] {
            let parsed: ContentType = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_content_type_fails_fast() {
        let err = "Essay".parse::<ContentType>().unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidContentType { requested } if requested == "Essay"
        ));
    }

    #[test]
    fn test_summary_ignores_item_count() {
        assert!(ContentType::Mcq.requires_item_count());
        assert!(ContentType::FillInTheBlank.requires_item_count());
        assert!(!ContentType::Summary.requires_item_count());
    }

    #[test]
    fn test_request_validation_rules() {
        let request = GenerationRequest {
            topic: Some(String::new()),
            content_type: "MCQ".to_string(),
            num_questions: Some(0),
            context_chunks: 0,
        };
        let errors = request.validate().unwrap_err();
        let field_errors = errors.field_errors();
        let fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        assert!(fields.contains(&"topic"));
        assert!(fields.contains(&"num_questions"));
        assert!(fields.contains(&"context_chunks"));
    }

    #[test]
    fn test_generated_content_wire_shapes() {
        let mcq = GeneratedContent::Mcq {
            questions: vec![McqItem {
                question: "What is x?".into(),
                options: vec!["1".into(), "2".into()],
                correct_answer: "2".into(),
                explanation: "Because.".into(),
                source_page: 1,
            }],
        };
        let value = serde_json::to_value(&mcq).unwrap();
        assert!(value.get("questions").is_some());

        let summary = GeneratedContent::Summary {
            summary_text: "A short recap.".into(),
            source_pages: vec![1, 2],
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["source_pages"], serde_json::json!([1, 2]));
    }
}
