//! Prompt templates for the generation agents
//!
//! Every prompt interpolates the retrieved context with each chunk tagged
//! by its source page, so the model can cite pages the validator will then
//! check against the context. Templates are fixed; identical inputs build
//! identical prompts.

use crate::content::BLANK_MARKER;
use crate::retriever::RetrievalResult;
use std::fmt::Write;

/// Render the retrieved context with page tags
pub fn context_block(context: &RetrievalResult) -> String {
    let mut block = String::new();
    for scored in &context.chunks {
        let _ = writeln!(
            block,
            "Source Page: {}\nContent: {}\n",
            scored.chunk.page, scored.chunk.text
        );
    }
    block
}

fn topic_label(topic: Option<&str>) -> &str {
    topic.unwrap_or("the document as a whole")
}

/// Prompt for multiple-choice question generation
pub fn mcq_prompt(topic: Option<&str>, num_questions: usize, context: &RetrievalResult) -> String {
    format!(
        "**Task:** Based on the context below, generate {num} high-quality multiple-choice \
         questions strictly about the topic '{topic}'. Ignore unrelated information in the \
         context. Your response must be a single, raw JSON object of the form \
         {{\"questions\": [{{\"question\": \"...\", \"options\": [\"...\"], \
         \"correct_answer\": \"...\", \"explanation\": \"...\", \"source_page\": 1}}]}}.\n\
         Each question must offer between 2 and 5 answer options, exactly one of which is \
         identical to `correct_answer`, and must cite the `source_page` the question came \
         from. If you cannot generate {num} high-quality questions from the context, \
         generate as many as you can.\n\n\
         **Context with Sources:**\n---\n{context}---",
        num = num_questions,
        topic = topic_label(topic),
        context = context_block(context),
    )
}

/// Prompt for fill-in-the-blank generation
pub fn cloze_prompt(topic: Option<&str>, num_questions: usize, context: &RetrievalResult) -> String {
    format!(
        "**Task:** Create {num} fill-in-the-blank questions based on the context. Your \
         response must be a single, raw JSON object of the form \
         {{\"questions\": [{{\"sentence\": \"...\", \"correct_answer\": \"...\", \
         \"source_page\": 1}}]}}.\n\
         Follow these steps precisely for each question:\n\
         1. Find an important, factual sentence in the context that is clearly about the \
         topic '{topic}'.\n\
         2. Identify a single, critical keyword or short phrase in that sentence.\n\
         3. Create the \"sentence\" field by replacing that keyword with '{marker}'.\n\
         4. Create the \"correct_answer\" field with the exact keyword you removed.\n\
         5. Add the correct \"source_page\" from the context.\n\n\
         If you cannot create {num} high-quality questions that follow these rules, create \
         as many as you can.\n\n\
         **Context with Sources:**\n---\n{context}---",
        num = num_questions,
        topic = topic_label(topic),
        marker = BLANK_MARKER,
        context = context_block(context),
    )
}

/// Prompt for summary generation
pub fn summary_prompt(topic: Option<&str>, context: &RetrievalResult) -> String {
    format!(
        "**Task:** Generate a concise 2-3 sentence summary of the context, focused on \
         '{topic}'. Your response must be a single, raw JSON object of the form \
         {{\"summary_text\": \"...\", \"source_pages\": [1]}} where `source_pages` lists \
         every context page the summary draws on.\n\n\
         **Context with Sources:**\n---\n{context}---",
        topic = topic_label(topic),
        context = context_block(context),
    )
}

/// Feedback appended to the prompt for the single validation retry
pub fn retry_feedback(violations: &[String]) -> String {
    let mut feedback =
        String::from("\n\n**Your previous response was rejected for these reasons:**\n");
    for violation in violations {
        let _ = writeln!(feedback, "- {}", violation);
    }
    feedback.push_str(
        "Regenerate the JSON object and fix every violation. Respond with only the corrected JSON.",
    );
    feedback
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_common::index::{Chunk, ScoredChunk};
    use uuid::Uuid;

    fn context() -> RetrievalResult {
        RetrievalResult {
            chunks: vec![ScoredChunk {
                chunk: Chunk {
                    id: Uuid::new_v4(),
                    document_id: "doc".into(),
                    page: 3,
                    seq: 0,
                    text: "Exponent rules matter.".into(),
                },
                score: 0.9,
            }],
        }
    }

    #[test]
    fn test_context_block_tags_pages() {
        let block = context_block(&context());
        assert!(block.contains("Source Page: 3"));
        assert!(block.contains("Exponent rules matter."));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let ctx = context();
        assert_eq!(
            mcq_prompt(Some("exponents"), 2, &ctx),
            mcq_prompt(Some("exponents"), 2, &ctx)
        );
    }

    #[test]
    fn test_missing_topic_has_neutral_label() {
        let prompt = summary_prompt(None, &context());
        assert!(prompt.contains("the document as a whole"));
    }

    #[test]
    fn test_retry_feedback_lists_violations() {
        let feedback = retry_feedback(&[
            "question 1: no option equals correct_answer".to_string(),
            "question 2: source_page 9 is not part of the supplied context".to_string(),
        ]);
        assert!(feedback.contains("question 1"));
        assert!(feedback.contains("question 2"));
    }

    #[test]
    fn test_cloze_prompt_names_the_marker() {
        let prompt = cloze_prompt(None, 1, &context());
        assert!(prompt.contains(BLANK_MARKER));
    }
}
