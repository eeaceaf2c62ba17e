//! Workflow orchestrator
//!
//! Drives one generation request through its states:
//! `Idle -> RouteChecked -> Retrieving -> Routed -> Generating ->
//! {Succeeded, Failed}`. The content-type check runs before anything else
//! so an unknown type costs no retrieval or completion work, and there is
//! no workflow-level retry beyond the single validation retry each agent
//! already performs.
//!
//! Cancellation: a caller that abandons a request does not abort an
//! in-flight completion call; the capability may run to completion and its
//! result is discarded.

use crate::agents::AgentParams;
use crate::content::{ContentType, GeneratedContent, GenerationRequest};
use crate::retriever::Retriever;
use crate::router::{self, AgentSet};
use quizforge_common::completion::Completer;
use quizforge_common::errors::{AppError, Result};
use quizforge_common::index::EmbeddingIndex;
use quizforge_common::metrics;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// States a request moves through; terminal states are `Succeeded` and
/// `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkflowState {
    Idle,
    RouteChecked,
    Retrieving,
    Routed,
    Generating,
    Succeeded,
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::RouteChecked => "route_checked",
            WorkflowState::Retrieving => "retrieving",
            WorkflowState::Routed => "routed",
            WorkflowState::Generating => "generating",
            WorkflowState::Succeeded => "succeeded",
            WorkflowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The retrieval/generation orchestrator
pub struct Workflow {
    index: Arc<EmbeddingIndex>,
    retriever: Retriever,
    agents: AgentSet,
}

impl Workflow {
    pub fn new(index: Arc<EmbeddingIndex>, completer: Arc<dyn Completer>) -> Self {
        Self {
            retriever: Retriever::new(index.clone()),
            agents: AgentSet::new(completer),
            index,
        }
    }

    /// Run one generation request to a terminal state
    #[instrument(skip(self, request), fields(content_type = %request.content_type))]
    pub async fn run(&self, request: &GenerationRequest) -> Result<GeneratedContent> {
        let started = Instant::now();
        let result = self.drive(request).await;

        metrics::record_generation(
            &request.content_type,
            started.elapsed().as_secs_f64(),
            result.is_ok(),
        );

        match &result {
            Ok(_) => transition(WorkflowState::Succeeded),
            Err(e) => {
                debug!(error = %e, "Generation request failed");
                transition(WorkflowState::Failed);
            }
        }

        result
    }

    async fn drive(&self, request: &GenerationRequest) -> Result<GeneratedContent> {
        transition(WorkflowState::Idle);

        // Route check precedes retrieval so an unknown content type costs
        // nothing.
        let content_type: ContentType = request.content_type.parse()?;
        let params = validate_params(content_type, request)?;
        transition(WorkflowState::RouteChecked);

        if !self.index.is_built().await {
            return Err(AppError::NoActiveIndex);
        }

        let total_chunks = self.index.chunk_count().await;
        if request.context_chunks as usize > total_chunks {
            return Err(AppError::Validation {
                message: format!(
                    "context_chunks ({}) exceeds the indexed chunk count ({})",
                    request.context_chunks, total_chunks
                ),
                field: Some("context_chunks".to_string()),
            });
        }

        transition(WorkflowState::Retrieving);
        let context = self
            .retriever
            .retrieve(params.topic.as_deref(), request.context_chunks as usize)
            .await?;

        transition(WorkflowState::Routed);
        let agent = router::route(&self.agents, content_type);

        transition(WorkflowState::Generating);
        agent.generate(&context, &params).await
    }
}

fn validate_params(
    content_type: ContentType,
    request: &GenerationRequest,
) -> Result<AgentParams> {
    if request.context_chunks == 0 {
        return Err(AppError::Validation {
            message: "context_chunks must be a positive integer".to_string(),
            field: Some("context_chunks".to_string()),
        });
    }

    let num_questions = match (content_type.requires_item_count(), request.num_questions) {
        (true, None) => {
            return Err(AppError::MissingField {
                field: "num_questions".to_string(),
            })
        }
        (true, Some(0)) => {
            return Err(AppError::Validation {
                message: "num_questions must be a positive integer".to_string(),
                field: Some("num_questions".to_string()),
            })
        }
        (true, Some(n)) => n as usize,
        (false, _) => 0,
    };

    Ok(AgentParams {
        topic: request.topic.clone(),
        num_questions,
    })
}

fn transition(state: WorkflowState) {
    debug!(state = %state, "Workflow state");
}
