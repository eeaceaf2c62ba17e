//! Content-type routing
//!
//! Pure lookup from the closed `ContentType` enum to its generation agent.
//! The match is exhaustive, so adding a content type without an agent fails
//! at compile time rather than falling through at runtime.

use crate::agents::{ClozeAgent, GenerationAgent, McqAgent, SummaryAgent};
use crate::content::ContentType;
use quizforge_common::completion::Completer;
use std::sync::Arc;

/// The fixed set of generation agents, one per content type
pub struct AgentSet {
    mcq: McqAgent,
    fill_in_the_blank: ClozeAgent,
    summary: SummaryAgent,
}

impl AgentSet {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            mcq: McqAgent::new(completer.clone()),
            fill_in_the_blank: ClozeAgent::new(completer.clone()),
            summary: SummaryAgent::new(completer),
        }
    }
}

/// Map a content type to its agent; no side effects, no capability calls
pub fn route(agents: &AgentSet, content_type: ContentType) -> &dyn GenerationAgent {
    match content_type {
        ContentType::Mcq => &agents.mcq,
        ContentType::FillInTheBlank => &agents.fill_in_the_blank,
        ContentType::Summary => &agents.summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_common::completion::MockCompleter;

    #[test]
    fn test_each_type_routes_to_its_agent() {
        let agents = AgentSet::new(Arc::new(MockCompleter::new()));
        for content_type in [
            ContentType::Mcq,
            ContentType::FillInTheBlank,
            ContentType::Summary,
        ] {
            let agent = route(&agents, content_type);
            assert_eq!(agent.content_type(), content_type);
        }
    }
}
