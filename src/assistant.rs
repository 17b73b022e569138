//! Question Answering Orchestrator
//!
//! classify → aggregate → build instructions → complete. Aggregation runs
//! before any completion call, so a data failure never reaches the model.

use crate::analytics::AnalyticsResult;
use crate::dataset::TabularSource;
use crate::error::Result;
use crate::llm::CompletionService;
use crate::narration::{build_general_request, build_narration_request};
use crate::router::{classify, Route};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Temperature used for every completion call.
pub const COMPLETION_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, Serialize)]
pub struct AssistantResponse {
    pub answer: String,
    /// Present only when an aggregation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalyticsResult>,
}

pub struct AnalyticsAssistant<S, C> {
    source: S,
    completion: C,
}

impl<S, C> AnalyticsAssistant<S, C>
where
    S: TabularSource,
    C: CompletionService,
{
    pub fn new(source: S, completion: C) -> Self {
        Self { source, completion }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    pub async fn ask(&self, question: &str) -> Result<AssistantResponse> {
        let request_id = Uuid::new_v4();
        let span = info_span!("ask", %request_id);
        self.answer(question).instrument(span).await
    }

    async fn answer(&self, question: &str) -> Result<AssistantResponse> {
        match classify(question) {
            Route::Aggregate(operation) => {
                info!("🧭 Routed question to {}", operation);
                let result = operation.execute(&self.source)?;
                let payload = build_narration_request(question, &result);
                let answer = self
                    .completion
                    .complete(&payload.into_messages(), COMPLETION_TEMPERATURE)
                    .await?;
                info!("✅ Narrated {} ({} chars)", operation, answer.len());
                Ok(AssistantResponse {
                    answer: answer.trim().to_string(),
                    data: Some(result),
                })
            }
            Route::General => {
                info!("🧭 No aggregation matched; answering as a general question");
                let payload = build_general_request(question);
                let answer = self
                    .completion
                    .complete(&payload.into_messages(), COMPLETION_TEMPERATURE)
                    .await?;
                Ok(AssistantResponse {
                    answer: answer.trim().to_string(),
                    data: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemorySource;
    use crate::error::AnalyticsError;
    use crate::llm::ChatMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for CountingLlm {
        async fn complete(&self, _messages: &[ChatMessage], _temperature: f32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("  **Answer**\n".to_string())
        }
    }

    fn assistant(source: MemorySource) -> AnalyticsAssistant<MemorySource, CountingLlm> {
        AnalyticsAssistant::new(
            source,
            CountingLlm {
                calls: AtomicUsize::new(0),
            },
        )
    }

    #[tokio::test]
    async fn test_missing_sheet_fails_before_completion() {
        let assistant = assistant(MemorySource::default());
        let err = assistant.ask("What is the AR balance?").await.unwrap_err();

        assert!(matches!(err, AnalyticsError::DataUnavailable(_)));
        assert_eq!(assistant.completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_general_question_has_no_data_and_trimmed_answer() {
        let assistant = assistant(MemorySource::default());
        let response = assistant.ask("What's the weather today?").await.unwrap();

        assert_eq!(response.answer, "**Answer**");
        assert!(response.data.is_none());
        assert_eq!(assistant.completion.calls.load(Ordering::SeqCst), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
    }
}
