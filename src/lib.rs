//! RCM analytics question router.
//!
//! Classifies a free-text revenue-cycle question, runs the matching
//! aggregation over the dataset and has a completion service narrate the
//! computed numbers.

pub mod analytics;
pub mod assistant;
pub mod config;
pub mod dataset;
pub mod error;
pub mod llm;
pub mod narration;
pub mod router;

pub use analytics::{AnalyticsResult, Operation, OperationKind};
pub use assistant::{AnalyticsAssistant, AssistantResponse};
pub use config::AppConfig;
pub use dataset::{DatasetSource, Sheet, TabularSource};
pub use error::{AnalyticsError, Result};
pub use llm::{ChatMessage, CompletionService, LlmClient, Role};
pub use router::{classify, Route};
