//! Narration Request Builder
//!
//! Turns an aggregation result into the instruction payload sent to the
//! completion service. The question is never forwarded with a data result;
//! the model only sees the computed numbers.

use crate::analytics::AnalyticsResult;
use crate::llm::ChatMessage;
use tracing::debug;

pub const CLOSING_LINE: &str = "Ask any questions related to the dataset.";

pub const NARRATION_SYSTEM_PROMPT: &str = r#"You are a senior Healthcare RCM Analytics Assistant.

ABSOLUTE RULES (HARD):
- Use ONLY the provided computed results
- Do NOT invent data or assumptions
- Do NOT repeat, restate, paraphrase, or reference the user question in any form
- Do NOT include prefixes like "Q:", "Question:", or restated titles
- Do NOT reference external benchmarks or industry stats
- Do NOT use vague phrases like "optimize revenue cycle"

RESPONSE STRUCTURE (MANDATORY):
1. Start DIRECTLY with a concise **bold title** describing the result
   (Never restate the question)
2. Present key values clearly using bullet points
3. Add a **Key observations** section:
   - Analyze patterns, gaps, or clustering in the numbers
   - Compare values when relevant
   - Reason ONLY from the computed data
4. Add an **Implications** section:
   - Explain what the numbers suggest operationally
   - Stay strictly grounded in the data
5. Add **2-3 follow-up questions** that CAN be answered from this dataset
6. End with EXACTLY one line:
"Ask any questions related to the dataset."

STYLE:
- Analytical
- Business-facing
- Medium depth (not shallow, not verbose)
- No filler"#;

pub const GENERAL_SYSTEM_PROMPT: &str = "Answer briefly and clearly. Do not mention datasets.";

const DATA_HEADER: &str = "COMPUTED DATA:";
const DATA_TASK: &str = "Answer using the computed data below.";

/// System instruction plus user block, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPayload {
    pub system: String,
    pub user: String,
}

impl InstructionPayload {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }
}

pub fn build_narration_request(question: &str, result: &AnalyticsResult) -> InstructionPayload {
    debug!(question_chars = question.len(), "Building narration request");

    InstructionPayload {
        system: NARRATION_SYSTEM_PROMPT.to_string(),
        user: format!("{}\n{}", render_computed_data(result), DATA_TASK),
    }
}

/// Unmatched questions are forwarded verbatim under the generic instruction.
pub fn build_general_request(question: &str) -> InstructionPayload {
    InstructionPayload {
        system: GENERAL_SYSTEM_PROMPT.to_string(),
        user: question.to_string(),
    }
}

pub fn render_computed_data(result: &AnalyticsResult) -> String {
    let mut block = String::from(DATA_HEADER);
    block.push('\n');
    for (key, value) in result.key_values() {
        block.push_str(&format!("{}: {}\n", key, value));
    }
    block
}
