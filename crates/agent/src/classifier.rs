//! LLM-backed query classification.
//!
//! One fixed-shape prompt, one call, one lenient parse. Any failure along the
//! way resolves to the fixed fallback label set; classification is total and
//! never surfaces an error to the orchestrator.

use std::sync::Arc;

use tracing::debug;

use mira_core::{Classification, ClassificationDraft};

use crate::llm::LlmClient;

const CLASSIFY_SYSTEM: &str =
    "You label customer queries for a women's wellness support assistant. \
     Respond with a single JSON object and nothing else.";

const CLASSIFY_TEMPERATURE: f32 = 0.0;

pub struct QueryClassifier {
    llm: Arc<dyn LlmClient>,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Classify one query. Infallible by contract: parse or transport failure
    /// degrades silently to `Classification::fallback()`.
    pub async fn classify(&self, query: &str) -> Classification {
        let prompt = classification_prompt(query);

        let raw = match self.llm.generate(CLASSIFY_SYSTEM, &prompt, CLASSIFY_TEMPERATURE).await {
            Ok(raw) => raw,
            Err(error) => {
                debug!(
                    event_name = "classifier.model_unavailable",
                    error = %error,
                    "classification call failed; using fallback labels"
                );
                return Classification::fallback();
            }
        };

        match serde_json::from_str::<ClassificationDraft>(strip_code_fences(&raw)) {
            Ok(draft) => draft.resolve(),
            Err(error) => {
                debug!(
                    event_name = "classifier.unparseable_labels",
                    error = %error,
                    "classification output did not parse; using fallback labels"
                );
                Classification::fallback()
            }
        }
    }
}

fn classification_prompt(query: &str) -> String {
    format!(
        "Analyze this customer query from a women's wellness platform.\n\
         \n\
         Customer query: \"{query}\"\n\
         \n\
         Determine:\n\
         1. primary_agent: one of \"product\" (product recommendation), \
         \"education\" (health information), \"reassurance\" (emotional support)\n\
         2. intent: \"question\" | \"concern\" | \"comparison\" | \"complaint\"\n\
         3. emotion: \"anxious\" | \"embarrassed\" | \"curious\" | \"confident\" | \"frustrated\"\n\
         4. urgency: \"low\" | \"medium\" | \"high\"\n\
         5. funnel_stage: \"awareness\" | \"consideration\" | \"purchase\" | \"retention\"\n\
         6. concerns: list of specific concerns (e.g. \"discomfort\", \"irritation\", \"leakage\")\n\
         \n\
         Respond as JSON only."
    )
}

/// Models frequently wrap JSON in markdown fences despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}
