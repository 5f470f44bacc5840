//! Derives lightweight analytics signals from one interaction.
//!
//! Extraction is pure keyword matching against a fixed lexicon and never
//! fails; a query with no emotional cues yields an empty trigger set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::classification::{Classification, Emotion, Intent};
use crate::domain::context::UserContext;

/// Structured summary of one interaction for downstream analytics.
/// Write-once: the pipeline never mutates a previously produced insight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionInsight {
    pub query_type: Intent,
    pub emotional_triggers: BTreeSet<Emotion>,
    pub raw_query_echo: String,
    pub captured_at: DateTime<Utc>,
}

impl InteractionInsight {
    /// The insight attached to a failed pipeline run. Carries no signals.
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self {
            query_type: Intent::Question,
            emotional_triggers: BTreeSet::new(),
            raw_query_echo: String::new(),
            captured_at,
        }
    }
}

/// Fixed per-emotion trigger-word lists. A query may match zero, one, or
/// several categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionLexicon {
    entries: Vec<(Emotion, Vec<String>)>,
}

impl Default for EmotionLexicon {
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|word| word.to_string()).collect()
        }

        Self {
            entries: vec![
                (Emotion::Anxious, words(&["worried", "scared", "concerned", "afraid"])),
                (Emotion::Embarrassed, words(&["awkward", "shy", "uncomfortable", "private"])),
                (Emotion::Curious, words(&["wondering", "what is", "how does", "explain"])),
                (Emotion::Confident, words(&["best", "recommend", "should i", "can i"])),
                (Emotion::Frustrated, words(&["doesn't work", "hate", "problem", "issue"])),
            ],
        }
    }
}

impl EmotionLexicon {
    pub fn detect(&self, query: &str) -> BTreeSet<Emotion> {
        let folded = query.to_lowercase();
        self.entries
            .iter()
            .filter(|(_, triggers)| {
                triggers.iter().any(|trigger| folded.contains(trigger.as_str()))
            })
            .map(|(emotion, _)| *emotion)
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct InsightExtractor {
    lexicon: EmotionLexicon,
}

impl InsightExtractor {
    pub fn new(lexicon: EmotionLexicon) -> Self {
        Self { lexicon }
    }

    /// Never blocks or fails the pipeline.
    pub fn extract(
        &self,
        query: &str,
        _response: &str,
        classification: &Classification,
        _user_context: &UserContext,
    ) -> InteractionInsight {
        InteractionInsight {
            query_type: classification.intent,
            emotional_triggers: self.lexicon.detect(query),
            raw_query_echo: query.to_string(),
            captured_at: Utc::now(),
        }
    }
}
