//! Pipeline stages and the result bundle handed back to callers.
//!
//! One request walks the stages strictly in order; no stage may be skipped
//! because each consumes the previous stage's output. `Failed` is a single
//! absorbing state reachable from any stage and is terminal for that request
//! only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::classification::Classification;
use crate::insight::InteractionInsight;

/// Fixed user-safe text returned when the pipeline lands in `Failed`.
pub const APOLOGY_TEXT: &str =
    "I'm having trouble processing your question right now. Please try again in a moment.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Classifying,
    Dispatching,
    ToneCheck,
    SafetyCheck,
    InsightExtraction,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classifying => "classifying",
            Self::Dispatching => "dispatching",
            Self::ToneCheck => "tone_check",
            Self::SafetyCheck => "safety_check",
            Self::InsightExtraction => "insight_extraction",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// What occupies the classification slot of a result bundle. A failed run
/// carries an error marker here so callers can distinguish pipeline failure
/// from a normal result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    Classified(Classification),
    Failed { error: String },
}

impl ClassificationOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// The sole bundle shape the pipeline hands to callers. Always well-formed:
/// a failed run still carries the fixed apology response and an empty insight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub response: String,
    pub classification: ClassificationOutcome,
    pub insights: InteractionInsight,
    pub timestamp: DateTime<Utc>,
}

impl PipelineOutcome {
    pub fn failed(error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            response: APOLOGY_TEXT.to_string(),
            classification: ClassificationOutcome::Failed { error: error.into() },
            insights: InteractionInsight::empty(at),
            timestamp: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{PipelineOutcome, PipelineStage, APOLOGY_TEXT};

    #[test]
    fn stage_labels_match_their_serialized_form() {
        for stage in [
            PipelineStage::Classifying,
            PipelineStage::Dispatching,
            PipelineStage::ToneCheck,
            PipelineStage::SafetyCheck,
            PipelineStage::InsightExtraction,
            PipelineStage::Done,
            PipelineStage::Failed,
        ] {
            let json = serde_json::to_string(&stage).expect("stage serializes");
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
    }

    #[test]
    fn failed_outcome_is_well_formed() {
        let outcome = PipelineOutcome::failed("generation failed", Utc::now());

        assert_eq!(outcome.response, APOLOGY_TEXT);
        assert!(outcome.classification.is_failed());
        assert!(outcome.insights.emotional_triggers.is_empty());
    }
}
