pub mod config;
pub mod domain;
pub mod errors;
pub mod insight;
pub mod pipeline;
pub mod safety;
pub mod tone;

pub use domain::classification::{
    AgentKind, Classification, ClassificationDraft, Emotion, FunnelStage, Intent, Urgency,
};
pub use domain::context::UserContext;
pub use domain::knowledge::{Namespace, Snippet};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use insight::{EmotionLexicon, InsightExtractor, InteractionInsight};
pub use pipeline::{ClassificationOutcome, PipelineOutcome, PipelineStage, APOLOGY_TEXT};
pub use safety::{SafetyPolicy, SafetyValidator, SafetyVerdict};
pub use tone::{TonePolicy, ToneValidator};
