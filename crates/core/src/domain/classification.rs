use serde::{Deserialize, Serialize};

/// Which specialized responder a query is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Product,
    Education,
    Reassurance,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Education => "education",
            Self::Reassurance => "reassurance",
        }
    }

    /// Lenient label parse for model output. Unrecognized labels yield `None`;
    /// the caller decides the safe default.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "product" => Some(Self::Product),
            "education" => Some(Self::Education),
            "reassurance" => Some(Self::Reassurance),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Question,
    Concern,
    Comparison,
    Complaint,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Concern => "concern",
            Self::Comparison => "comparison",
            Self::Complaint => "complaint",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Anxious,
    Embarrassed,
    Curious,
    Confident,
    Frustrated,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anxious => "anxious",
            Self::Embarrassed => "embarrassed",
            Self::Curious => "curious",
            Self::Confident => "confident",
            Self::Frustrated => "frustrated",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Awareness,
    Consideration,
    Purchase,
    Retention,
}

/// Fully-populated label set for one query. Every field is total; callers never
/// observe a partially-classified query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub primary_agent: AgentKind,
    pub intent: Intent,
    pub emotion: Emotion,
    pub urgency: Urgency,
    pub funnel_stage: FunnelStage,
    pub concerns: Vec<String>,
}

impl Classification {
    /// The fixed safe default used whenever automated classification cannot be
    /// parsed. Deliberately ignores query content; routing lands on the
    /// reassurance responder.
    pub fn fallback() -> Self {
        Self {
            primary_agent: AgentKind::Reassurance,
            intent: Intent::Question,
            emotion: Emotion::Curious,
            urgency: Urgency::Medium,
            funnel_stage: FunnelStage::Consideration,
            concerns: Vec::new(),
        }
    }
}

/// Loosely-typed shape of what the model actually emits. Each field is optional
/// and free-text; `resolve` fills gaps from the fixed fallback so the result is
/// always total.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClassificationDraft {
    #[serde(default, alias = "PRIMARY_AGENT")]
    pub primary_agent: Option<String>,
    #[serde(default, alias = "INTENT")]
    pub intent: Option<String>,
    #[serde(default, alias = "EMOTION")]
    pub emotion: Option<String>,
    #[serde(default, alias = "URGENCY")]
    pub urgency: Option<String>,
    #[serde(default, alias = "FUNNEL_STAGE")]
    pub funnel_stage: Option<String>,
    #[serde(default, alias = "CONCERNS")]
    pub concerns: Option<Vec<String>>,
}

impl ClassificationDraft {
    pub fn resolve(self) -> Classification {
        let fallback = Classification::fallback();
        Classification {
            primary_agent: self
                .primary_agent
                .as_deref()
                .and_then(AgentKind::parse_label)
                .unwrap_or(fallback.primary_agent),
            intent: self
                .intent
                .as_deref()
                .and_then(parse_intent)
                .unwrap_or(fallback.intent),
            emotion: self
                .emotion
                .as_deref()
                .and_then(parse_emotion)
                .unwrap_or(fallback.emotion),
            urgency: self
                .urgency
                .as_deref()
                .and_then(parse_urgency)
                .unwrap_or(fallback.urgency),
            funnel_stage: self
                .funnel_stage
                .as_deref()
                .and_then(parse_funnel_stage)
                .unwrap_or(fallback.funnel_stage),
            concerns: self.concerns.unwrap_or_default(),
        }
    }
}

fn parse_intent(label: &str) -> Option<Intent> {
    match label.trim().to_ascii_lowercase().as_str() {
        "question" => Some(Intent::Question),
        "concern" => Some(Intent::Concern),
        "comparison" => Some(Intent::Comparison),
        "complaint" => Some(Intent::Complaint),
        _ => None,
    }
}

fn parse_emotion(label: &str) -> Option<Emotion> {
    match label.trim().to_ascii_lowercase().as_str() {
        "anxious" => Some(Emotion::Anxious),
        "embarrassed" => Some(Emotion::Embarrassed),
        "curious" => Some(Emotion::Curious),
        "confident" => Some(Emotion::Confident),
        "frustrated" => Some(Emotion::Frustrated),
        _ => None,
    }
}

fn parse_urgency(label: &str) -> Option<Urgency> {
    match label.trim().to_ascii_lowercase().as_str() {
        "low" => Some(Urgency::Low),
        "medium" => Some(Urgency::Medium),
        "high" => Some(Urgency::High),
        _ => None,
    }
}

fn parse_funnel_stage(label: &str) -> Option<FunnelStage> {
    match label.trim().to_ascii_lowercase().as_str() {
        "awareness" => Some(FunnelStage::Awareness),
        "consideration" => Some(FunnelStage::Consideration),
        "purchase" => Some(FunnelStage::Purchase),
        "retention" => Some(FunnelStage::Retention),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentKind, Classification, ClassificationDraft, Emotion, Intent, Urgency};

    #[test]
    fn fallback_routes_to_reassurance() {
        let fallback = Classification::fallback();
        assert_eq!(fallback.primary_agent, AgentKind::Reassurance);
        assert_eq!(fallback.intent, Intent::Question);
        assert_eq!(fallback.emotion, Emotion::Curious);
        assert_eq!(fallback.urgency, Urgency::Medium);
        assert!(fallback.concerns.is_empty());
    }

    #[test]
    fn draft_resolution_fills_missing_fields_from_fallback() {
        let draft = ClassificationDraft {
            primary_agent: Some("product".to_string()),
            urgency: Some("high".to_string()),
            ..ClassificationDraft::default()
        };

        let classification = draft.resolve();
        assert_eq!(classification.primary_agent, AgentKind::Product);
        assert_eq!(classification.urgency, Urgency::High);
        assert_eq!(classification.intent, Intent::Question);
        assert_eq!(classification.emotion, Emotion::Curious);
    }

    #[test]
    fn unrecognized_labels_resolve_to_fallback_values() {
        let draft = ClassificationDraft {
            primary_agent: Some("escalation".to_string()),
            intent: Some("rant".to_string()),
            emotion: Some("ecstatic".to_string()),
            ..ClassificationDraft::default()
        };

        let classification = draft.resolve();
        assert_eq!(classification.primary_agent, AgentKind::Reassurance);
        assert_eq!(classification.intent, Intent::Question);
        assert_eq!(classification.emotion, Emotion::Curious);
    }

    #[test]
    fn draft_parses_model_json_with_uppercase_keys() {
        let raw = r#"{
            "PRIMARY_AGENT": "education",
            "INTENT": "concern",
            "EMOTION": "anxious",
            "URGENCY": "low",
            "FUNNEL_STAGE": "awareness",
            "CONCERNS": ["irritation", "leakage"]
        }"#;

        let draft: ClassificationDraft = serde_json::from_str(raw).expect("draft should parse");
        let classification = draft.resolve();

        assert_eq!(classification.primary_agent, AgentKind::Education);
        assert_eq!(classification.intent, Intent::Concern);
        assert_eq!(classification.concerns, vec!["irritation", "leakage"]);
    }

    #[test]
    fn agent_label_parse_is_case_insensitive() {
        assert_eq!(AgentKind::parse_label(" Product "), Some(AgentKind::Product));
        assert_eq!(AgentKind::parse_label("REASSURANCE"), Some(AgentKind::Reassurance));
        assert_eq!(AgentKind::parse_label("triage"), None);
    }
}
