//! Deterministic safety rule engine.
//!
//! Rules are an ordered table evaluated top to bottom against case-folded
//! text. Rule one (high-risk medical claims) is terminal: it replaces the
//! response outright. The remaining rules append fixed suffixes and are
//! cumulative. All guards read the original response text, so re-validating
//! an already-suffixed response never duplicates a suffix.

use serde::{Deserialize, Serialize};

pub const REFUSAL_TEXT: &str =
    "I cannot provide medical guarantees. Please consult a doctor for treatment.";
pub const URGENT_CARE_NOTICE: &str =
    "\n\nGiven what you described, please visit a doctor immediately.";
pub const MEDICAL_DISCLAIMER: &str = "\n\n(Note: I am an AI assistant, not a doctor. \
     Please consult a healthcare professional for specific medical advice.)";
const EMPTY_RESPONSE_TEXT: &str = "I don't have a helpful answer to that right now. \
     Please reach out to our support team or consult a healthcare professional.";

/// Verdict for one response. `effective_response` is the text to surface and
/// is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub is_safe: bool,
    pub reason: Option<String>,
    pub effective_response: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanTarget {
    Response,
    Query,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RuleEffect {
    /// Replace the whole response with the fixed refusal. Terminal.
    Reject,
    /// Append the urgent-care notice unless the response already points at a
    /// doctor or healthcare professional.
    AppendUrgentCare,
    /// Append the medical disclaimer unless the response already mentions a
    /// doctor.
    AppendDisclaimer,
}

#[derive(Clone, Debug)]
struct SafetyRule {
    name: &'static str,
    target: ScanTarget,
    patterns: Vec<String>,
    effect: RuleEffect,
}

/// Keyword configuration for the safety validator. Holds only read-only data
/// after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    pub high_risk_claims: Vec<String>,
    pub emergency_keywords: Vec<String>,
    pub medical_topics: Vec<String>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            high_risk_claims: vec![
                "guarantee cure".to_string(),
                "will cure".to_string(),
                "100% effective against infection".to_string(),
                "stop taking medication".to_string(),
            ],
            emergency_keywords: vec![
                "severe bleeding".to_string(),
                "fainted".to_string(),
                "unbearable pain".to_string(),
                "high fever".to_string(),
            ],
            medical_topics: vec![
                "pcod".to_string(),
                "pcos".to_string(),
                "infection".to_string(),
                "rash".to_string(),
                "cramps".to_string(),
                "period".to_string(),
            ],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SafetyValidator {
    policy: SafetyPolicy,
}

impl SafetyValidator {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// Evaluate the rule table against a response and the query that produced
    /// it. Pure string work; cannot fail.
    pub fn validate(&self, response: &str, query: &str) -> SafetyVerdict {
        let folded_response = response.to_lowercase();
        let folded_query = query.to_lowercase();

        let mut effective = response.to_string();
        let mut is_safe = true;
        let mut reason = None;

        for rule in self.rules() {
            let haystack = match rule.target {
                ScanTarget::Response => &folded_response,
                ScanTarget::Query => &folded_query,
            };
            let Some(matched) = first_match(haystack, &rule.patterns) else {
                continue;
            };

            match rule.effect {
                RuleEffect::Reject => {
                    is_safe = false;
                    reason = Some(format!("{}: {matched}", rule.name));
                    effective = REFUSAL_TEXT.to_string();
                    // Terminal branch for this call; no suffixes stack on the
                    // refusal text.
                    break;
                }
                RuleEffect::AppendUrgentCare => {
                    if !mentions_care_provider(&folded_response) {
                        effective.push_str(URGENT_CARE_NOTICE);
                    }
                }
                RuleEffect::AppendDisclaimer => {
                    if !folded_response.contains("doctor") {
                        effective.push_str(MEDICAL_DISCLAIMER);
                    }
                }
            }
        }

        if effective.trim().is_empty() {
            effective = EMPTY_RESPONSE_TEXT.to_string();
        }

        SafetyVerdict { is_safe, reason, effective_response: effective }
    }

    fn rules(&self) -> [SafetyRule; 3] {
        [
            SafetyRule {
                name: "high_risk_medical_claim",
                target: ScanTarget::Response,
                patterns: self.policy.high_risk_claims.clone(),
                effect: RuleEffect::Reject,
            },
            SafetyRule {
                name: "emergency_symptom",
                target: ScanTarget::Query,
                patterns: self.policy.emergency_keywords.clone(),
                effect: RuleEffect::AppendUrgentCare,
            },
            SafetyRule {
                name: "medical_topic",
                target: ScanTarget::Response,
                patterns: self.policy.medical_topics.clone(),
                effect: RuleEffect::AppendDisclaimer,
            },
        ]
    }
}

fn first_match<'a>(haystack: &str, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| haystack.contains(pattern.as_str()))
        .map(String::as_str)
}

fn mentions_care_provider(folded_response: &str) -> bool {
    folded_response.contains("doctor") || folded_response.contains("healthcare")
}
