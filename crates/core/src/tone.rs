//! Tone rule engine.
//!
//! Pass-through with both checks disabled, which is the shipped default. The
//! contract still allows rewriting: the compassion check prepends a validating
//! opener and the accuracy check softens absolute claims. Validation never
//! fails; the worst case is the original text unchanged.

use serde::{Deserialize, Serialize};

use crate::domain::classification::Classification;

const COMPASSION_MARKERS: &[&str] = &[
    "understand",
    "normal",
    "you're not alone",
    "we support",
    "it's okay",
    "completely valid",
    "i hear you",
];

/// Absolute-claim spelling and its softened replacement.
const ABSOLUTE_CLAIMS: &[(&str, &str)] = &[
    ("guaranteed", "likely"),
    ("always", "often"),
    ("never", "rarely"),
    ("cure", "help with"),
];

const VALIDATING_OPENER: &str = "I hear you, and what you're feeling is completely valid. ";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonePolicy {
    pub enforce_compassion: bool,
    pub enforce_accuracy: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ToneValidator {
    policy: TonePolicy,
}

impl ToneValidator {
    pub fn new(policy: TonePolicy) -> Self {
        Self { policy }
    }

    /// Returns the response text, possibly rewritten. Infallible by contract.
    pub fn validate(&self, response: &str, _classification: &Classification) -> String {
        let mut text = response.to_string();

        if self.policy.enforce_accuracy && !Self::check_accuracy(&text) {
            text = soften_absolutes(&text);
        }

        if self.policy.enforce_compassion && !Self::check_compassion(&text) {
            text = format!("{VALIDATING_OPENER}{text}");
        }

        text
    }

    /// True when the text carries validating language.
    pub fn check_compassion(response: &str) -> bool {
        let folded = response.to_lowercase();
        COMPASSION_MARKERS.iter().any(|marker| folded.contains(marker))
    }

    /// True when the text avoids absolute claims. Matches whole words only,
    /// so "secure" does not count as a "cure" claim.
    pub fn check_accuracy(response: &str) -> bool {
        ABSOLUTE_CLAIMS.iter().all(|(claim, _)| !contains_word(response, claim))
    }
}

fn soften_absolutes(response: &str) -> String {
    let mut output = response.to_string();
    for (claim, replacement) in ABSOLUTE_CLAIMS {
        output = replace_word(&output, claim, replacement);
    }
    output
}

/// Case-insensitive whole-word replacement. Case folding is done per
/// character while scanning, never by indexing a folded copy: folding can
/// change byte lengths (ẞ→ß, İ→i̇), so offsets into `text.to_lowercase()` are
/// not valid offsets into `text`.
fn replace_word(text: &str, needle: &str, replacement: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    let mut prev: Option<char> = None;

    while !rest.is_empty() {
        if word_starts_here(prev, rest, needle) {
            // folded_prefix_len is Some by the check above.
            if let Some(len) = folded_prefix_len(rest, needle) {
                output.push_str(replacement);
                prev = replacement.chars().last().or(prev);
                rest = &rest[len..];
                continue;
            }
        }

        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            output.push(ch);
            prev = Some(ch);
            rest = chars.as_str();
        }
    }

    output
}

fn contains_word(text: &str, needle: &str) -> bool {
    let mut rest = text;
    let mut prev: Option<char> = None;

    while !rest.is_empty() {
        if word_starts_here(prev, rest, needle) {
            return true;
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some(ch) => {
                prev = Some(ch);
                rest = chars.as_str();
            }
            None => break,
        }
    }

    false
}

/// True when `rest` opens with `needle` (case-folded) as a whole word: no
/// alphanumeric character directly before or after the match.
fn word_starts_here(prev: Option<char>, rest: &str, needle: &str) -> bool {
    if prev.is_some_and(char::is_alphanumeric) {
        return false;
    }
    match folded_prefix_len(rest, needle) {
        Some(len) => !rest[len..].chars().next().is_some_and(char::is_alphanumeric),
        None => false,
    }
}

/// Byte length of the shortest prefix of `text` whose case-folded form equals
/// `needle`, if one exists. Never splits a character: a character whose fold
/// runs past the end of `needle` is not a match.
fn folded_prefix_len(text: &str, needle: &str) -> Option<usize> {
    let mut pending = needle.chars();
    let mut consumed = 0;

    for ch in text.chars() {
        for folded in ch.to_lowercase() {
            if pending.next() != Some(folded) {
                return None;
            }
        }
        consumed += ch.len_utf8();
        if pending.as_str().is_empty() {
            return Some(consumed);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use crate::domain::classification::Classification;

    use super::{TonePolicy, ToneValidator};

    #[test]
    fn default_policy_is_pass_through() {
        let validator = ToneValidator::default();
        let text = "This product is guaranteed to always work.";

        let validated = validator.validate(text, &Classification::fallback());
        assert_eq!(validated, text);
    }

    #[test]
    fn accuracy_enforcement_softens_absolute_claims() {
        let validator = ToneValidator::new(TonePolicy {
            enforce_accuracy: true,
            ..TonePolicy::default()
        });

        let validated = validator.validate(
            "This always helps and is guaranteed to work.",
            &Classification::fallback(),
        );

        assert!(!validated.to_lowercase().contains("always"));
        assert!(!validated.to_lowercase().contains("guaranteed"));
        assert!(validated.contains("often helps"));
    }

    #[test]
    fn compassion_enforcement_prepends_validating_opener_when_missing() {
        let validator = ToneValidator::new(TonePolicy {
            enforce_compassion: true,
            ..TonePolicy::default()
        });

        let validated =
            validator.validate("Try a wider pad for night use.", &Classification::fallback());
        assert!(validated.starts_with("I hear you"));

        let already_validating = validator.validate(
            "It's completely normal to feel this way. A wider pad helps.",
            &Classification::fallback(),
        );
        assert!(!already_validating.starts_with("I hear you,"));
    }

    #[test]
    fn accuracy_softening_is_safe_on_text_whose_fold_changes_byte_length() {
        let validator = ToneValidator::new(TonePolicy {
            enforce_accuracy: true,
            ..TonePolicy::default()
        });

        // Capital sharp s folds to a shorter byte sequence.
        let softened =
            validator.validate("Gro\u{1E9E}e never leaks.", &Classification::fallback());
        assert_eq!(softened, "Gro\u{1E9E}e rarely leaks.");

        // Dotted capital I folds to two characters.
        let softened = validator.validate("İt is NEVER guaranteed.", &Classification::fallback());
        assert_eq!(softened, "İt is rarely likely.");

        // A claim word glued to a letter is part of a larger word; leave it.
        let untouched = validator.validate("\u{1E9E}never leaks.", &Classification::fallback());
        assert_eq!(untouched, "\u{1E9E}never leaks.");
    }

    #[test]
    fn claim_words_embedded_in_larger_words_are_left_alone() {
        let validator = ToneValidator::new(TonePolicy {
            enforce_accuracy: true,
            ..TonePolicy::default()
        });

        let softened =
            validator.validate("This secure pad never leaks.", &Classification::fallback());
        assert_eq!(softened, "This secure pad rarely leaks.");

        assert!(ToneValidator::check_accuracy("A secure, procured fit."));
        assert!(!ToneValidator::check_accuracy("Results are guaranteed."));
    }

    #[test]
    fn compassion_and_accuracy_checks_are_observable_independently() {
        assert!(ToneValidator::check_compassion("We support you, this is normal."));
        assert!(!ToneValidator::check_compassion("Use the blue one."));
        assert!(ToneValidator::check_accuracy("This may help most users."));
        assert!(!ToneValidator::check_accuracy("This will never leak."));
    }
}
