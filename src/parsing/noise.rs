//! Deterministic OCR repair rules.
//!
//! A rule table is an ordered list; earlier rules win. Within one pass a rule
//! never touches text that an earlier rule already rewrote. Passes repeat until
//! the text is stable, so `correct(correct(s)) == correct(s)`.

use regex::Regex;
use std::ops::Range;
use tracing::{debug, warn};

use crate::types::text_pair::{LanguageMode, TextField};

/// Upper bound on repeated passes. Every rule removes or replaces characters
/// without reintroducing its own pattern, so tables settle in two or three.
pub const MAX_CORRECTION_PASSES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Source,
    Translation,
    Both,
}

impl RuleField {
    pub fn applies_to(&self, field: TextField) -> bool {
        matches!(
            (self, field),
            (RuleField::Both, _) | (RuleField::Source, TextField::Source) | (RuleField::Translation, TextField::Translation)
        )
    }
}

#[derive(Debug, Clone)]
pub struct NoiseRule {
    pub name: &'static str,
    pub pattern: Regex,
    /// Expanded with `Captures::expand`, so `${1}` refers to capture groups.
    pub replacement: &'static str,
    pub field: RuleField,
}

impl NoiseRule {
    /// Rule patterns are compile-time literals; a bad one is a programming error
    /// caught by the table tests.
    pub fn new(name: &'static str, pattern: &str, replacement: &'static str, field: RuleField) -> Self {
        let pattern = Regex::new(pattern).unwrap_or_else(|e| panic!("noise rule '{}' has an invalid pattern: {}", name, e));
        NoiseRule { name, pattern, replacement, field }
    }
}

/// Separator OCR leaves between a contraction stem and its suffix when the
/// apostrophe is dropped or detached: whitespace (optionally followed by the
/// apostrophe) or an apostrophe followed by whitespace. A correctly written
/// contraction never matches.
const DETACHED: &str = r"(?:\s+'?|'\s+)";

/// Contraction and confusable repairs for English translation text. Shared by
/// every language configuration since the translation side is always English.
pub fn english_translation_rules() -> Vec<NoiseRule> {
    let field = RuleField::Translation;
    vec![
        NoiseRule::new(
            "misread-apostrophe",
            r"(?i)\b([a-z]+)[’‘`´](m|s|d|ll|ve|re|t)\b",
            "${1}'${2}",
            field,
        ),
        NoiseRule::new(
            "negative-contraction",
            &format!(
                r"(?i)\b(don|doesn|didn|isn|aren|wasn|weren|hasn|haven|hadn|couldn|wouldn|shouldn|mustn|needn|mightn|can|won|ain){}t\b",
                DETACHED
            ),
            "${1}'t",
            field,
        ),
        // Sentence-initial forms: capitalized, anchored, case-sensitive.
        NoiseRule::new(
            "initial-pronoun-re-ve-ll-d",
            &format!(r"^(You|We|They){}(re|ve|ll|d)\b", DETACHED),
            "${1}'${2}",
            field,
        ),
        NoiseRule::new(
            "initial-s",
            &format!(r"^(He|She|It|That|There|What|Who|Where|Here|How|Let){}s\b", DETACHED),
            "${1}'s",
            field,
        ),
        NoiseRule::new(
            "initial-ll-d",
            &format!(r"^(He|She|It|That|There|Who){}(ll|d)\b", DETACHED),
            "${1}'${2}",
            field,
        ),
        NoiseRule::new(
            "pronoun-i",
            &format!(r"\bI{}(m|d|ll|ve)\b", DETACHED),
            "I'${1}",
            field,
        ),
        // Mid-sentence forms: case-insensitive, case of the stem is preserved.
        NoiseRule::new(
            "pronoun-re-ve-ll-d",
            &format!(r"(?i)\b(you|we|they|who|what){}(re|ve|ll|d)\b", DETACHED),
            "${1}'${2}",
            field,
        ),
        NoiseRule::new(
            "stem-s",
            &format!(r"(?i)\b(he|she|it|that|there|what|who|where|here|how|let){}s\b", DETACHED),
            "${1}'s",
            field,
        ),
        NoiseRule::new(
            "stem-ll-d",
            &format!(r"(?i)\b(he|she|it|that|there){}(ll|d)\b", DETACHED),
            "${1}'${2}",
            field,
        ),
        NoiseRule::new(
            "modal-ve",
            &format!(r"(?i)\b(could|would|should|might|must){}ve\b", DETACHED),
            "${1}'ve",
            field,
        ),
        NoiseRule::new("bar-as-capital-i", r"\| ", "I ", field),
        NoiseRule::new("leading-one-or-l-as-capital-i", r"^[1l] ", "I ", field),
    ]
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// One pass over the table. Returns the rewritten text.
pub fn apply_pass(rules: &[NoiseRule], text: &str, field: TextField) -> String {
    let mut current = text.to_string();
    // Byte ranges in `current` produced by rules earlier in this pass.
    let mut rewritten: Vec<Range<usize>> = Vec::new();

    for rule in rules.iter().filter(|rule| rule.field.applies_to(field)) {
        let mut output = String::with_capacity(current.len());
        let mut next_rewritten: Vec<Range<usize>> = Vec::new();
        // (end of the replaced match in `current`, total shift after it)
        let mut shifts: Vec<(usize, isize)> = Vec::new();
        let mut total_shift: isize = 0;
        let mut last_end = 0;

        for caps in rule.pattern.captures_iter(&current) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.range().is_empty() || rewritten.iter().any(|range| overlaps(range, &whole.range())) {
                continue;
            }
            output.push_str(&current[last_end..whole.start()]);
            let start = output.len();
            caps.expand(rule.replacement, &mut output);
            next_rewritten.push(start..output.len());
            total_shift += (output.len() - start) as isize - whole.len() as isize;
            shifts.push((whole.end(), total_shift));
            last_end = whole.end();
        }

        if shifts.is_empty() {
            continue;
        }
        debug!(rule = rule.name, matches = shifts.len(), "noise rule applied");
        output.push_str(&current[last_end..]);

        for range in &rewritten {
            let shift = shifts
                .iter()
                .take_while(|(end, _)| *end <= range.start)
                .last()
                .map_or(0, |(_, shift)| *shift);
            let start = (range.start as isize + shift) as usize;
            let end = (range.end as isize + shift) as usize;
            next_rewritten.push(start..end);
        }

        current = output;
        rewritten = next_rewritten;
    }
    current
}

/// Runs passes until the text stops changing.
pub fn correct_with(rules: &[NoiseRule], text: &str, field: TextField) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_CORRECTION_PASSES {
        let next = apply_pass(rules, &current, field);
        if next == current {
            return current;
        }
        current = next;
    }
    warn!(text, "noise correction did not settle within {} passes", MAX_CORRECTION_PASSES);
    current
}

/// Applies the correction rules of `mode` that target `field`.
pub fn correct(text: &str, mode: LanguageMode, field: TextField) -> String {
    mode.rules().correct(text, field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_translation(text: &str) -> String {
        correct_with(&english_translation_rules(), text, TextField::Translation)
    }

    #[test]
    fn rejoins_detached_contractions() {
        assert_eq!(fix_translation("I m happy"), "I'm happy");
        assert_eq!(fix_translation("You re late and I ll wait."), "You're late and I'll wait.");
        assert_eq!(fix_translation("She doesn t know that it s here."), "She doesn't know that it's here.");
        assert_eq!(fix_translation("We can t go, but they ve gone."), "We can't go, but they've gone.");
        assert_eq!(fix_translation("Let s eat."), "Let's eat.");
        assert_eq!(fix_translation("You should ve called."), "You should've called.");
    }

    #[test]
    fn repairs_detached_and_misread_apostrophes() {
        assert_eq!(fix_translation("I 'm here."), "I'm here.");
        assert_eq!(fix_translation("I' m here."), "I'm here.");
        assert_eq!(fix_translation("I’m here and it`s fine."), "I'm here and it's fine.");
    }

    #[test]
    fn keeps_case_of_mid_sentence_stems() {
        assert_eq!(fix_translation("Yes, THEY re here."), "Yes, THEY're here.");
        assert_eq!(fix_translation("Well, WHO s there?"), "Well, WHO's there?");
    }

    #[test]
    fn fixes_character_confusables() {
        assert_eq!(fix_translation("| have a cat."), "I have a cat.");
        assert_eq!(fix_translation("1 have a cat."), "I have a cat.");
        assert_eq!(fix_translation("l have a cat."), "I have a cat.");
        // only at the start of the segment
        assert_eq!(fix_translation("Give me 1 cat."), "Give me 1 cat.");
    }

    #[test]
    fn confusable_then_contraction_settles() {
        assert_eq!(fix_translation("| m happy"), "I'm happy");
        assert_eq!(fix_translation("l m happy"), "I'm happy");
    }

    #[test]
    fn leaves_correct_text_alone() {
        for text in ["I'm happy", "It's a cat.", "Don't go!", "I am here.", "The cats sit."] {
            assert_eq!(fix_translation(text), text);
        }
    }

    #[test]
    fn correction_is_idempotent() {
        let samples = [
            "I m happy",
            "| m happy, you re sad",
            "l d like that s all",
            "THEY re here and WE ll see",
            "won t, can t, isn t",
            "Hello world.",
            "",
        ];
        for sample in samples {
            let once = fix_translation(sample);
            assert_eq!(fix_translation(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn rewritten_regions_are_not_matched_again_in_the_same_pass() {
        let rules = vec![
            NoiseRule::new("first", "ab", "X", RuleField::Both),
            NoiseRule::new("second", "Xc", "Y", RuleField::Both),
        ];
        assert_eq!(apply_pass(&rules, "abc Xc", TextField::Source), "Xc Y");
        // the next pass is free to continue from the rewritten text
        assert_eq!(correct_with(&rules, "abc Xc", TextField::Source), "Y Y");
    }

    #[test]
    fn shifted_regions_stay_protected_after_earlier_rewrites() {
        let rules = vec![
            NoiseRule::new("grow", "q", "QQQ", RuleField::Both),
            NoiseRule::new("mark", "m", "M", RuleField::Both),
            NoiseRule::new("join", "QM", "!", RuleField::Both),
        ];
        // "mark" output at the end lands after the grown "QQQ"; "join" must
        // see both as rewritten and leave them.
        assert_eq!(apply_pass(&rules, "qm", TextField::Source), "QQQM");
    }

    #[test]
    fn translation_rules_skip_the_source_field() {
        let rules = english_translation_rules();
        assert_eq!(correct_with(&rules, "| m", TextField::Source), "| m");
    }

    #[test]
    fn rule_field_applicability() {
        assert!(RuleField::Both.applies_to(TextField::Source));
        assert!(RuleField::Source.applies_to(TextField::Source));
        assert!(!RuleField::Source.applies_to(TextField::Translation));
        assert!(RuleField::Translation.applies_to(TextField::Translation));
    }
}
