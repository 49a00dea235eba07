use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::{finish_segmentation, LanguageRules};
use crate::annotation::selection::Granularity;
use crate::error::SegmentationFailure;
use crate::parsing::noise::{english_translation_rules, NoiseRule, RuleField};
use crate::parsing::segmenter::{collapse_whitespace, remove_whitespace, strip_caption_line, strip_chars, SegmentedText};
use crate::types::text_pair::LanguageMode;

pub const JAPANESE_DELIMITERS: &[char] = &['。', '！', '？'];

/// Bracket glyphs the lesson screens draw around prompts.
pub const DECORATIVE_BRACKETS: &[char] = &['【', '】', '〖', '〗', '〔', '〕'];

/// Japanese source, English translation. Japanese has no spaces between
/// words, so selections are free substrings picked by content.
#[derive(Debug, Clone, Copy, Default)]
pub struct JapaneseRules;

fn is_japanese_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}' // CJK ideographs
        | '\u{FF66}'..='\u{FF9F}' // half-width katakana
        | '々' | '〆')
}

/// Western `!`/`?` right after kana or kanji are the source sentence's own
/// marks; rewrite them to the native forms the delimiter search expects.
fn nativize_terminal_marks(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut previous: Option<char> = None;
    for c in text.chars() {
        let mapped = match (c, previous) {
            ('!', Some(p)) if is_japanese_char(p) => '！',
            ('?', Some(p)) if is_japanese_char(p) => '？',
            _ => c,
        };
        output.push(mapped);
        previous = Some(c);
    }
    output
}

/// Full-width marks OCR puts after English words go back to ASCII so the
/// translation pattern can see them.
fn westernize_terminal_marks(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut previous: Option<char> = None;
    for c in text.chars() {
        let after_latin = previous.map_or(false, |p| p.is_ascii_alphanumeric() || matches!(p, '"' | '\'' | ')'));
        let mapped = match c {
            '！' if after_latin => '!',
            '？' if after_latin => '?',
            '．' | '。' if after_latin => '.',
            _ => c,
        };
        output.push(mapped);
        previous = Some(c);
    }
    output
}

fn translation_sentence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^。！？]+?[.!?]").unwrap_or_else(|e| panic!("invalid translation pattern: {}", e)))
}

impl JapaneseRules {
    fn failure(&self, reason: &str) -> SegmentationFailure {
        SegmentationFailure::new(LanguageMode::Japanese, reason)
    }
}

impl LanguageRules for JapaneseRules {
    fn mode(&self) -> LanguageMode {
        LanguageMode::Japanese
    }

    fn granularity(&self) -> Granularity {
        Granularity::Substring
    }

    fn source_delimiters(&self) -> &'static [char] {
        JAPANESE_DELIMITERS
    }

    fn noise_rules(&self) -> &'static [NoiseRule] {
        static RULES: OnceLock<Vec<NoiseRule>> = OnceLock::new();
        RULES.get_or_init(|| {
            let mut rules = vec![NoiseRule::new(
                "leading-stray-symbols",
                r"^[^\p{Latin}\p{Han}\s\d]?[・•●○◯◎□■◆◇▶▷►▸*＊#＃|｜:：;；~～〜_＿=＝\-]+\s*",
                "",
                RuleField::Source,
            )];
            rules.extend(english_translation_rules());
            rules
        })
    }

    fn segment(&self, raw_text: &str) -> Result<SegmentedText, SegmentationFailure> {
        let without_brackets = strip_chars(raw_text, DECORATIVE_BRACKETS);
        let without_caption = strip_caption_line(&without_brackets);
        let normalized_text = nativize_terminal_marks(&collapse_whitespace(&without_caption));

        let Some((delimiter_pos, delimiter)) = normalized_text
            .char_indices()
            .find(|(_, c)| self.source_delimiters().contains(c))
        else {
            return Err(self.failure("no Japanese sentence delimiter found"));
        };

        let source_end = delimiter_pos + delimiter.len_utf8();
        let source = remove_whitespace(&normalized_text[..source_end]);
        let remainder = westernize_terminal_marks(&normalized_text[source_end..]);
        debug!(source = %source, remainder = %remainder, "japanese source run located");

        let Some(translation_match) = translation_sentence_pattern().find(&remainder) else {
            return Err(self.failure("no English sentence after the Japanese one"));
        };
        let translation = translation_match.as_str().trim();
        if !translation.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(self.failure("translation has no English text"));
        }

        finish_segmentation(self, &source, translation)
    }
}
