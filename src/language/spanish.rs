use std::sync::OnceLock;
use tracing::debug;

use super::{finish_segmentation, LanguageRules};
use crate::annotation::selection::Granularity;
use crate::error::SegmentationFailure;
use crate::parsing::noise::{english_translation_rules, NoiseRule};
use crate::parsing::segmenter::{collapse_whitespace, delimiter_positions, SegmentedText};
use crate::types::text_pair::LanguageMode;

pub const SPANISH_DELIMITERS: &[char] = &['.', '!', '?'];

/// Spanish source, English translation. Words are space-delimited, so the
/// user picks whole tokens and selections are (word, index) pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanishRules;

impl SpanishRules {
    fn failure(&self, reason: &str, delimiter_count: usize) -> SegmentationFailure {
        SegmentationFailure::new(LanguageMode::Spanish, reason).with_delimiter_count(delimiter_count)
    }
}

impl LanguageRules for SpanishRules {
    fn mode(&self) -> LanguageMode {
        LanguageMode::Spanish
    }

    fn granularity(&self) -> Granularity {
        Granularity::WordIndex
    }

    fn source_delimiters(&self) -> &'static [char] {
        SPANISH_DELIMITERS
    }

    fn noise_rules(&self) -> &'static [NoiseRule] {
        static RULES: OnceLock<Vec<NoiseRule>> = OnceLock::new();
        RULES.get_or_init(english_translation_rules)
    }

    /// Delimiter tiers:
    /// - 0 or 1 delimiters: no split.
    /// - 2 or 3: the 1st delimiter ends the source, pushed forward to the next
    ///   whitespace so "3.5" or "Sr.García" is not cut; the 2nd ends the
    ///   translation; a 3rd is stray noise.
    /// - 4 or more: the 2nd delimiter is the boundary and the 4th ends the
    ///   translation (screens often duplicate a caption or helper word).
    fn segment(&self, raw_text: &str) -> Result<SegmentedText, SegmentationFailure> {
        let normalized_text = collapse_whitespace(raw_text);
        let delimiters = delimiter_positions(&normalized_text, self.source_delimiters());
        debug!(delimiters = delimiters.len(), text = %normalized_text, "spanish delimiter scan");

        // All delimiters are ASCII, so `pos + 1` is the next char boundary.
        match delimiters.len() {
            0 => Err(self.failure("no sentence delimiters found", 0)),
            1 => Err(self.failure("only one sentence delimiter found", 1)),
            2 | 3 => {
                let first_delimiter = delimiters[0];
                let second_delimiter = delimiters[1];
                let after_first = first_delimiter + 1;
                let source_end = normalized_text[after_first..]
                    .find(char::is_whitespace)
                    .map(|offset| after_first + offset)
                    .ok_or_else(|| self.failure("no whitespace after the first delimiter", delimiters.len()))?;
                if source_end > second_delimiter {
                    return Err(self.failure("source sentence runs past the second delimiter", delimiters.len()));
                }
                let source = &normalized_text[..source_end];
                let translation = &normalized_text[source_end..=second_delimiter];
                finish_segmentation(self, source, translation)
                    .map_err(|failure| failure.with_delimiter_count(delimiters.len()))
            }
            count => {
                let boundary = delimiters[1];
                let translation_end = delimiters[3];
                let source = &normalized_text[..=boundary];
                let translation = &normalized_text[boundary + 1..=translation_end];
                finish_segmentation(self, source, translation).map_err(|failure| failure.with_delimiter_count(count))
            }
        }
    }
}
