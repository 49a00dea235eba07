//! Per-language rule sets. Each configuration keeps its delimiter table,
//! selection granularity, segmentation algorithm and noise rules together;
//! callers pick one through `LanguageMode::rules()` and never branch on the
//! mode themselves.

pub mod japanese;
pub mod spanish;

use crate::annotation::selection::Granularity;
use crate::error::SegmentationFailure;
use crate::parsing::noise::{correct_with, NoiseRule};
use crate::parsing::segmenter::SegmentedText;
use crate::types::text_pair::{LanguageMode, TextField};

pub use japanese::JapaneseRules;
pub use spanish::SpanishRules;

pub trait LanguageRules: Send + Sync {
    fn mode(&self) -> LanguageMode;

    fn granularity(&self) -> Granularity;

    /// Sentence-ending marks of the source language.
    fn source_delimiters(&self) -> &'static [char];

    fn noise_rules(&self) -> &'static [NoiseRule];

    fn segment(&self, raw_text: &str) -> Result<SegmentedText, SegmentationFailure>;

    fn correct(&self, text: &str, field: TextField) -> String {
        correct_with(self.noise_rules(), text, field)
    }
}

static SPANISH: SpanishRules = SpanishRules;
static JAPANESE: JapaneseRules = JapaneseRules;

impl LanguageMode {
    pub fn rules(&self) -> &'static dyn LanguageRules {
        match self {
            LanguageMode::Spanish => &SPANISH,
            LanguageMode::Japanese => &JAPANESE,
        }
    }
}

/// Builds a `SegmentedText` from trimmed, corrected fields, failing when
/// either side came out empty.
pub(crate) fn finish_segmentation(
    rules: &dyn LanguageRules,
    source: &str,
    translation: &str,
) -> Result<SegmentedText, SegmentationFailure> {
    let source_text = rules.correct(source.trim(), TextField::Source).trim().to_string();
    let translation_text = rules.correct(translation.trim(), TextField::Translation).trim().to_string();

    if source_text.is_empty() {
        return Err(SegmentationFailure::new(rules.mode(), "source sentence is empty"));
    }
    if translation_text.is_empty() {
        return Err(SegmentationFailure::new(rules.mode(), "translation sentence is empty"));
    }
    Ok(SegmentedText { source_text, translation_text })
}
