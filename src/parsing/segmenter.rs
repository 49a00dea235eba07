use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info};

use crate::error::SegmentationFailure;
use crate::types::ocr_data::RawOcrText;
use crate::types::text_pair::LanguageMode;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedText {
    pub source_text: String,
    pub translation_text: String,
}

/// Splits newline-joined OCR text into its source sentence and translation.
pub fn segment(raw_text: &str, mode: LanguageMode) -> Result<SegmentedText, SegmentationFailure> {
    let result = mode.rules().segment(raw_text);
    match &result {
        Ok(segmented) => info!(
            mode = %mode,
            source = %segmented.source_text,
            translation = %segmented.translation_text,
            "segmented OCR text"
        ),
        Err(failure) => debug!(mode = %mode, reason = %failure.reason, "segmentation failed"),
    }
    result
}

pub fn segment_ocr(raw: &RawOcrText, mode: LanguageMode) -> Result<SegmentedText, SegmentationFailure> {
    segment(&raw.joined_text(), mode)
}

/// Newlines and whitespace runs become a single space; ends are trimmed.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn remove_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Byte offsets of every delimiter character, in order.
pub fn delimiter_positions(text: &str, delimiters: &[char]) -> Vec<usize> {
    text.char_indices()
        .filter(|(_, c)| delimiters.contains(c))
        .map(|(pos, _)| pos)
        .collect()
}

pub fn strip_chars<'a>(text: &'a str, unwanted: &[char]) -> Cow<'a, str> {
    if text.contains(unwanted) {
        Cow::Owned(text.chars().filter(|c| !unwanted.contains(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Drops a leading caption: the first non-blank line, when a blank line
/// follows it and more content comes after. Screens put UI labels there.
pub fn strip_caption_line(text: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = text.lines().collect();
    let Some(first_content) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return Cow::Borrowed(text);
    };
    let followed_by_blank = lines
        .get(first_content + 1)
        .map_or(false, |line| line.trim().is_empty());
    let has_more_content = lines
        .iter()
        .skip(first_content + 2)
        .any(|line| !line.trim().is_empty());

    if followed_by_blank && has_more_content {
        debug!(caption = lines[first_content].trim(), "dropping caption line");
        Cow::Owned(lines[first_content + 2..].join("\n"))
    } else {
        Cow::Borrowed(text)
    }
}
