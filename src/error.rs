use crate::types::text_pair::{LanguageMode, PairId, TextField};

/// The delimiter heuristics found no usable split. The caller is expected to
/// fall back to an empty pair and ask for a manual edit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot segment {mode} text: {reason}")]
pub struct SegmentationFailure {
    pub mode: LanguageMode,
    pub reason: String,
    pub delimiter_count: Option<usize>,
}

impl SegmentationFailure {
    pub fn new(mode: LanguageMode, reason: impl Into<String>) -> Self {
        SegmentationFailure {
            mode,
            reason: reason.into(),
            delimiter_count: None,
        }
    }

    pub fn with_delimiter_count(mut self, count: usize) -> Self {
        self.delimiter_count = Some(count);
        self
    }
}

/// The OCR collaborator produced nothing usable for one image.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("OCR failed for {image}: {details}")]
pub struct OcrFailure {
    pub image: String,
    pub details: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FlashcardError {
    #[error(transparent)]
    Segmentation(#[from] SegmentationFailure),

    #[error(transparent)]
    Ocr(#[from] OcrFailure),

    #[error("no text pair with id {0}")]
    PairNotFound(PairId),

    #[error("{mode} pairs take {expected} selections on the {field} field")]
    SelectionMismatch {
        mode: LanguageMode,
        field: TextField,
        expected: &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, FlashcardError>;
