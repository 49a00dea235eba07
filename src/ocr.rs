//! Interface to the OCR collaborator.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::OcrFailure;
use crate::types::ocr_data::RawOcrText;
use crate::types::text_pair::LanguageMode;

/// Interface to an OCR engine.
#[async_trait]
pub trait OcrEngine: Send + Sync + 'static {
    /// Recognize the lines on one image.
    async fn recognize(&self, image: &Path, mode: LanguageMode) -> Result<RawOcrText, OcrFailure>;
}

/// Replays OCR output recorded to disk. A `.json` file holds the engine's
/// line list (`[{"text", "confidence", "boundingBox"}]`); any other file is
/// read as plain text, one recognized line per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedOcrEngine;

#[async_trait]
impl OcrEngine for RecordedOcrEngine {
    async fn recognize(&self, image: &Path, mode: LanguageMode) -> Result<RawOcrText, OcrFailure> {
        let failure = |details: String| OcrFailure {
            image: image.display().to_string(),
            details,
        };

        let contents = tokio::fs::read_to_string(image)
            .await
            .map_err(|e| failure(format!("cannot read recorded OCR output: {}", e)))?;

        let is_json = image
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let raw = if is_json {
            serde_json::from_str::<RawOcrText>(&contents)
                .map_err(|e| failure(format!("malformed OCR line list: {}", e)))?
        } else {
            RawOcrText::from_plain_text(&contents)
        };

        if raw.lines.iter().all(|line| line.text.trim().is_empty()) {
            return Err(failure("no text recognized".to_string()));
        }
        debug!(image = %image.display(), mode = %mode, lines = raw.lines.len(), "loaded recorded OCR output");
        Ok(raw)
    }
}
