use serde::{Deserialize, Serialize};

/// One recognized line as handed over by the OCR engine. Confidence and the
/// bounding box are carried for display only; segmentation never reads them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcrLine {
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<Vec<f32>>,
}

impl OcrLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        OcrLine {
            text: text.into(),
            confidence: Some(confidence.clamp(0.0, 1.0)),
            bounding_box: None,
        }
    }
}

/// Everything the OCR engine recognized on one image, in reading order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct RawOcrText {
    pub lines: Vec<OcrLine>,
}

impl RawOcrText {
    pub fn new(lines: Vec<OcrLine>) -> Self {
        RawOcrText { lines }
    }

    /// Builds a result from plain text, one line per OCR line, full confidence.
    pub fn from_plain_text(text: &str) -> Self {
        RawOcrText {
            lines: text.lines().map(|line| OcrLine::new(line, 1.0)).collect(),
        }
    }

    /// The newline-joined text the segmenter consumes.
    pub fn joined_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn mean_confidence(&self) -> Option<f32> {
        let scores: Vec<f32> = self.lines.iter().filter_map(|line| line.confidence).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f32>() / scores.len() as f32)
        }
    }
}

impl From<&str> for RawOcrText {
    fn from(text: &str) -> Self {
        RawOcrText::from_plain_text(text)
    }
}
