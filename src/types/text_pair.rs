use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::annotation::selection::SelectionSet;

/// Which of the two supported source-language configurations a pair uses.
/// Fixed when the pair is created.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageMode {
    /// Space-delimited source; selections are (word, index) pairs.
    #[default]
    #[serde(rename = "spa", alias = "spanish")]
    Spanish,
    /// Non-space-delimited source; selections are literal substrings.
    #[serde(rename = "jpn", alias = "japanese")]
    Japanese,
}

impl LanguageMode {
    pub fn code(&self) -> &'static str {
        match self {
            LanguageMode::Spanish => "spa",
            LanguageMode::Japanese => "jpn",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "spa" | "es" | "spanish" => Some(LanguageMode::Spanish),
            "jpn" | "ja" | "japanese" => Some(LanguageMode::Japanese),
            _ => None,
        }
    }
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The two text fields of a pair.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    Source,
    Translation,
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextField::Source => f.write_str("source"),
            TextField::Translation => f.write_str("translation"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PairId(pub Uuid);

impl PairId {
    pub fn new() -> Self {
        PairId(Uuid::new_v4())
    }

    /// Last four hex digits, the short label shown next to a pair.
    pub fn short(&self) -> String {
        let simple = self.0.simple().to_string();
        simple[simple.len() - 4..].to_string()
    }
}

impl Default for PairId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PairId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(PairId)
    }
}

/// One source sentence and its translation. The text fields are always plain;
/// selections live beside them and are only meaningful for the exact text they
/// were taken from.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextPair {
    pub id: PairId,
    pub source_text: String,
    pub translation_text: String,
    #[serde(default)]
    pub source_selections: SelectionSet,
    #[serde(default)]
    pub translation_selections: SelectionSet,
    pub language_mode: LanguageMode,
}

impl TextPair {
    pub fn new(source_text: String, translation_text: String, language_mode: LanguageMode) -> Self {
        TextPair {
            id: PairId::new(),
            source_text,
            translation_text,
            source_selections: SelectionSet::new(),
            translation_selections: SelectionSet::new(),
            language_mode,
        }
    }

    /// The placeholder pair created when segmentation could not find a split.
    pub fn empty(language_mode: LanguageMode) -> Self {
        Self::new(String::new(), String::new(), language_mode)
    }

    pub fn is_empty(&self) -> bool {
        self.source_text.trim().is_empty() && self.translation_text.trim().is_empty()
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::Source => &self.source_text,
            TextField::Translation => &self.translation_text,
        }
    }

    pub fn selections(&self, field: TextField) -> &SelectionSet {
        match field {
            TextField::Source => &self.source_selections,
            TextField::Translation => &self.translation_selections,
        }
    }

    pub fn set_selections(&mut self, field: TextField, selections: SelectionSet) {
        match field {
            TextField::Source => self.source_selections = selections,
            TextField::Translation => self.translation_selections = selections,
        }
    }

    /// Replaces a text field. Any selection on that field is dropped since its
    /// token positions no longer refer to anything.
    pub fn replace_text(&mut self, field: TextField, text: String) {
        match field {
            TextField::Source => self.source_text = text,
            TextField::Translation => self.translation_text = text,
        }
        self.set_selections(field, SelectionSet::new());
    }
}
