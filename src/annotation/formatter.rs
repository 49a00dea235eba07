use regex::Regex;
use tracing::{debug, warn};

use super::selection::{Granularity, Selection, SelectionSet};
use crate::types::text_pair::{LanguageMode, TextField, TextPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupStyle {
    /// `{{word}}`, hidden on review. Used for the source sentence.
    Cloze,
    /// `**word**`. Used for the translation.
    Bold,
}

impl MarkupStyle {
    pub fn for_field(field: TextField) -> Self {
        match field {
            TextField::Source => MarkupStyle::Cloze,
            TextField::Translation => MarkupStyle::Bold,
        }
    }

    /// The field whose correction rules apply to text rendered in this style.
    pub fn field(&self) -> TextField {
        match self {
            MarkupStyle::Cloze => TextField::Source,
            MarkupStyle::Bold => TextField::Translation,
        }
    }

    pub fn wrap(&self, text: &str) -> String {
        match self {
            MarkupStyle::Cloze => format!("{{{{{}}}}}", text),
            MarkupStyle::Bold => format!("**{}**", text),
        }
    }
}

/// Renders `text` with every selected target wrapped once.
///
/// Noise corrections run first, then the language's selection granularity
/// decides how targets are located. Selections that no longer match the text
/// are skipped; the rest of the text still renders.
pub fn format(text: &str, selections: &SelectionSet, mode: LanguageMode, style: MarkupStyle) -> String {
    let rules = mode.rules();
    let corrected_text = rules.correct(text, style.field());
    if selections.is_empty() {
        return corrected_text;
    }
    match rules.granularity() {
        Granularity::WordIndex => wrap_word_tokens(&corrected_text, selections, style),
        Granularity::Substring => wrap_phrases(&corrected_text, selections, style),
    }
}

/// Formats one field of a pair in that field's style.
pub fn format_field(pair: &TextPair, field: TextField) -> String {
    format(
        pair.text(field),
        pair.selections(field),
        pair.language_mode,
        MarkupStyle::for_field(field),
    )
}

/// Re-tokenizes on whitespace and wraps tokens whose (word, index) is
/// selected. Tokens are rejoined with single spaces.
fn wrap_word_tokens(text: &str, selections: &SelectionSet, style: MarkupStyle) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    for selection in selections.iter() {
        match selection {
            Selection::Word { word, index } if tokens.get(*index) != Some(&word.as_str()) => {
                debug!(word = %word, index, "skipping stale word selection");
            }
            Selection::Phrase(phrase) => {
                debug!(phrase = %phrase, "skipping phrase selection on word-index text");
            }
            Selection::Word { .. } => {}
        }
    }

    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            if selections.contains_word(token, index) {
                style.wrap(token)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

enum Piece {
    Plain(String),
    Marked(String),
}

/// Wraps every literal occurrence of each selected phrase. Longer phrases go
/// first and wrapped regions are never searched again, so a shorter phrase
/// cannot break up a longer one that contains it.
fn wrap_phrases(text: &str, selections: &SelectionSet, style: MarkupStyle) -> String {
    let mut phrases: Vec<&str> = selections
        .iter()
        .filter_map(|selection| match selection {
            Selection::Phrase(phrase) if !phrase.is_empty() => Some(phrase.as_str()),
            Selection::Phrase(_) => None,
            Selection::Word { word, index } => {
                debug!(word = %word, index, "skipping word selection on substring text");
                None
            }
        })
        .collect();
    phrases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));

    let mut pieces = vec![Piece::Plain(text.to_string())];
    for phrase in phrases {
        let pattern = match Regex::new(&regex::escape(phrase)) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!(phrase = %phrase, "cannot build a literal pattern: {}", e);
                continue;
            }
        };

        let mut matched_any = false;
        let mut next_pieces = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let plain = match piece {
                Piece::Plain(plain) => plain,
                marked => {
                    next_pieces.push(marked);
                    continue;
                }
            };
            let mut last_end = 0;
            for found in pattern.find_iter(&plain) {
                matched_any = true;
                if found.start() > last_end {
                    next_pieces.push(Piece::Plain(plain[last_end..found.start()].to_string()));
                }
                next_pieces.push(Piece::Marked(found.as_str().to_string()));
                last_end = found.end();
            }
            if last_end < plain.len() {
                next_pieces.push(Piece::Plain(plain[last_end..].to_string()));
            }
        }
        pieces = next_pieces;

        if !matched_any {
            debug!(phrase = %phrase, "skipping stale phrase selection");
        }
    }

    pieces
        .iter()
        .map(|piece| match piece {
            Piece::Plain(plain) => plain.clone(),
            Piece::Marked(marked) => style.wrap(marked),
        })
        .collect()
}
