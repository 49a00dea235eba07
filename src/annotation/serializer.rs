//! The flashcard document: one `# source` / `translation` block per pair,
//! blocks separated by a `-----` line. Flashcard importers read exactly this
//! layout, so it must not drift.

use regex::Regex;
use std::sync::OnceLock;

use super::formatter::format_field;
use crate::types::text_pair::{TextField, TextPair};

pub const SEPARATOR: &str = "-----";
pub const SOURCE_PREFIX: &str = "# ";

/// One block of a flashcard document, with its markup intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardBlock {
    pub source: String,
    pub translation: String,
}

pub fn format_block(pair: &TextPair) -> String {
    format!(
        "{}{}\n{}",
        SOURCE_PREFIX,
        format_field(pair, TextField::Source),
        format_field(pair, TextField::Translation)
    )
}

pub fn serialize(pairs: &[TextPair]) -> String {
    pairs
        .iter()
        .map(format_block)
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", SEPARATOR))
}

/// Reads a document back into blocks. Lines before a block's `# ` line are
/// ignored; everything after it up to the next separator is translation.
pub fn parse_document(document: &str) -> Vec<FlashcardBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in document.lines() {
        if line.trim_end() == SEPARATOR {
            if let Some((source, translation_lines)) = current.take() {
                blocks.push(FlashcardBlock { source, translation: translation_lines.join("\n") });
            }
            continue;
        }
        match current.as_mut() {
            Some((_, translation_lines)) => translation_lines.push(line),
            None => {
                if let Some(source) = line.strip_prefix(SOURCE_PREFIX) {
                    current = Some((source.to_string(), Vec::new()));
                } else if line.trim() == "#" {
                    current = Some((String::new(), Vec::new()));
                }
            }
        }
    }
    if let Some((source, translation_lines)) = current {
        blocks.push(FlashcardBlock { source, translation: translation_lines.join("\n") });
    }
    blocks
}

/// Removes cloze and bold markers, leaving the marked text in place.
pub fn strip_markup(text: &str) -> String {
    static CLOZE: OnceLock<Regex> = OnceLock::new();
    static BOLD: OnceLock<Regex> = OnceLock::new();
    let cloze = CLOZE.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").unwrap_or_else(|e| panic!("invalid cloze pattern: {}", e)));
    let bold = BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").unwrap_or_else(|e| panic!("invalid bold pattern: {}", e)));
    let without_cloze = cloze.replace_all(text, "${1}");
    bold.replace_all(&without_cloze, "${1}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::selection::{Selection, SelectionSet};
    use crate::types::text_pair::LanguageMode;

    fn plain_pair(source: &str, translation: &str) -> TextPair {
        TextPair::new(source.to_string(), translation.to_string(), LanguageMode::Spanish)
    }

    #[test]
    fn empty_input_is_empty_document() {
        assert_eq!(serialize(&[]), "");
    }

    #[test]
    fn blocks_are_joined_by_separator_lines() {
        let document = serialize(&[plain_pair("A", "B"), plain_pair("C", "D")]);
        assert_eq!(document, "# A\nB\n-----\n# C\nD");
    }

    #[test]
    fn separator_count_is_one_less_than_pairs() {
        for count in 0..5usize {
            let pairs: Vec<TextPair> = (0..count).map(|i| plain_pair(&format!("S{}.", i), &format!("T{}.", i))).collect();
            let document = serialize(&pairs);
            let separators = document.lines().filter(|line| *line == SEPARATOR).count();
            assert_eq!(separators, count.saturating_sub(1));
            assert!(!document.ends_with(SEPARATOR));
        }
    }

    #[test]
    fn source_is_cloze_and_translation_is_bold() {
        let mut pair = plain_pair("Yo tengo un gato.", "I have a cat.");
        pair.source_selections = SelectionSet::new().toggled(Selection::word("gato.", 3));
        pair.translation_selections = SelectionSet::new().toggled(Selection::word("cat.", 3));
        assert_eq!(serialize(&[pair]), "# Yo tengo un {{gato.}}\nI have a **cat.**");
    }

    #[test]
    fn parses_a_serialized_document_back_into_blocks() {
        let mut first = plain_pair("Yo tengo un gato.", "I have a cat.");
        first.source_selections = SelectionSet::new().toggled(Selection::word("gato.", 3));
        let document = serialize(&[first, plain_pair("Hola.", "Hello.")]);

        let blocks = parse_document(&document);
        assert_eq!(
            blocks,
            vec![
                FlashcardBlock { source: "Yo tengo un {{gato.}}".into(), translation: "I have a cat.".into() },
                FlashcardBlock { source: "Hola.".into(), translation: "Hello.".into() },
            ]
        );
        assert_eq!(strip_markup(&blocks[0].source), "Yo tengo un gato.");
    }

    #[test]
    fn strips_both_markups() {
        assert_eq!(strip_markup("I **love** {{my}} cat"), "I love my cat");
    }
}
