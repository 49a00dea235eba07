use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a language identifies a marked span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// A whitespace token at a given position. Repeated words stay distinct.
    WordIndex,
    /// A literal phrase, matched by content wherever it occurs.
    Substring,
}

impl Granularity {
    pub fn describe(&self) -> &'static str {
        match self {
            Granularity::WordIndex => "word-index",
            Granularity::Substring => "substring",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(untagged)]
pub enum Selection {
    Word { word: String, index: usize },
    Phrase(String),
}

impl Selection {
    pub fn word(word: impl Into<String>, index: usize) -> Self {
        Selection::Word { word: word.into(), index }
    }

    pub fn phrase(phrase: impl Into<String>) -> Self {
        Selection::Phrase(phrase.into())
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Selection::Word { .. } => Granularity::WordIndex,
            Selection::Phrase(_) => Granularity::Substring,
        }
    }

    /// The marked text itself.
    pub fn text(&self) -> &str {
        match self {
            Selection::Word { word, .. } => word,
            Selection::Phrase(phrase) => phrase,
        }
    }
}

/// The marked spans of one text field. Every operation hands back a new set.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<Selection>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symmetric difference with a single target.
    pub fn toggled(&self, target: Selection) -> SelectionSet {
        let mut next = self.0.clone();
        if !next.remove(&target) {
            next.insert(target);
        }
        SelectionSet(next)
    }

    pub fn contains(&self, target: &Selection) -> bool {
        self.0.contains(target)
    }

    pub fn contains_word(&self, word: &str, index: usize) -> bool {
        // BTreeSet lookups need an owned key; the sets are tiny, so scan.
        self.0.iter().any(|selection| match selection {
            Selection::Word { word: w, index: i } => *i == index && w == word,
            Selection::Phrase(_) => false,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.0.iter()
    }
}

impl FromIterator<Selection> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = Selection>>(iter: I) -> Self {
        SelectionSet(iter.into_iter().collect())
    }
}

pub fn toggle(selections: &SelectionSet, target: Selection) -> SelectionSet {
    selections.toggled(target)
}

/// Every (word, index) target a word-index text offers, in order.
pub fn word_targets(text: &str) -> Vec<Selection> {
    text.split_whitespace()
        .enumerate()
        .map(|(index, word)| Selection::word(word, index))
        .collect()
}
