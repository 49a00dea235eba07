//! The in-memory pair collection for one editing session, and the OCR
//! ingest loop that feeds it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::annotation::selection::{Selection, SelectionSet};
use crate::annotation::serializer::serialize;
use crate::error::{FlashcardError, Result, SegmentationFailure};
use crate::ocr::OcrEngine;
use crate::parsing::segmenter::segment_ocr;
use crate::types::ocr_data::RawOcrText;
use crate::types::text_pair::{LanguageMode, PairId, TextField, TextPair};

#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Segmented(PairId),
    /// Segmentation found no split; an empty pair was stored in its place.
    NeedsManualEdit { id: PairId, failure: SegmentationFailure },
}

impl InsertOutcome {
    pub fn id(&self) -> PairId {
        match self {
            InsertOutcome::Segmented(id) => *id,
            InsertOutcome::NeedsManualEdit { id, .. } => *id,
        }
    }
}

/// Ordered pairs behind one collection-level lock. Segmentation and
/// formatting run outside the lock; only the append or the field update
/// holds it.
#[derive(Debug, Default)]
pub struct PairStore {
    pairs: Mutex<Vec<TextPair>>,
}

impl PairStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: Vec<TextPair>) -> Self {
        PairStore { pairs: Mutex::new(pairs) }
    }

    // Every update completes before the guard drops, so a poisoned lock still
    // holds a consistent collection.
    fn lock(&self) -> MutexGuard<'_, Vec<TextPair>> {
        self.pairs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_pair<T>(&self, id: PairId, update: impl FnOnce(&mut TextPair) -> Result<T>) -> Result<T> {
        let mut pairs = self.lock();
        let pair = pairs
            .iter_mut()
            .find(|pair| pair.id == id)
            .ok_or(FlashcardError::PairNotFound(id))?;
        update(pair)
    }

    /// Segments one image's OCR output and appends the resulting pair.
    pub fn insert_from_ocr(&self, raw: &RawOcrText, mode: LanguageMode) -> InsertOutcome {
        debug!(lines = raw.lines.len(), confidence = ?raw.mean_confidence(), "segmenting OCR result");
        match segment_ocr(raw, mode) {
            Ok(segmented) => {
                let pair = TextPair::new(segmented.source_text, segmented.translation_text, mode);
                InsertOutcome::Segmented(self.insert(pair))
            }
            Err(failure) => {
                warn!(mode = %mode, "{}; stored an empty pair for manual editing", failure);
                let id = self.insert(TextPair::empty(mode));
                InsertOutcome::NeedsManualEdit { id, failure }
            }
        }
    }

    pub fn insert(&self, pair: TextPair) -> PairId {
        let id = pair.id;
        self.lock().push(pair);
        id
    }

    pub fn get(&self, id: PairId) -> Option<TextPair> {
        self.lock().iter().find(|pair| pair.id == id).cloned()
    }

    /// A snapshot of every pair, in insertion order.
    pub fn pairs(&self) -> Vec<TextPair> {
        self.lock().clone()
    }

    /// Replaces one text field with the corrected `text` and drops that
    /// field's selections. The other field is left alone.
    pub fn edit_text(&self, id: PairId, field: TextField, text: &str) -> Result<TextPair> {
        self.with_pair(id, |pair| {
            let corrected_text = pair.language_mode.rules().correct(text.trim(), field);
            pair.replace_text(field, corrected_text);
            info!(pair = %id.short(), field = %field, "text edited; selections cleared");
            Ok(pair.clone())
        })
    }

    /// Adds `target` to the field's selections, or removes it if present.
    /// Returns the field's new selection set.
    pub fn toggle_selection(&self, id: PairId, field: TextField, target: Selection) -> Result<SelectionSet> {
        self.with_pair(id, |pair| {
            let expected = pair.language_mode.rules().granularity();
            if target.granularity() != expected {
                return Err(FlashcardError::SelectionMismatch {
                    mode: pair.language_mode,
                    field,
                    expected: expected.describe(),
                });
            }
            if !targets_text(&target, pair.text(field)) {
                warn!(pair = %id.short(), field = %field, target = %target.text(), "selection does not match the current text");
            }
            let toggled_selections = pair.selections(field).toggled(target);
            pair.set_selections(field, toggled_selections.clone());
            Ok(toggled_selections)
        })
    }

    pub fn delete(&self, id: PairId) -> Result<TextPair> {
        let mut pairs = self.lock();
        let position = pairs
            .iter()
            .position(|pair| pair.id == id)
            .ok_or(FlashcardError::PairNotFound(id))?;
        Ok(pairs.remove(position))
    }

    /// The flashcard document for the current pairs.
    pub fn document(&self) -> String {
        serialize(&self.pairs())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn targets_text(target: &Selection, text: &str) -> bool {
    match target {
        Selection::Word { word, index } => text.split_whitespace().nth(*index) == Some(word.as_str()),
        Selection::Phrase(phrase) => !phrase.is_empty() && text.contains(phrase.as_str()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Pending,
    Segmented(PairId),
    NeedsManualEdit(PairId),
    Failed(String),
}

/// One submitted image and what became of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlot {
    pub image: PathBuf,
    pub status: SlotStatus,
}

/// Runs OCR on every image concurrently. Each completion segments its own
/// result and appends one pair, in whatever order the engine finishes. A
/// failed image gets a `Failed` slot and no pair. Slots come back in
/// submission order.
pub async fn ingest(
    store: Arc<PairStore>,
    engine: Arc<dyn OcrEngine>,
    images: Vec<PathBuf>,
    mode: LanguageMode,
) -> Vec<ImageSlot> {
    let mut slots: Vec<ImageSlot> = images
        .iter()
        .map(|image| ImageSlot { image: image.clone(), status: SlotStatus::Pending })
        .collect();

    let mut ocr_tasks = JoinSet::new();
    for (slot_index, image) in images.into_iter().enumerate() {
        let store = Arc::clone(&store);
        let engine = Arc::clone(&engine);
        ocr_tasks.spawn(async move {
            let status = match engine.recognize(&image, mode).await {
                Ok(raw) => match store.insert_from_ocr(&raw, mode) {
                    InsertOutcome::Segmented(id) => SlotStatus::Segmented(id),
                    InsertOutcome::NeedsManualEdit { id, .. } => SlotStatus::NeedsManualEdit(id),
                },
                Err(failure) => {
                    warn!("{}", failure);
                    SlotStatus::Failed(failure.details)
                }
            };
            (slot_index, status)
        });
    }

    while let Some(joined) = ocr_tasks.join_next().await {
        match joined {
            Ok((slot_index, status)) => slots[slot_index].status = status,
            Err(e) => warn!("OCR task did not finish: {}", e),
        }
    }

    for slot in slots.iter_mut().filter(|slot| slot.status == SlotStatus::Pending) {
        slot.status = SlotStatus::Failed("OCR task did not finish".to_string());
    }
    let failed = slots.iter().filter(|slot| matches!(slot.status, SlotStatus::Failed(_))).count();
    info!(images = slots.len(), failed, "ingest finished");
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrFailure;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;

    fn raw(text: &str) -> RawOcrText {
        RawOcrText::from_plain_text(text)
    }

    /// Serves canned results; `delays` yields the executor that many times
    /// first so completions arrive out of submission order.
    struct CannedEngine {
        results: HashMap<PathBuf, std::result::Result<String, String>>,
        delays: HashMap<PathBuf, usize>,
    }

    #[async_trait]
    impl OcrEngine for CannedEngine {
        async fn recognize(&self, image: &Path, _mode: LanguageMode) -> std::result::Result<RawOcrText, OcrFailure> {
            for _ in 0..self.delays.get(image).copied().unwrap_or(0) {
                tokio::task::yield_now().await;
            }
            match self.results.get(image) {
                Some(Ok(text)) => Ok(raw(text)),
                Some(Err(details)) => Err(OcrFailure { image: image.display().to_string(), details: details.clone() }),
                None => Err(OcrFailure { image: image.display().to_string(), details: "unknown image".into() }),
            }
        }
    }

    #[test]
    fn segmented_ocr_is_appended() {
        let store = PairStore::new();
        let outcome = store.insert_from_ocr(&raw("Yo tengo un gato.\nI have a cat."), LanguageMode::Spanish);
        let pair = store.get(outcome.id()).unwrap();
        assert!(matches!(outcome, InsertOutcome::Segmented(_)));
        assert_eq!(pair.source_text, "Yo tengo un gato.");
        assert_eq!(pair.translation_text, "I have a cat.");
    }

    #[test]
    fn segmentation_failure_stores_an_empty_pair() {
        let store = PairStore::new();
        let outcome = store.insert_from_ocr(&raw("no delimiters here"), LanguageMode::Spanish);
        assert!(matches!(outcome, InsertOutcome::NeedsManualEdit { .. }));
        assert!(store.get(outcome.id()).unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn editing_clears_only_the_edited_field() {
        let store = PairStore::new();
        let id = store.insert(TextPair::new("Yo tengo un gato.".into(), "I have a cat.".into(), LanguageMode::Spanish));
        store.toggle_selection(id, TextField::Source, Selection::word("gato.", 3)).unwrap();
        store.toggle_selection(id, TextField::Translation, Selection::word("cat.", 3)).unwrap();

        let edited = store.edit_text(id, TextField::Translation, "  I m happy ").unwrap();
        assert_eq!(edited.translation_text, "I'm happy");
        assert!(edited.translation_selections.is_empty());
        assert_eq!(edited.source_selections.len(), 1);
    }

    #[test]
    fn toggling_twice_restores_the_set() {
        let store = PairStore::new();
        let id = store.insert(TextPair::new("猫が好きです。".into(), "I like cats.".into(), LanguageMode::Japanese));
        let once = store.toggle_selection(id, TextField::Source, Selection::phrase("猫")).unwrap();
        assert!(once.contains(&Selection::phrase("猫")));
        let twice = store.toggle_selection(id, TextField::Source, Selection::phrase("猫")).unwrap();
        assert!(twice.is_empty());
    }

    #[test]
    fn wrong_granularity_is_rejected() {
        let store = PairStore::new();
        let id = store.insert(TextPair::new("猫です。".into(), "It is a cat.".into(), LanguageMode::Japanese));
        let error = store.toggle_selection(id, TextField::Source, Selection::word("猫です。", 0)).unwrap_err();
        assert!(matches!(error, FlashcardError::SelectionMismatch { mode: LanguageMode::Japanese, .. }));
        assert!(store.get(id).unwrap().source_selections.is_empty());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let store = PairStore::new();
        let missing = PairId::new();
        assert!(matches!(store.delete(missing), Err(FlashcardError::PairNotFound(id)) if id == missing));
        assert!(store.edit_text(missing, TextField::Source, "x").is_err());
    }

    #[test]
    fn delete_keeps_order_of_the_rest() {
        let store = PairStore::new();
        let first = store.insert(TextPair::new("A".into(), "B".into(), LanguageMode::Spanish));
        let second = store.insert(TextPair::new("C".into(), "D".into(), LanguageMode::Spanish));
        let third = store.insert(TextPair::new("E".into(), "F".into(), LanguageMode::Spanish));
        store.delete(second).unwrap();
        let ids: Vec<PairId> = store.pairs().iter().map(|pair| pair.id).collect();
        assert_eq!(ids, vec![first, third]);
        assert_eq!(store.document(), "# A\nB\n-----\n# E\nF");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn ingest_isolates_failures_and_keeps_slot_order() {
        let images: Vec<PathBuf> = ["a.png", "b.png", "c.png", "d.png"].iter().map(PathBuf::from).collect();
        let engine = CannedEngine {
            results: HashMap::from([
                (images[0].clone(), Ok("Hola. Hello.".to_string())),
                (images[1].clone(), Err("blurry".to_string())),
                (images[2].clone(), Ok("sin puntos".to_string())),
                (images[3].clone(), Ok("Adiós. Goodbye.".to_string())),
            ]),
            delays: HashMap::from([(images[0].clone(), 50), (images[3].clone(), 0)]),
        };
        let store = Arc::new(PairStore::new());

        let slots = ingest(Arc::clone(&store), Arc::new(engine), images.clone(), LanguageMode::Spanish).await;

        assert_eq!(slots.iter().map(|slot| slot.image.clone()).collect::<Vec<_>>(), images);
        assert!(matches!(slots[0].status, SlotStatus::Segmented(_)));
        assert_eq!(slots[1].status, SlotStatus::Failed("blurry".to_string()));
        assert!(matches!(slots[2].status, SlotStatus::NeedsManualEdit(_)));
        assert!(matches!(slots[3].status, SlotStatus::Segmented(_)));

        // One pair per successful OCR call, none for the failed image.
        assert_eq!(store.len(), 3);
        for slot in &slots {
            match &slot.status {
                SlotStatus::Segmented(id) | SlotStatus::NeedsManualEdit(id) => assert!(store.get(*id).is_some()),
                SlotStatus::Failed(_) => {}
                SlotStatus::Pending => panic!("slot left pending"),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_concurrent_completions_each_append_once() {
        let images: Vec<PathBuf> = (0..32).map(|i| PathBuf::from(format!("{}.png", i))).collect();
        let engine = CannedEngine {
            results: images
                .iter()
                .enumerate()
                .map(|(i, image)| (image.clone(), Ok(format!("Frase {}. Sentence {}.", i, i))))
                .collect(),
            delays: images.iter().enumerate().map(|(i, image)| (image.clone(), 32 - i)).collect(),
        };
        let store = Arc::new(PairStore::new());
        let existing = store.insert(TextPair::new("Ya. Already.".into(), "Already.".into(), LanguageMode::Spanish));

        let ingest_task = tokio::spawn(ingest(Arc::clone(&store), Arc::new(engine), images, LanguageMode::Spanish));
        store.edit_text(existing, TextField::Source, "Ya está.").unwrap();
        let slots = ingest_task.await.unwrap();

        assert!(slots.iter().all(|slot| matches!(slot.status, SlotStatus::Segmented(_))));
        assert_eq!(store.len(), 33);
        assert_eq!(store.get(existing).unwrap().source_text, "Ya está.");

        let mut sources: Vec<String> = store.pairs().into_iter().skip(1).map(|pair| pair.source_text).collect();
        sources.sort();
        sources.dedup();
        assert_eq!(sources.len(), 32);
    }
}
