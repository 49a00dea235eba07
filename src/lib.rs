pub mod config;
pub mod error;
pub mod logging;
pub mod types {
    pub mod ocr_data;
    pub mod text_pair;
}
pub mod parsing {
    pub mod noise;
    pub mod segmenter;
}
pub mod annotation {
    pub mod formatter;
    pub mod selection;
    pub mod serializer;
}
pub mod language;
pub mod ocr;
pub mod pair_store;
pub mod session_io;

pub use annotation::formatter::{format, MarkupStyle};
pub use annotation::selection::{toggle, Selection, SelectionSet};
pub use annotation::serializer::serialize;
pub use error::{FlashcardError, OcrFailure, Result, SegmentationFailure};
pub use pair_store::{ingest, ImageSlot, InsertOutcome, PairStore, SlotStatus};
pub use parsing::noise::correct;
pub use parsing::segmenter::segment;
pub use types::ocr_data::{OcrLine, RawOcrText};
pub use types::text_pair::{LanguageMode, PairId, TextField, TextPair};
