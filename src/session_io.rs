use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::types::text_pair::{LanguageMode, TextPair};

/// The pairs of one editing session, written to JSON between CLI runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub language: LanguageMode,
    #[serde(default)]
    pub pairs: Vec<TextPair>,
}

impl SessionSnapshot {
    pub fn new(language: LanguageMode) -> Self {
        SessionSnapshot { language, pairs: Vec::new() }
    }
}

pub fn save_session_snapshot(snapshot: &SessionSnapshot, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(file_path)?);
    serde_json::to_writer_pretty(writer, snapshot)?;
    debug!(path = %file_path.display(), pairs = snapshot.pairs.len(), "session saved");
    Ok(())
}

pub fn load_session_snapshot(file_path: &Path) -> Result<SessionSnapshot> {
    let reader = BufReader::new(File::open(file_path)?);
    let snapshot: SessionSnapshot = serde_json::from_reader(reader)?;
    debug!(path = %file_path.display(), pairs = snapshot.pairs.len(), "session loaded");
    Ok(snapshot)
}

/// Loads the session at `file_path`, or starts an empty one in `language`
/// when no file exists yet.
pub fn load_or_new(file_path: &Path, language: LanguageMode) -> Result<SessionSnapshot> {
    if file_path.exists() {
        load_session_snapshot(file_path)
    } else {
        Ok(SessionSnapshot::new(language))
    }
}

/// Writes a flashcard document, always with a `.md` extension. Returns the
/// path actually written.
pub fn write_document(file_path: &Path, document: &str) -> Result<PathBuf> {
    let markdown_path = file_path.with_extension("md");
    if let Some(parent) = markdown_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(&markdown_path)?);
    writer.write_all(document.as_bytes())?;
    writer.flush()?;
    Ok(markdown_path)
}
