use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FlashcardError, Result};
use crate::types::text_pair::LanguageMode;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml`. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Language of newly created pairs.
    pub language: LanguageMode,
    /// Where `export` writes the flashcard document.
    pub output_path: PathBuf,
    /// JSON file holding the pairs between invocations.
    pub session_path: PathBuf,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            language: LanguageMode::default(),
            output_path: PathBuf::from("flashcards.md"),
            session_path: PathBuf::from("session.json"),
            verbose: false,
        }
    }
}

pub fn load_config_from_file(file_path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(file_path).map_err(|e| {
        FlashcardError::Config(format!(
            "Failed to read {}: {}. Please ensure it exists.",
            file_path.display(),
            e
        ))
    })?;
    let loaded_config = toml::from_str::<Config>(&contents)
        .map_err(|e| FlashcardError::Config(format!("Failed to parse {}: {}", file_path.display(), e)))?;

    if loaded_config.output_path.as_os_str().is_empty() {
        return Err(FlashcardError::Config(format!(
            "output_path specified in {} is empty.",
            file_path.display()
        )));
    }
    if loaded_config.session_path.as_os_str().is_empty() {
        return Err(FlashcardError::Config(format!(
            "session_path specified in {} is empty.",
            file_path.display()
        )));
    }
    Ok(loaded_config)
}

/// Loads `file_path` when it exists; a missing file means defaults.
pub fn load_or_default(file_path: &Path) -> Result<Config> {
    if file_path.exists() {
        load_config_from_file(file_path)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_or_default(&temp_dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&config_path, "language = \"jpn\"\noutput_path = \"cards/japanese.md\"\n").unwrap();

        let config = load_config_from_file(&config_path).unwrap();
        assert_eq!(config.language, LanguageMode::Japanese);
        assert_eq!(config.output_path, PathBuf::from("cards/japanese.md"));
        assert_eq!(config.session_path, PathBuf::from("session.json"));
        assert!(!config.verbose);
    }

    #[test]
    fn bad_files_are_config_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);

        for contents in ["language = \"fra\"", "output_path = \"\"", "colour = true"] {
            fs::write(&config_path, contents).unwrap();
            let error = load_config_from_file(&config_path).unwrap_err();
            assert!(matches!(error, FlashcardError::Config(_)), "{} gave {:?}", contents, error);
        }
    }
}
