use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use ocr_flashcards::annotation::formatter::format_field;
use ocr_flashcards::annotation::selection::Selection;
use ocr_flashcards::config::{self, Config, DEFAULT_CONFIG_FILE};
use ocr_flashcards::ocr::RecordedOcrEngine;
use ocr_flashcards::pair_store::{ingest, InsertOutcome, PairStore, SlotStatus};
use ocr_flashcards::parsing::segmenter::segment;
use ocr_flashcards::session_io::{load_or_new, save_session_snapshot, write_document, SessionSnapshot};
use ocr_flashcards::types::ocr_data::RawOcrText;
use ocr_flashcards::types::text_pair::{LanguageMode, PairId, TextField};

#[derive(Parser, Debug)]
#[command(
    name = "ocr-flashcards",
    version,
    about = "Turn OCR'd sentence/translation screenshots into cloze flashcards"
)]
struct Cli {
    /// Settings file (default: config.toml, optional)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Source language for new pairs: spa or jpn
    #[arg(short = 'l', long = "lang", value_parser = parse_language)]
    lang: Option<LanguageMode>,

    /// Session file holding the pairs between runs
    #[arg(short = 's', long = "session")]
    session: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split raw OCR text (file or stdin) into source and translation
    Segment {
        file: Option<PathBuf>,
        /// Also add the result to the session
        #[arg(long = "add")]
        add: bool,
    },
    /// OCR every image concurrently and add one pair per image
    Ingest {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Toggle a selection on one field of a pair
    Select {
        pair: String,
        #[arg(short = 'f', long = "field", value_parser = parse_field, default_value = "source")]
        field: TextField,
        /// Token position (word-index languages)
        #[arg(short = 'i', long = "index", conflicts_with = "phrase")]
        index: Option<usize>,
        /// Token text; read from the pair when omitted
        #[arg(short = 'w', long = "word", requires = "index")]
        word: Option<String>,
        /// Literal phrase (substring languages)
        #[arg(short = 'p', long = "phrase")]
        phrase: Option<String>,
    },
    /// Replace a field's text; its selections are cleared
    Edit {
        pair: String,
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        field: TextField,
        text: String,
    },
    /// Remove a pair from the session
    Delete { pair: String },
    /// List pairs with their annotated fields
    Show,
    /// Write the flashcard document
    Export {
        /// Output file (.md is enforced)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long = "stdout")]
        stdout: bool,
    },
}

fn parse_language(value: &str) -> std::result::Result<LanguageMode, String> {
    LanguageMode::from_code(value).ok_or_else(|| format!("unsupported language '{}' (use spa or jpn)", value))
}

fn parse_field(value: &str) -> std::result::Result<TextField, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "source" | "src" | "s" => Ok(TextField::Source),
        "translation" | "tr" | "t" => Ok(TextField::Translation),
        other => Err(format!("unknown field '{}' (use source or translation)", other)),
    }
}

/// Accepts a full id or a unique suffix of one (the short label `show` prints).
fn resolve_pair(store: &PairStore, label: &str) -> Result<PairId> {
    let label = label.trim().to_ascii_lowercase();
    if let Ok(id) = label.parse::<PairId>() {
        return Ok(id);
    }
    let matching: Vec<PairId> = store
        .pairs()
        .iter()
        .map(|pair| pair.id)
        .filter(|id| id.0.simple().to_string().ends_with(&label))
        .collect();
    match matching.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no pair matches '{}'", label),
        _ => bail!("'{}' matches {} pairs; use more characters", label, matching.len()),
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn print_pairs(store: &PairStore) {
    if store.is_empty() {
        println!("(no pairs)");
        return;
    }
    for pair in store.pairs() {
        let marker = if pair.is_empty() { "  [needs edit]" } else { "" };
        println!("[{}] {}{}", pair.id.short(), pair.language_mode, marker);
        println!("  # {}", format_field(&pair, TextField::Source));
        println!("    {}", format_field(&pair, TextField::Translation));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let settings: Config = if cli.config.is_some() {
        config::load_config_from_file(&config_path)?
    } else {
        config::load_or_default(&config_path)?
    };
    ocr_flashcards::logging::init(cli.verbose || settings.verbose);

    let session_path = cli.session.clone().unwrap_or_else(|| settings.session_path.clone());
    let snapshot = load_or_new(&session_path, settings.language)
        .with_context(|| format!("failed to load session {}", session_path.display()))?;
    let language = cli.lang.unwrap_or(snapshot.language);
    let store = Arc::new(PairStore::from_pairs(snapshot.pairs));

    let session_changed = match cli.command {
        Command::Segment { file, add } => {
            let raw_text = read_input(file.as_ref())?;
            if add {
                match store.insert_from_ocr(&RawOcrText::from_plain_text(&raw_text), language) {
                    InsertOutcome::Segmented(id) => println!("added [{}]", id.short()),
                    InsertOutcome::NeedsManualEdit { id, failure } => {
                        println!("{}; edit [{}] by hand", failure, id.short())
                    }
                }
            } else {
                let segmented = segment(&raw_text, language)?;
                println!("source:      {}", segmented.source_text);
                println!("translation: {}", segmented.translation_text);
            }
            add
        }
        Command::Ingest { images } => {
            let slots = ingest(Arc::clone(&store), Arc::new(RecordedOcrEngine), images, language).await;
            for slot in &slots {
                match &slot.status {
                    SlotStatus::Segmented(id) => println!("{}: added [{}]", slot.image.display(), id.short()),
                    SlotStatus::NeedsManualEdit(id) => {
                        println!("{}: no split found, edit [{}] by hand", slot.image.display(), id.short())
                    }
                    SlotStatus::Failed(details) => println!("{}: failed ({})", slot.image.display(), details),
                    SlotStatus::Pending => println!("{}: pending", slot.image.display()),
                }
            }
            true
        }
        Command::Select { pair, field, index, word, phrase } => {
            let id = resolve_pair(&store, &pair)?;
            let target = match (index, phrase) {
                (Some(index), None) => {
                    let word = match word {
                        Some(word) => word,
                        None => store
                            .get(id)
                            .and_then(|pair| pair.text(field).split_whitespace().nth(index).map(str::to_string))
                            .ok_or_else(|| anyhow!("the {} of [{}] has no token {}", field, id.short(), index))?,
                    };
                    Selection::word(word, index)
                }
                (None, Some(phrase)) => Selection::phrase(phrase),
                _ => bail!("pass either --index or --phrase"),
            };
            let selections = store.toggle_selection(id, field, target)?;
            println!("[{}] {} now has {} selection(s)", id.short(), field, selections.len());
            true
        }
        Command::Edit { pair, field, text } => {
            let id = resolve_pair(&store, &pair)?;
            let edited = store.edit_text(id, field, &text)?;
            println!("[{}] {}: {}", id.short(), field, edited.text(field));
            true
        }
        Command::Delete { pair } => {
            let id = resolve_pair(&store, &pair)?;
            store.delete(id)?;
            println!("deleted [{}]", id.short());
            true
        }
        Command::Show => {
            print_pairs(&store);
            false
        }
        Command::Export { output, stdout } => {
            let document = store.document();
            if stdout {
                println!("{}", document);
            } else {
                let output_path = output.unwrap_or_else(|| settings.output_path.clone());
                let written = write_document(&output_path, &document)
                    .with_context(|| format!("failed to write {}", output_path.display()))?;
                println!("wrote {} pair(s) to {}", store.len(), written.display());
            }
            false
        }
    };

    if session_changed {
        let snapshot = SessionSnapshot { language, pairs: store.pairs() };
        save_session_snapshot(&snapshot, &session_path)
            .with_context(|| format!("failed to save session {}", session_path.display()))?;
    }
    Ok(())
}
