//! Command-line driver for the contradiction detection pipeline: runs a
//! single document or a multi-document comparison against local files and
//! prints whatever contradictions the pipeline finds.
//!
//! There is no production model runtime wired into this crate — the
//! embedder and NLI model are small deterministic stand-ins so the full
//! pipeline can be exercised end to end without a GPU or a served model.
//! Swap [`HashEmbedder`]/[`HeuristicNliModel`] for real implementations of
//! `SentenceEmbedder`/`CrossEncoderModel` to get production-quality results.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use contradiction_core::model::{Contradiction, DocumentRecord, DocumentStatus, ProcessingStage, Severity};
use contradiction_core::Settings;
use contradiction_ids::DocumentId;
use contradiction_nlp::NoopEntityExtractor;
use contradiction_pipeline::{InMemoryObjectStore, InMemoryRepository, Pipeline};

mod models;

use models::{HashEmbedder, HeuristicNliModel};

#[derive(Parser)]
#[command(name = "contradiction-cli", about = "Find contradictions in one or more documents", version)]
struct Cli {
    /// Path to a TOML settings file; falls back to built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON instead of a colored summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find contradictions within a single document.
    Process {
        /// Path to a .txt, .pdf, or .docx file.
        file: PathBuf,
    },
    /// Find contradictions between two to ten documents.
    Compare {
        /// Paths to the documents being compared (2-10 files).
        #[arg(required = true, num_args = 2..=10)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    let pipeline = Pipeline::new(
        Box::new(HashEmbedder),
        Box::new(NoopEntityExtractor),
        Box::new(HeuristicNliModel),
        settings,
    );

    match cli.command {
        Command::Process { file } => run_process(&pipeline, &file, cli.json),
        Command::Compare { files } => run_compare(&pipeline, &files, cli.json),
    }
}

fn load_settings(config: Option<&std::path::Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::from_toml_file(path).with_context(|| format!("reading config from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn run_process(pipeline: &Pipeline, file: &std::path::Path, json: bool) -> Result<()> {
    let repo = InMemoryRepository::new();
    let store = InMemoryObjectStore::new();

    let document_id = DocumentId::new();
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let storage_path = format!("docs/{name}");
    store.put(storage_path.clone(), bytes);
    repo.insert_document(document_record(document_id, &name, &storage_path));

    let spinner = start_spinner(&format!("Analyzing {name}"));
    pipeline
        .process_document(&repo, &store, document_id)
        .context("processing document")?;
    spinner.finish_and_clear();

    let contradictions = repo.contradictions();
    if json {
        print_json(&contradictions)
    } else {
        print_summary(&name, &contradictions);
        Ok(())
    }
}

fn run_compare(pipeline: &Pipeline, files: &[PathBuf], json: bool) -> Result<()> {
    let repo = InMemoryRepository::new();
    let store = InMemoryObjectStore::new();

    let mut document_ids = Vec::with_capacity(files.len());
    for file in files {
        let document_id = DocumentId::new();
        let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let storage_path = format!("docs/{name}");
        store.put(storage_path.clone(), bytes);
        repo.insert_document(document_record(document_id, &name, &storage_path));
        document_ids.push(document_id);
    }

    let session = contradiction_core::model::ComparisonSession::new(contradiction_ids::ComparisonSessionId::new(), document_ids)
        .context("building comparison session")?;
    let session_id = session.id;
    repo.insert_comparison(session);

    let spinner = start_spinner(&format!("Comparing {} documents", files.len()));
    pipeline
        .process_multi_documents(&repo, &store, session_id)
        .context("comparing documents")?;
    spinner.finish_and_clear();

    let contradictions = repo.contradictions();
    if json {
        print_json(&contradictions)
    } else {
        print_summary(&format!("{} documents", files.len()), &contradictions);
        Ok(())
    }
}

fn document_record(id: DocumentId, name: &str, storage_path: &str) -> DocumentRecord {
    DocumentRecord {
        id,
        name: name.to_string(),
        storage_path: storage_path.to_string(),
        status: DocumentStatus::Pending,
        stage: ProcessingStage::Downloading,
        progress_percent: 0,
        started_at: None,
        completed_at: None,
        error_message: None,
    }
}

fn start_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap());
    bar.set_message(message.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

fn print_json(contradictions: &[Contradiction]) -> Result<()> {
    let json = serde_json::to_string_pretty(contradictions)?;
    println!("{json}");
    Ok(())
}

fn print_summary(label: &str, contradictions: &[Contradiction]) {
    if contradictions.is_empty() {
        println!("{} No contradictions found in {label}.", "\u{2713}".green());
        return;
    }

    println!("{}", format!("Found {} contradiction(s) in {label}:", contradictions.len()).bold());
    for c in contradictions {
        let severity = match c.severity {
            Severity::High => "HIGH".red().bold(),
            Severity::Medium => "MEDIUM".yellow().bold(),
            Severity::Low => "LOW".normal(),
        };
        println!(
            "  [{severity}] {:.1}% {:?} - {}",
            c.confidence, c.kind, c.description
        );
    }
}
