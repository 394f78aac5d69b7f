//! Command-line entrypoint for batch analysis and document questions.
//!
//! Shares configuration, storage, and the vector store with the HTTP and MCP servers.
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use legalyze::{
    config,
    extraction::is_supported,
    highlight::{format_key_information, group_entities_by_type, truncate_text},
    logging::{self, ConsoleTarget},
    processing::{AnalysisReport, ProcessingService},
    storage::{DEFAULT_CHAT_HISTORY_LIMIT, DEFAULT_DOCUMENT_LIST_LIMIT},
};
use walkdir::WalkDir;

const SUMMARY_PREVIEW_CHARS: usize = 120;

#[derive(Parser)]
#[command(
    name = "legalyze-cli",
    about = "Analyze legal documents and ask questions about them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze files, or every supported file under directories.
    Analyze {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Analyze even when identical text is already stored.
        #[arg(long)]
        force: bool,
    },
    /// List saved documents, newest first.
    List {
        #[arg(long, default_value_t = DEFAULT_DOCUMENT_LIST_LIMIT)]
        limit: i64,
    },
    /// Show a stored document's analysis and entities.
    Show {
        id: i64,
        /// Print the full document text as well.
        #[arg(long)]
        text: bool,
    },
    /// Ask a question about a stored document.
    Ask { id: i64, question: String },
    /// Show recent questions and answers for a document.
    History {
        id: i64,
        #[arg(long, default_value_t = DEFAULT_CHAT_HISTORY_LIMIT)]
        limit: i64,
    },
    /// Delete a document with its entities, history, and vectors.
    Delete { id: i64 },
    /// Write the document text as HTML with highlighted entities.
    Highlight {
        id: i64,
        #[arg(long)]
        output: PathBuf,
    },
    /// Ask a general legal question.
    LegalInfo { query: String },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config().context("failed to load configuration")?;
    logging::init_tracing_with(ConsoleTarget::Stderr);

    let service = ProcessingService::new()
        .await
        .context("failed to initialize processing service")?;

    match cli.command {
        Command::Analyze { paths, force } => analyze(&service, &paths, force).await,
        Command::List { limit } => {
            let documents = service.list_documents(limit.max(1)).await?;
            if documents.is_empty() {
                println!("No saved documents.");
            }
            for document in documents {
                println!(
                    "[{}] {} ({}) {}",
                    document.id,
                    document.filename,
                    document.document_type.as_deref().unwrap_or("unclassified"),
                    document.upload_date
                );
                if let Some(summary) = document.summary.as_deref() {
                    println!("    {}", truncate_text(summary, SUMMARY_PREVIEW_CHARS));
                }
            }
            Ok(())
        }
        Command::Show { id, text } => {
            let document = service.get_document(id).await?;
            let mut out = String::new();
            writeln!(out, "# {} (id {})", document.filename, document.id)?;
            writeln!(out, "Uploaded: {}", document.upload_date)?;
            if let Some(document_type) = document.document_type.as_deref() {
                writeln!(out, "Type: {document_type}")?;
            }
            if let Some(explanation) = document.document_type_explanation.as_deref() {
                writeln!(out, "Why: {explanation}")?;
            }
            if let Some(summary) = document.summary.as_deref() {
                writeln!(out, "\n## Summary\n{summary}")?;
            }
            if !document.key_information.is_empty() {
                writeln!(
                    out,
                    "\n## Key information\n{}",
                    format_key_information(&document.key_information)
                )?;
            }
            write_entities(&mut out, &document.entities)?;
            if text {
                writeln!(out, "\n## Text\n{}", document.document_text)?;
            }
            print!("{out}");
            Ok(())
        }
        Command::Ask { id, question } => {
            let answer = service.ask(id, &question).await?;
            println!("{}", answer.answer);
            if answer.used_fallback_context {
                eprintln!("(answered from the opening of the document; retrieval was unavailable)");
            }
            Ok(())
        }
        Command::History { id, limit } => {
            let history = service.chat_history(id, limit.max(1)).await?;
            if history.is_empty() {
                println!("No questions recorded for document {id}.");
            }
            for interaction in history {
                println!("[{}] Q: {}", interaction.timestamp, interaction.user_query);
                println!("A: {}\n", interaction.assistant_response);
            }
            Ok(())
        }
        Command::Delete { id } => {
            service.delete_document(id).await?;
            println!("Deleted document {id}.");
            Ok(())
        }
        Command::Highlight { id, output } => {
            let html = service.highlighted_document(id).await?;
            tokio::fs::write(&output, html)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Wrote {}", output.display());
            Ok(())
        }
        Command::LegalInfo { query } => {
            println!("{}", service.legal_information(&query).await?);
            Ok(())
        }
    }
}

async fn analyze(service: &ProcessingService, paths: &[PathBuf], force: bool) -> Result<()> {
    let files = collect_files(paths)?;
    if files.is_empty() {
        bail!("no PDF, DOCX, or TXT files found");
    }

    let mut failures = 0usize;
    for path in files {
        match analyze_file(service, &path, force).await {
            Ok(Some(report)) => print_report(&path, &report),
            Ok(None) => {}
            Err(err) => {
                failures += 1;
                eprintln!("{}: {err:#}", path.display());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} file(s) failed");
    }
    Ok(())
}

fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(supported_files_under(path));
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("{} does not exist", path.display());
        }
    }
    Ok(files)
}

/// Supported files below `dir`, sorted; unreadable entries are logged and skipped.
fn supported_files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::warn!(
                    path = ?error.path(),
                    error = %error,
                    "Skipping unreadable directory entry"
                );
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

async fn analyze_file(
    service: &ProcessingService,
    path: &Path,
    force: bool,
) -> Result<Option<AnalysisReport>> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let extracted = service.extract_upload(&filename, bytes).await?;

    if !force && let Some(existing) = service.find_duplicate(&extracted.text).await? {
        println!(
            "{}: already stored as document {} ({}); use --force to analyze again",
            path.display(),
            existing.id,
            existing.filename
        );
        return Ok(None);
    }

    let report = service
        .analyze_text(&extracted.filename, extracted.text)
        .await?;
    Ok(Some(report))
}

fn print_report(path: &Path, report: &AnalysisReport) {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} -> document {} [{}] {} chars, {} entities, {} chunks, {} ms",
        path.display(),
        report.document_id,
        report.analysis.document_type.label,
        report.characters,
        report.entities.len(),
        report.chunks_indexed,
        report.elapsed_ms
    );
    let _ = writeln!(
        out,
        "    {}",
        truncate_text(&report.analysis.summary, SUMMARY_PREVIEW_CHARS)
    );
    print!("{out}");
}

fn write_entities(out: &mut String, entities: &[legalyze::ner::LegalEntity]) -> std::fmt::Result {
    let groups = group_entities_by_type(entities);
    if groups.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n## Entities")?;
    for (entity_type, texts) in groups {
        writeln!(out, "- {}: {}", entity_type, texts.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_walk_keeps_supported_files_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("exhibits");
        std::fs::create_dir_all(&nested).expect("mkdir");
        for name in ["b-lease.pdf", "a-nda.txt", "scan.png"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }
        std::fs::write(nested.join("c-amendment.docx"), b"x").expect("write");

        let files = supported_files_under(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|path| path.strip_prefix(dir.path()).expect("relative"))
            .collect();
        assert_eq!(
            names,
            vec![
                Path::new("a-nda.txt"),
                Path::new("b-lease.pdf"),
                Path::new("exhibits/c-amendment.docx"),
            ]
        );
    }
}
