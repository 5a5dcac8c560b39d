mod error;
mod layout;
mod outline;
mod relevance;
mod report;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use outline::DocumentOutline;
use relevance::persona::{PersonaConfig, CONFIG_FILE};
use relevance::segment::CapitalizedRun;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "outline_ranker",
    about = "Heading outlines and persona-driven section ranking from page-layout dumps"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a heading outline for every layout dump in a directory
    Outline {
        /// Directory holding `<name>.layout.json` dumps
        #[arg(short, long, default_value = "input")]
        input: PathBuf,
        /// Directory receiving one `<name>.json` outline per document
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
    /// Rank sections and paragraphs of a document set for a persona and task
    Rank {
        /// Directory holding the configured documents' layout dumps
        #[arg(short, long, default_value = "input")]
        input: PathBuf,
        /// Persona configuration (default: <input>/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Ranked report path
        #[arg(short, long, default_value = "output/output.json")]
        output: PathBuf,
    },
    /// Per-document layout statistics
    Stats {
        #[arg(short, long, default_value = "input")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Outline { input, output } => {
            let counts = outline_directory(&input, &output)?;
            counts.print();
            Ok(())
        }
        Commands::Rank {
            input,
            config,
            output,
        } => {
            let config_path = config.unwrap_or_else(|| input.join(CONFIG_FILE));
            let persona = PersonaConfig::load(&config_path)?;
            let settings = Settings::load()?;
            let embedder = relevance::embed::from_settings(&settings)?;
            let boundary = CapitalizedRun::new(settings.segment_min_tail)
                .context("invalid segment_min_tail")?;

            println!(
                "Ranking {} documents for \"{}\"...",
                persona.documents.len(),
                persona.persona.role
            );
            let ranked = relevance::rank(&persona, &input, embedder.as_ref(), &boundary)?;
            report::write_json(&output, &ranked)?;
            println!(
                "Saved {} sections, {} paragraphs to {}",
                ranked.extracted_sections.len(),
                ranked.subsection_analysis.len(),
                output.display()
            );
            Ok(())
        }
        Commands::Stats { input } => {
            let paths = layout::discover_layouts(&input)
                .with_context(|| format!("failed to list {}", input.display()))?;
            if paths.is_empty() {
                println!("No layout dumps in {}.", input.display());
                return Ok(());
            }

            println!(
                "{:<28} | {:>5} | {:>6} | {:>5} | {:>8} | {:>7}",
                "Document", "Pages", "Spans", "Title", "Headings", "Outline"
            );
            println!("{}", "-".repeat(76));
            for path in &paths {
                let name = truncate(&layout::document_stem(path), 28);
                match layout::load_document(path) {
                    Ok(doc) => {
                        let s = outline::survey(&doc);
                        println!(
                            "{:<28} | {:>5} | {:>6} | {:>5} | {:>8} | {:>7}",
                            name,
                            s.pages,
                            s.spans,
                            s.title_candidates,
                            s.heading_candidates,
                            s.outline_entries
                        );
                    }
                    Err(e) => println!("{:<28} | {}", name, e),
                }
            }
            println!("\n{} documents", paths.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct OutlineCounts {
    documents: usize,
    headings: usize,
    empty: usize,
    errors: usize,
}

impl OutlineCounts {
    fn print(&self) {
        println!(
            "Wrote {} outlines, {} headings ({} empty, {} errors).",
            self.documents, self.headings, self.empty, self.errors,
        );
    }
}

/// One outline per layout dump. A bad document never stops the batch:
/// unreadable dumps get the empty outline, write failures are counted.
fn outline_directory(input: &Path, output: &Path) -> Result<OutlineCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let paths = layout::discover_layouts(input)
        .with_context(|| format!("failed to list {}", input.display()))?;
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    info!(documents = paths.len(), input = %input.display(), "outlining");

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let results: Vec<Result<DocumentOutline>> = paths
        .par_iter()
        .map(|path| {
            let result = outline_one(path, output);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    let mut counts = OutlineCounts {
        documents: 0,
        headings: 0,
        empty: 0,
        errors: 0,
    };
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(outline) => {
                counts.documents += 1;
                counts.headings += outline.outline.len();
                if outline.outline.is_empty() {
                    counts.empty += 1;
                }
            }
            Err(e) => {
                warn!(document = %path.display(), "outline failed: {:#}", e);
                counts.errors += 1;
            }
        }
    }
    Ok(counts)
}

fn outline_one(path: &Path, output: &Path) -> Result<DocumentOutline> {
    let outline = match layout::load_document(path) {
        Ok(doc) => outline::extract_outline(&doc),
        Err(e) => {
            warn!(document = %path.display(), "treating as empty: {}", e);
            DocumentOutline::empty()
        }
    };
    let target = output.join(format!("{}.json", layout::document_stem(path)));
    report::write_json(&target, &outline)?;
    Ok(outline)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_directory_writes_one_file_per_dump() {
        let dir = tempfile::tempdir().unwrap();
        let counts = outline_directory(Path::new("tests/fixtures/input"), dir.path()).unwrap();
        assert_eq!(counts.documents, 2);
        assert_eq!(counts.errors, 0);
        assert!(dir.path().join("guide.json").is_file());
        assert!(dir.path().join("food.json").is_file());
    }

    #[test]
    fn malformed_dump_gets_empty_outline() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("broken.layout.json"), "[[[").unwrap();
        let counts = outline_directory(input.path(), output.path()).unwrap();
        assert_eq!(counts.documents, 1);
        assert_eq!(counts.empty, 1);
        let written = fs::read_to_string(output.path().join("broken.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value, serde_json::json!({ "title": "Untitled", "outline": [] }));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }
}
