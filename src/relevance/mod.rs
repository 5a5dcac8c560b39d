pub mod embed;
pub mod persona;
pub mod segment;

use std::path::Path;
use std::sync::LazyLock;

use chrono::Utc;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::PipelineResult;
use crate::layout;
use crate::report::{ExtractedSection, Metadata, RankedOutput, SubsectionAnalysis};
use embed::{cosine_similarity, Embedder};
use persona::PersonaConfig;
use segment::{Section, SectionBoundary};

pub const MAX_SECTIONS: usize = 5;
pub const MAX_SUBSECTIONS: usize = 5;
pub const MAX_TEXT_LENGTH: usize = 500;
pub const ELLIPSIS: &str = "...";

/// Paragraphs this short (after trimming) are not scored.
const MIN_PARAGRAPH_CHARS: usize = 20;

static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSection {
    pub document: String,
    pub title: String,
    pub page: u32,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredParagraph {
    pub document: String,
    pub text: String,
    pub page: u32,
    pub similarity: f32,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentScores {
    pub sections: Vec<ScoredSection>,
    pub paragraphs: Vec<ScoredParagraph>,
}

/// Score every configured document against the persona query and keep the
/// top sections and paragraphs.
///
/// Documents are scored in parallel, merged back in configured order, then
/// ranked by one stable sort, so equal scores keep discovery order.
pub fn rank(
    config: &PersonaConfig,
    input_dir: &Path,
    embedder: &dyn Embedder,
    boundary: &dyn SectionBoundary,
) -> PipelineResult<RankedOutput> {
    if let Some(challenge) = &config.challenge_info {
        info!(
            id = challenge.challenge_id.as_deref().unwrap_or("-"),
            case = challenge.test_case_name.as_deref().unwrap_or("-"),
            "ranking challenge"
        );
    }
    let query = embedder.embed(&config.query())?;

    let per_document: Vec<Option<DocumentScores>> = config
        .documents
        .par_iter()
        .map(|doc| {
            let path = layout::resolve_layout_path(input_dir, &doc.filename);
            debug!(document = %doc.filename, title = ?doc.title, path = %path.display(), "loading");
            let loaded = match layout::load_document(&path) {
                Ok(loaded) => loaded,
                Err(e) if e.is_document_local() => {
                    warn!(document = %doc.filename, "skipping: {}", e);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            let sections = segment::segment_document(&layout::page_texts(&loaded), boundary);
            let scores = score_document(&doc.filename, &sections, &query, embedder)?;
            info!(
                document = %doc.filename,
                sections = scores.sections.len(),
                paragraphs = scores.paragraphs.len(),
                "scored document"
            );
            Ok(Some(scores))
        })
        .collect::<PipelineResult<_>>()?;

    let mut sections = Vec::new();
    let mut paragraphs = Vec::new();
    for scores in per_document.into_iter().flatten() {
        sections.extend(scores.sections);
        paragraphs.extend(scores.paragraphs);
    }

    Ok(RankedOutput {
        metadata: Metadata {
            input_documents: config.filenames(),
            persona: config.persona.role.clone(),
            job_to_be_done: config.job_to_be_done.task.clone(),
            processing_timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        },
        extracted_sections: select_sections(sections),
        subsection_analysis: select_paragraphs(paragraphs),
    })
}

pub fn score_document(
    document: &str,
    sections: &[Section],
    query: &[f32],
    embedder: &dyn Embedder,
) -> PipelineResult<DocumentScores> {
    let mut scores = DocumentScores::default();
    for section in sections {
        let vector = embedder.embed(&format!("{}: {}", section.title, section.content))?;
        scores.sections.push(ScoredSection {
            document: document.to_string(),
            title: section.title.clone(),
            page: section.page,
            similarity: cosine_similarity(&vector, query)?,
        });

        for paragraph in split_paragraphs(&section.content) {
            let vector = embedder.embed(paragraph)?;
            scores.paragraphs.push(ScoredParagraph {
                document: document.to_string(),
                text: paragraph.to_string(),
                page: section.page,
                similarity: cosine_similarity(&vector, query)?,
            });
        }
    }
    Ok(scores)
}

/// Blank-line separated paragraphs, trimmed, longer than the scoring floor.
pub fn split_paragraphs(content: &str) -> Vec<&str> {
    PARAGRAPH_BREAK_RE
        .split(content)
        .map(str::trim)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect()
}

/// Highest similarity first; rank is position, 1-based.
pub fn select_sections(mut sections: Vec<ScoredSection>) -> Vec<ExtractedSection> {
    sections.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    sections
        .into_iter()
        .take(MAX_SECTIONS)
        .enumerate()
        .map(|(i, s)| ExtractedSection {
            document: s.document,
            section_title: s.title,
            importance_rank: i as u32 + 1,
            page_number: s.page,
        })
        .collect()
}

pub fn select_paragraphs(mut paragraphs: Vec<ScoredParagraph>) -> Vec<SubsectionAnalysis> {
    paragraphs.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    paragraphs
        .into_iter()
        .take(MAX_SUBSECTIONS)
        .map(|p| SubsectionAnalysis {
            document: p.document,
            refined_text: refine_text(&p.text),
            page_number: p.page,
        })
        .collect()
}

/// Hard cap at `MAX_TEXT_LENGTH` characters, marked with an ellipsis when cut.
pub fn refine_text(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_LENGTH {
        return text.to_string();
    }
    let mut refined: String = text.chars().take(MAX_TEXT_LENGTH).collect();
    refined.push_str(ELLIPSIS);
    refined
}

// ── Tests ──
