//! Page-layout dumps and the span collector both pipelines start from.
//!
//! The external extractor writes one `<stem>.layout.json` per document: for
//! every page its width, reading-order text, and the styled text spans with
//! bounding boxes. Page numbers are positional (1-based).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

pub const LAYOUT_SUFFIX: &str = ".layout.json";

/// Style-flag bit the extractor sets on bold runs.
const BOLD_FLAG: u32 = 1 << 4;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentLayout {
    #[serde(default)]
    pub pages: Vec<PageLayout>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageLayout {
    pub width: f32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<RawSpan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSpan {
    pub text: String,
    pub size: f32,
    /// (left, top, right, bottom) in page units; the bottom edge is unused.
    pub bbox: [f32; 4],
    #[serde(default)]
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
}

impl BoundingBox {
    pub fn mid_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(b: [f32; 4]) -> Self {
        BoundingBox {
            x0: b[0],
            y0: b[1],
            x1: b[2],
        }
    }
}

/// One trimmed, non-empty run of uniformly styled text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub size: f32,
    pub page: u32,
    pub bbox: BoundingBox,
    pub is_bold: bool,
    pub page_width: f32,
}

// ── Span collection ──

pub fn collect_spans(layout: &DocumentLayout) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    for (idx, page) in layout.pages.iter().enumerate() {
        for raw in &page.spans {
            let text = raw.text.trim();
            if text.is_empty() {
                continue;
            }
            spans.push(TextSpan {
                text: text.to_string(),
                size: raw.size,
                page: idx as u32 + 1,
                bbox: BoundingBox::from(raw.bbox),
                is_bold: raw.flags & BOLD_FLAG != 0,
                page_width: page.width,
            });
        }
    }
    spans
}

/// Raw reading-order text per page, tagged with the 1-based page number.
pub fn page_texts(layout: &DocumentLayout) -> Vec<(u32, &str)> {
    layout
        .pages
        .iter()
        .enumerate()
        .map(|(idx, page)| (idx as u32 + 1, page.text.as_str()))
        .collect()
}

// ── Loading ──

pub fn load_document(path: &Path) -> PipelineResult<DocumentLayout> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PipelineError::MissingInput(path.to_path_buf()))
        }
        Err(e) => return Err(PipelineError::malformed(path, e)),
    };
    let layout: DocumentLayout =
        serde_json::from_str(&raw).map_err(|e| PipelineError::malformed(path, e))?;
    debug!(path = %path.display(), pages = layout.pages.len(), "loaded layout");
    Ok(layout)
}

/// Map a configured document name onto its layout dump inside `dir`.
/// `guide.pdf` becomes `guide.layout.json`; dump names pass through.
pub fn resolve_layout_path(dir: &Path, filename: &str) -> PathBuf {
    if filename.to_lowercase().ends_with(LAYOUT_SUFFIX) {
        return dir.join(filename);
    }
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    dir.join(format!("{}{}", stem, LAYOUT_SUFFIX))
}

/// File name of a layout dump with the `.layout.json` suffix removed.
pub fn document_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if name.to_lowercase().ends_with(LAYOUT_SUFFIX) {
        name[..name.len() - LAYOUT_SUFFIX.len()].to_string()
    } else {
        name
    }
}

/// All layout dumps directly inside `dir`, sorted by path.
pub fn discover_layouts(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_layout = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase().ends_with(LAYOUT_SUFFIX))
            .unwrap_or(false);
        if is_layout && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

// ── Tests ──
