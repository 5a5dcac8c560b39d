pub mod candidates;
pub mod levels;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::layout::{self, DocumentLayout, TextSpan};
use candidates::{heading_candidates, infer_title, is_numeric, is_title_candidate, UNTITLED};
use levels::{assign_levels, HeadingLevel};

static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^page\s+\d+(\s+of\s+\d+)?$").unwrap());

/// Boilerplate that survives the shape filter: running markers and
/// mis-decoded bullet glyphs.
const STOPLIST: &[&str] = &["page", "continued", "(continued)", "•", "·", "â€¢", "â—"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl DocumentOutline {
    pub fn empty() -> Self {
        DocumentOutline {
            title: UNTITLED.to_string(),
            outline: Vec::new(),
        }
    }
}

/// Three-pass pipeline: layout → spans → candidates → leveled outline.
pub fn extract_outline(doc: &DocumentLayout) -> DocumentOutline {
    let spans = layout::collect_spans(doc);
    outline_from_spans(&spans)
}

pub fn outline_from_spans(spans: &[TextSpan]) -> DocumentOutline {
    let title = infer_title(spans);

    let candidates = heading_candidates(spans);
    let sizes: Vec<f32> = candidates.iter().map(|s| s.size).collect();
    let levels = assign_levels(&sizes);

    // Levels are fixed over every candidate before anything is dropped, then
    // the survivors are walked in (page, top) order. sort_by is stable, so
    // spans sharing a line keep discovery order.
    let mut placed: Vec<(HeadingLevel, &TextSpan)> = levels.into_iter().zip(candidates).collect();
    placed.sort_by(|a, b| {
        a.1.page
            .cmp(&b.1.page)
            .then(a.1.bbox.y0.total_cmp(&b.1.bbox.y0))
    });

    let mut seen: HashSet<String> = HashSet::new();
    let mut outline = Vec::new();
    for (level, span) in placed {
        let text = normalize_whitespace(&span.text);
        let key = text.to_lowercase();
        if seen.contains(&key) || is_boilerplate(&text) {
            continue;
        }
        seen.insert(key);
        outline.push(OutlineEntry {
            level,
            text,
            page: span.page,
        });
    }

    DocumentOutline { title, outline }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    text.chars().count() < 2
        || is_numeric(text)
        || STOPLIST.contains(&lower.as_str())
        || PAGE_MARKER_RE.is_match(text)
}

// ── Survey ──

/// Counts reported by the `stats` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutSurvey {
    pub pages: usize,
    pub spans: usize,
    pub title_candidates: usize,
    pub heading_candidates: usize,
    pub outline_entries: usize,
}

pub fn survey(doc: &DocumentLayout) -> LayoutSurvey {
    let spans = layout::collect_spans(doc);
    LayoutSurvey {
        pages: doc.pages.len(),
        spans: spans.len(),
        title_candidates: spans.iter().filter(|s| is_title_candidate(s)).count(),
        heading_candidates: heading_candidates(&spans).len(),
        outline_entries: outline_from_spans(&spans).outline.len(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{load_document, BoundingBox};
    use std::path::Path;
    use HeadingLevel::*;

    fn span(text: &str, size: f32, page: u32, y: f32, bold: bool) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            size,
            page,
            bbox: BoundingBox::from([40.0, y, 200.0, y + size]),
            is_bold: bold,
            page_width: 600.0,
        }
    }

    #[test]
    fn introduction_scenario() {
        let spans = vec![
            span("Introduction", 18.0, 1, 50.0, true),
            span("This chapter covers...", 11.0, 1, 80.0, false),
        ];
        let outline = outline_from_spans(&spans);
        assert_eq!(outline.title, "Introduction This chapter covers...");
        assert_eq!(
            outline.outline,
            vec![OutlineEntry {
                level: H1,
                text: "Introduction".into(),
                page: 1
            }]
        );
    }

    #[test]
    fn title_is_heading_text_when_alone_in_zone() {
        let spans = vec![
            span("Introduction", 18.0, 1, 50.0, true),
            span("This chapter covers...", 11.0, 1, 120.0, false),
        ];
        assert_eq!(outline_from_spans(&spans).title, "Introduction");
    }

    #[test]
    fn no_spans_is_untitled_and_empty() {
        assert_eq!(outline_from_spans(&[]), DocumentOutline::empty());
        assert_eq!(extract_outline(&DocumentLayout::default()), DocumentOutline::empty());
    }

    #[test]
    fn repeated_heading_keeps_first_position() {
        let spans = vec![
            span("Methods", 14.0, 2, 300.0, true),
            span("METHODS", 14.0, 1, 500.0, true),
            span("Methods", 14.0, 3, 100.0, true),
        ];
        let outline = outline_from_spans(&spans).outline;
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].text, "METHODS");
        assert_eq!(outline[0].page, 1);
    }

    #[test]
    fn ordered_by_page_then_top() {
        let spans = vec![
            span("Later Page", 16.0, 2, 50.0, true),
            span("Bottom", 16.0, 1, 700.0, true),
            span("Top", 16.0, 1, 120.0, true),
        ];
        let texts: Vec<String> = outline_from_spans(&spans)
            .outline
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["Top", "Bottom", "Later Page"]);
    }

    #[test]
    fn whitespace_is_collapsed() {
        let spans = vec![span("Results   and\tDiscussion", 14.0, 1, 300.0, true)];
        assert_eq!(
            outline_from_spans(&spans).outline[0].text,
            "Results and Discussion"
        );
    }

    #[test]
    fn boilerplate_is_dropped() {
        let spans = vec![
            span("Continued", 14.0, 1, 200.0, true),
            span("Page 3 of 12", 14.0, 1, 210.0, true),
            span("â€¢", 14.0, 1, 220.0, true),
            span("X", 14.0, 1, 230.0, true),
            span("Summary", 14.0, 1, 240.0, true),
        ];
        let outline = outline_from_spans(&spans).outline;
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].text, "Summary");
    }

    #[test]
    fn dropped_candidates_still_shape_levels() {
        // The 24pt bullet glyph claims the top bin even though it is filtered out.
        let spans = vec![
            span("•", 24.0, 1, 150.0, true),
            span("Chapter", 18.0, 1, 200.0, true),
            span("Detail", 10.0, 1, 300.0, true),
        ];
        let outline = outline_from_spans(&spans).outline;
        assert_eq!(outline[0].text, "Chapter");
        assert_ne!(outline[0].level, H1);
    }

    #[test]
    fn guide_fixture_outline() {
        let doc = load_document(Path::new("tests/fixtures/input/guide.layout.json")).unwrap();
        let outline = extract_outline(&doc);
        assert_eq!(outline.title, "Field Guide to Coastal Trips");
        let texts: Vec<&str> = outline.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Field Guide to Coastal Trips",
                "Planning Your Route",
                "Where to Stay",
                "Local Food"
            ]
        );
        assert_eq!(outline.outline[0].level, H1);
        assert!(outline.outline.iter().skip(1).all(|e| e.level > H1));
        assert_eq!(outline.outline[3].page, 2);
    }

    #[test]
    fn survey_counts() {
        let doc = load_document(Path::new("tests/fixtures/input/guide.layout.json")).unwrap();
        let s = survey(&doc);
        assert_eq!(s.pages, 2);
        assert_eq!(s.outline_entries, 4);
        assert!(s.heading_candidates >= s.outline_entries);
    }
}
