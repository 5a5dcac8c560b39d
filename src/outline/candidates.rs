use crate::layout::TextSpan;

pub const UNTITLED: &str = "Untitled";
pub const TITLE_MAX_CHARS: usize = 200;

/// Spans above this line on page 1 are title material.
const TITLE_ZONE_Y: f32 = 100.0;
const TITLE_PARTS: usize = 3;

const MAX_HEADING_WORDS: usize = 15;
const CENTER_TOLERANCE: f32 = 50.0;
const TRAILING_PUNCT: &[char] = &['.', ':', ';', ','];

pub fn is_title_candidate(span: &TextSpan) -> bool {
    span.page == 1 && span.bbox.y0 < TITLE_ZONE_Y
}

/// First three title-zone spans in (top, left) order, space-joined and capped.
pub fn infer_title(spans: &[TextSpan]) -> String {
    let mut zone: Vec<&TextSpan> = spans.iter().filter(|s| is_title_candidate(s)).collect();
    zone.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let joined = zone
        .iter()
        .take(TITLE_PARTS)
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let title: String = joined.trim().chars().take(TITLE_MAX_CHARS).collect();

    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

pub fn is_centered(span: &TextSpan) -> bool {
    (span.bbox.mid_x() - span.page_width / 2.0).abs() < CENTER_TOLERANCE
}

/// Any Unicode digit counts, so `²` and `③` are numbers too.
pub fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_numeric)
}

/// Short, unpunctuated, not a bare number.
pub fn has_heading_shape(text: &str) -> bool {
    text.split_whitespace().count() < MAX_HEADING_WORDS
        && !text.ends_with(TRAILING_PUNCT)
        && !is_numeric(text)
}

pub fn is_heading_candidate(span: &TextSpan) -> bool {
    has_heading_shape(&span.text) && (span.is_bold || is_centered(span))
}

pub fn heading_candidates(spans: &[TextSpan]) -> Vec<&TextSpan> {
    spans.iter().filter(|s| is_heading_candidate(s)).collect()
}
