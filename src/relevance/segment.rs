use std::sync::LazyLock;

use regex::Regex;

pub const UNTITLED_SECTION: &str = "Untitled Section";
pub const DEFAULT_MIN_TAIL: usize = 10;

static DEFAULT_RULE: LazyLock<CapitalizedRun> =
    LazyLock::new(|| CapitalizedRun::new(DEFAULT_MIN_TAIL).unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub content: String,
    pub page: u32,
}

/// Decides where page text breaks into sections and which leading text
/// names a section.
pub trait SectionBoundary: Send + Sync {
    /// `rest` is the text after a newline and any whitespace that follows it.
    fn starts_section(&self, rest: &str) -> bool;

    /// The raw leading title of `chunk`, as a prefix slice, if it has one.
    fn leading_title<'a>(&self, chunk: &'a str) -> Option<&'a str>;
}

/// Heading lines look like a capital letter followed by a run of at least
/// `min_tail` letters, spaces or tabs on the same line, optionally closed
/// by a colon.
#[derive(Debug, Clone)]
pub struct CapitalizedRun {
    boundary: Regex,
    title: Regex,
}

impl CapitalizedRun {
    pub fn new(min_tail: usize) -> Result<Self, regex::Error> {
        Ok(CapitalizedRun {
            boundary: Regex::new(&format!(r"(?m)\A[A-Z][A-Za-z \t]{{{},}}:?\r?$", min_tail))?,
            title: Regex::new(&format!(r"\A[A-Z][A-Za-z\s\-]{{{},}}:?", min_tail))?,
        })
    }
}

impl Default for CapitalizedRun {
    fn default() -> Self {
        DEFAULT_RULE.clone()
    }
}

impl SectionBoundary for CapitalizedRun {
    fn starts_section(&self, rest: &str) -> bool {
        self.boundary.is_match(rest)
    }

    fn leading_title<'a>(&self, chunk: &'a str) -> Option<&'a str> {
        self.title.find(chunk).map(|m| m.as_str())
    }
}

/// Sections of every page in order, each tagged with its page number.
pub fn segment_document(pages: &[(u32, &str)], rule: &dyn SectionBoundary) -> Vec<Section> {
    pages
        .iter()
        .flat_map(|(page, text)| segment_page(text, *page, rule))
        .collect()
}

pub fn segment_page(text: &str, page: u32, rule: &dyn SectionBoundary) -> Vec<Section> {
    split_chunks(text, rule)
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| build_section(chunk, page, rule))
        .collect()
}

/// Cut before every newline (plus trailing whitespace) that leads into a
/// heading-like line.
fn split_chunks<'a>(text: &'a str, rule: &dyn SectionBoundary) -> Vec<&'a str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('\n') {
        let newline = cursor + offset;
        let after = &text[newline + 1..];
        let resume = newline + 1 + (after.len() - after.trim_start().len());
        if rule.starts_section(&text[resume..]) {
            chunks.push(&text[start..newline]);
            start = resume;
            cursor = resume;
        } else {
            cursor = newline + 1;
        }
    }
    chunks.push(&text[start..]);
    chunks
}

fn build_section(chunk: &str, page: u32, rule: &dyn SectionBoundary) -> Section {
    let Some(raw_title) = rule.leading_title(chunk) else {
        return Section {
            title: UNTITLED_SECTION.to_string(),
            content: chunk.trim().to_string(),
            page,
        };
    };

    let title = raw_title.trim();
    // A title run that crossed a line break keeps only its first line; the
    // remaining lines belong to the content.
    let (title, body_start) = match title.find('\n') {
        Some(line_end) => (title[..line_end].trim_end(), line_end),
        None => (title, title.len()),
    };

    Section {
        title: title.to_string(),
        content: chunk[body_start..].trim().to_string(),
        page,
    }
}
