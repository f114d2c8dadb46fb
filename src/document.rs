use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// One loaded paper: its full extracted text plus best-effort metadata
/// pulled from the first page. Replaced wholesale when a new paper loads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub text: String,
    pub title: Option<String>,
    pub authors: Option<String>,
}

impl Document {
    pub fn from_text(text: String) -> Self {
        let title = extract_title(&text);
        let authors = extract_authors(&text);
        Self { text, title, authors }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

fn metadata_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(doi:|issn:|volume|issue|http|journal of|copyright|proceedings)")
            .expect("metadata regex")
    })
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email regex")
    })
}

fn author_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^authors?\b:?\s*").expect("author marker regex"))
}

fn section_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(abstract|introduction|keywords)\b").expect("section regex")
    })
}

/// Guess the paper title: the first reasonably long line of the first page
/// that is not journal boilerplate.
pub fn extract_title(text: &str) -> Option<String> {
    let first_page: String = text.chars().take(1500).collect();
    first_page
        .lines()
        .take(10)
        .map(str::trim)
        .find(|line| line.len() >= 10 && !metadata_line_re().is_match(line))
        .map(str::to_string)
}

/// Guess the author block from the first page.
///
/// Three passes, strongest signal first: an explicit `Authors:` marker
/// (taking lines up to the abstract), then lines carrying an email address,
/// then comma-separated name lists near the top. Returns `None` when
/// nothing convincing is found rather than guessing.
pub fn extract_authors(text: &str) -> Option<String> {
    let head: String = text.chars().take(5000).collect();
    let lines: Vec<&str> = head.lines().map(str::trim).collect();

    // Pass 1: explicit author section.
    if let Some(start) = lines.iter().position(|l| author_marker_re().is_match(l)) {
        let mut collected = Vec::new();
        for line in &lines[start..] {
            if collected.is_empty() {
                collected.push(author_marker_re().replace(line, "").to_string());
                continue;
            }
            if line.is_empty() || section_start_re().is_match(line) {
                break;
            }
            collected.push((*line).to_string());
        }
        let joined = collected.join("\n").trim().to_string();
        if !joined.is_empty() {
            return Some(joined);
        }
    }

    // Pass 2: email lines are a strong author signal.
    let email_lines: Vec<&str> = lines
        .iter()
        .take(30)
        .filter(|l| email_re().is_match(l))
        .copied()
        .collect();
    if !email_lines.is_empty() {
        return Some(email_lines.join("\n"));
    }

    // Pass 3: a comma-separated name list near the top, e.g.
    // "A. Author, B. Author and C. Author".
    lines
        .iter()
        .take(20)
        .find(|line| {
            let lower = line.to_lowercase();
            line.contains(',')
                && (lower.contains(" and ") || line.contains(" & "))
                && !metadata_line_re().is_match(line)
                && !section_start_re().is_match(line)
        })
        .map(|line| (*line).to_string())
}
