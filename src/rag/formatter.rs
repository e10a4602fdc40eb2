//! Response formatting: extract the trailing product id list
//!
//! Parsing is total over any input string. Missing or malformed id markup
//! degrades to an empty id list.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::RecommendationResult;
use crate::models::MAX_PRODUCT_IDS;

/// Characters from the end of the text scanned for identifiers
pub const DEFAULT_TAIL_WINDOW: usize = 600;

fn id_token() -> &'static Regex {
    static ID_TOKEN: OnceLock<Regex> = OnceLock::new();
    ID_TOKEN.get_or_init(|| {
        Regex::new(r"\[\s*<?\s*([A-Za-z0-9][A-Za-z0-9_\-]*)\s*>?\s*\]").expect("valid id regex")
    })
}

/// Label allowed in front of the id list on its line, e.g. `Product IDs:`
fn list_label() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"^[\s*_#\-]*(?:[A-Za-z][A-Za-z ]{0,40}:)?[\s,;.*_]*$").expect("valid label regex")
    })
}

/// Parses raw generation output into a `RecommendationResult`
#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    tail_window: usize,
}

impl ResponseFormatter {
    #[must_use]
    pub const fn new(tail_window: usize) -> Self {
        Self { tail_window }
    }

    /// Format raw model output
    #[must_use]
    pub fn format(&self, raw: &str) -> RecommendationResult {
        let product_ids = self.extract_ids(raw);
        let display_text = if product_ids.is_empty() {
            raw.to_string()
        } else {
            strip_trailing_ids(raw)
        };

        RecommendationResult {
            narrative: raw.to_string(),
            product_ids,
            display_text,
        }
    }

    /// Collect up to three distinct ids from the trailing id list, in first-appearance order.
    ///
    /// Only the final run of bracketed tokens counts, so bracketed words in the
    /// closing prose never displace the listed ids.
    #[must_use]
    pub fn extract_ids(&self, raw: &str) -> Vec<String> {
        let tail = tail_slice(raw, self.tail_window);
        let mut ids: Vec<String> = Vec::with_capacity(MAX_PRODUCT_IDS);

        for id in trailing_run(tail) {
            if ids.iter().any(|seen| seen == id) {
                continue;
            }
            ids.push(id.to_string());
            if ids.len() == MAX_PRODUCT_IDS {
                break;
            }
        }

        ids
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TAIL_WINDOW)
    }
}

/// Last `window` bytes of `text`, moved forward to a char boundary
fn tail_slice(text: &str, window: usize) -> &str {
    if text.len() <= window {
        return text;
    }
    let mut start = text.len() - window;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Ids of the last contiguous `[id], [id], ...` sequence in `text`
fn trailing_run(text: &str) -> Vec<&str> {
    let tokens: Vec<(usize, usize, &str)> = id_token()
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let id = captures.get(1)?;
            Some((whole.start(), whole.end(), id.as_str()))
        })
        .collect();

    let Some(last) = tokens.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut first = last;
    while first > 0 && is_list_separator(&text[tokens[first - 1].1..tokens[first].0]) {
        first -= 1;
    }

    tokens[first..].iter().map(|&(_, _, id)| id).collect()
}

/// Whether the gap between two bracketed tokens keeps them in one list
fn is_list_separator(gap: &str) -> bool {
    let word = gap.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|' | '&'));
    word.is_empty() || word.eq_ignore_ascii_case("and")
}

/// Remove the final line when it holds only the id list (plus an optional label)
fn strip_trailing_ids(raw: &str) -> String {
    let trimmed = raw.trim_end();
    let (head, last_line) = match trimmed.rfind('\n') {
        Some(pos) => (&trimmed[..pos], &trimmed[pos + 1..]),
        None => ("", trimmed),
    };

    if !id_token().is_match(last_line) {
        return raw.to_string();
    }

    let remainder = id_token().replace_all(last_line, "");
    if list_label().is_match(&remainder) {
        return head.trim_end().to_string();
    }

    // Ids share the line with prose: cut from the first id onwards.
    match id_token().find(last_line) {
        Some(first) => {
            let mut kept = String::with_capacity(trimmed.len());
            if !head.is_empty() {
                kept.push_str(head);
                kept.push('\n');
            }
            kept.push_str(last_line[..first.start()].trim_end());
            kept.trim_end().to_string()
        }
        None => raw.to_string(),
    }
}
