//! Tokenizers used by the scorers.

use regex::Regex;
use std::sync::OnceLock;

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// ROUGE tokenization: lower-case, anything outside `[a-z0-9]` is a
/// separator. No stemming.
pub fn rouge_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    non_alnum()
        .replace_all(&lower, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Whitespace-separated words, case preserved.
pub fn whitespace_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Every character is a token, whitespace included.
pub fn char_tokens(text: &str) -> Vec<String> {
    text.chars().map(|c| c.to_string()).collect()
}

/// Word pieces for embedding: lower-cased, split on whitespace, and each
/// punctuation character kept as its own token.
pub fn embedding_tokens(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in text.split_whitespace() {
        let mut current = String::new();
        for c in word.chars() {
            if c.is_alphanumeric() {
                current.extend(c.to_lowercase());
            } else {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                out.push(c.to_string());
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}
