// SPDX-License-Identifier: MIT

//! Digest builders for recalled history and search results
//!
//! Both functions are pure: identical input always renders identical text.

use crate::researcher::search::SearchResult;
use crate::researcher::store::StoredMessage;

/// Maximum number of entries rendered in a digest
pub const DIGEST_LIMIT: usize = 5;
pub const RECALL_EXCERPT_CHARS: usize = 250;
pub const SNIPPET_CHARS: usize = 300;

/// Render the most recent history entries containing `query`
pub fn format_recall(query: &str, history: &[StoredMessage]) -> String {
    let needle = query.to_lowercase();
    let relevant: Vec<&str> = history
        .iter()
        .map(|m| m.content.as_str())
        .filter(|content| content.to_lowercase().contains(&needle))
        .collect();

    if relevant.is_empty() {
        return format!("No prior research found related to '{}'.", query);
    }

    let mut summary = format!(
        "### Found {} previous discussions about '{}':\n\n",
        relevant.len(),
        query
    );
    let recent = &relevant[relevant.len().saturating_sub(DIGEST_LIMIT)..];
    for (i, msg) in recent.iter().enumerate() {
        summary.push_str(&format!(
            "{}. {}...\n\n",
            i + 1,
            truncate_chars(msg, RECALL_EXCERPT_CHARS)
        ));
    }
    summary
}

/// Render the first search results in provider order
pub fn format_search(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for '{}'. Try a broader term.", query);
    }

    let mut text = format!("## arXiv Research Papers for: {}\n\n", query);
    for (i, r) in results.iter().take(DIGEST_LIMIT).enumerate() {
        text.push_str(&format!(
            "**{}. {}**\n\n{}\n\n🔗 {}\n\n",
            i + 1,
            r.title,
            truncate_chars(&r.snippet, SNIPPET_CHARS),
            r.url
        ));
    }
    text.push_str("---\n*Search performed using Tavily academic engine.*");
    text
}

/// Prefix of at most `max` characters, never splitting a code point
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
