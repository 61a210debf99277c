use regex::{Regex, RegexBuilder};

/// Characters of context kept on each side of a match.
pub const WINDOW: usize = 50;

/// Marker added to a snippet side that was cut short.
pub const ELLIPSIS: &str = "...";

/// Case-insensitive, literal matcher for a single search query.
///
/// Build it once per search and reuse it across every candidate paste.
#[derive(Debug, Clone)]
pub struct SnippetMatcher {
    pattern: Regex,
}

impl SnippetMatcher {
    /// # Errors
    /// Will return [`Err`] if the escaped query exceeds the regex size limit.
    pub fn new(query: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern })
    }

    /// Returns the excerpt around the first match in `content`, or [`None`]
    /// if the query does not occur.
    #[must_use]
    pub fn extract(&self, content: &str) -> Option<String> {
        let found = self.pattern.find(content)?;

        // windows are counted in chars, so byte offsets stay on char boundaries
        let start = content[..found.start()]
            .char_indices()
            .rev()
            .nth(WINDOW - 1)
            .map_or(0, |(idx, _)| idx);
        let end = content[found.end()..]
            .char_indices()
            .nth(WINDOW)
            .map_or(content.len(), |(idx, _)| found.end() + idx);

        let mut snippet = String::with_capacity(end - start + 2 * ELLIPSIS.len());
        if start > 0 {
            snippet.push_str(ELLIPSIS);
        }
        snippet.push_str(&content[start..end]);
        if end < content.len() {
            snippet.push_str(ELLIPSIS);
        }
        Some(snippet)
    }
}

/// One-shot form of [`SnippetMatcher::extract`].
///
/// A query that [`SnippetMatcher::new`] rejects (one past the regex size limit)
/// also yields [`None`]. Use [`SnippetMatcher`] directly to tell the two apart.
#[must_use]
pub fn extract_snippet(content: &str, query: &str) -> Option<String> {
    SnippetMatcher::new(query).ok()?.extract(content)
}
