//! Query-term highlighting for titles and snippets.
//!
//! [`highlight`] splits a text into alternating unmatched/matched spans for the
//! whitespace-separated terms of a query. Matching is case-insensitive and
//! literal: regex metacharacters typed by the user are escaped. Concatenating
//! the spans always reproduces the input exactly.
//!
//! ```
//! use scholar_lens::utils::highlight;
//!
//! let spans: Vec<_> = highlight("Machine Learning overview", "learning").collect();
//! assert_eq!(spans.len(), 3);
//! assert!(spans[1].matched);
//! assert_eq!(spans[1].text, "Learning");
//! ```

use regex::{Regex, RegexBuilder};

/// A contiguous slice of the highlighted text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'t> {
    pub text: &'t str,
    pub matched: bool,
}

impl<'t> Span<'t> {
    fn plain(text: &'t str) -> Self {
        Self {
            text,
            matched: false,
        }
    }

    fn marked(text: &'t str) -> Self {
        Self {
            text,
            matched: true,
        }
    }
}

/// A compiled query, reusable across many texts
///
/// Build one per render and apply it to every title and snippet.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    /// Compile `query` into a case-insensitive alternation of its terms
    pub fn new(query: &str) -> Self {
        let terms: Vec<String> = query.split_whitespace().map(regex::escape).collect();
        if terms.is_empty() {
            return Self { pattern: None };
        }

        let pattern = match RegexBuilder::new(&terms.join("|"))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Highlight pattern rejected, rendering unmarked: {}", e);
                None
            }
        };

        Self { pattern }
    }

    /// Whether the query produced any terms
    pub fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    /// Lazily segment `text`
    pub fn spans<'h, 't>(&'h self, text: &'t str) -> Spans<'h, 't> {
        Spans {
            pattern: self.pattern.as_ref(),
            cursor: Cursor::new(text),
        }
    }
}

/// Segment `text` by the terms of `query`
///
/// An empty or whitespace-only query yields the whole text as one unmatched
/// span.
pub fn highlight<'t>(text: &'t str, query: &str) -> Highlights<'t> {
    Highlights {
        pattern: Highlighter::new(query).pattern,
        cursor: Cursor::new(text),
    }
}

/// Iterator over the spans of one text, borrowing a [`Highlighter`]
#[derive(Debug)]
pub struct Spans<'h, 't> {
    pattern: Option<&'h Regex>,
    cursor: Cursor<'t>,
}

impl<'h, 't> Iterator for Spans<'h, 't> {
    type Item = Span<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.step(self.pattern)
    }
}

/// Iterator over the spans of one text, owning its compiled query
#[derive(Debug)]
pub struct Highlights<'t> {
    pattern: Option<Regex>,
    cursor: Cursor<'t>,
}

impl<'t> Iterator for Highlights<'t> {
    type Item = Span<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.step(self.pattern.as_ref())
    }
}

#[derive(Debug)]
struct Cursor<'t> {
    text: &'t str,
    pos: usize,
    pending: Option<(usize, usize)>,
    done: bool,
}

impl<'t> Cursor<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            pos: 0,
            pending: None,
            done: false,
        }
    }

    fn step(&mut self, pattern: Option<&Regex>) -> Option<Span<'t>> {
        if self.done {
            return None;
        }

        let Some(pattern) = pattern else {
            self.done = true;
            return Some(Span::plain(self.text));
        };

        // A match found while emitting the gap before it
        if let Some((start, end)) = self.pending.take() {
            self.pos = end;
            return Some(Span::marked(&self.text[start..end]));
        }

        if self.pos >= self.text.len() {
            self.done = true;
            return None;
        }

        match pattern.find_at(self.text, self.pos) {
            Some(m) if m.start() > self.pos => {
                let gap = &self.text[self.pos..m.start()];
                self.pending = Some((m.start(), m.end()));
                self.pos = m.start();
                Some(Span::plain(gap))
            }
            Some(m) => {
                self.pos = m.end();
                Some(Span::marked(m.as_str()))
            }
            None => {
                self.done = true;
                Some(Span::plain(&self.text[self.pos..]))
            }
        }
    }
}
