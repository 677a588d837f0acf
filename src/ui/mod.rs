//! Terminal rendering of session state.
//!
//! Everything here is read-only: a [`Renderer`] turns [`SearchState`],
//! [`ClassifierState`] and a [`Pager`] into strings. Query matches are
//! highlighted with [`Highlighter`] spans; probabilities are laid out with
//! comfy-table.

use comfy_table::{presets, Attribute, Cell, CellAlignment, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{ClassificationResult, SearchResult, TextStats};
use crate::session::{ClassifierState, Phase, SearchState};
use crate::utils::{Highlighter, PageToken, Pager};

/// Default width when terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

/// Snippets are cut to this many columns before highlighting
const SNIPPET_WIDTH: usize = 320;

/// Cells in a full probability bar
const BAR_WIDTH: usize = 20;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Loading => "◐",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Loading,
    Search,
}

/// Renders session state for the terminal
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
    width: usize,
}

impl Renderer {
    pub fn new(color: bool, width: usize) -> Self {
        Self {
            color,
            width: width.max(20),
        }
    }

    /// Colors when stdout is a terminal, sized to it
    pub fn for_terminal() -> Self {
        Self::new(is_terminal(), terminal_width())
    }

    fn styled<F>(&self, text: &str, style: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }

    /// A status line with its icon
    pub fn status(&self, status: Status, msg: &str) -> String {
        let icon = status_icon(status);
        let icon = match status {
            Status::Success => self.styled(icon, |i| i.green().bold().to_string()),
            Status::Error => self.styled(icon, |i| i.red().bold().to_string()),
            Status::Warning => self.styled(icon, |i| i.yellow().bold().to_string()),
            Status::Info => self.styled(icon, |i| i.cyan().bold().to_string()),
            Status::Loading => self.styled(icon, |i| i.cyan().to_string()),
            Status::Search => self.styled(icon, |i| i.yellow().to_string()),
        };
        format!("{} {}", icon, msg)
    }

    /// A section header
    pub fn section(&self, title: &str) -> String {
        self.styled(&format!("━━━ {} ━━━", title), |t| t.bold().cyan().to_string())
    }

    /// Text with query matches emphasised
    pub fn highlighted(&self, text: &str, highlighter: &Highlighter) -> String {
        highlighter
            .spans(text)
            .map(|span| {
                if span.matched {
                    self.styled(span.text, |t| t.black().on_yellow().bold().to_string())
                } else {
                    span.text.to_string()
                }
            })
            .collect()
    }

    /// One search result as a numbered card
    pub fn result_card(&self, index: usize, result: &SearchResult, highlighter: &Highlighter) -> String {
        let indent = "    ";
        let inner = self.width.saturating_sub(indent.len());
        let mut lines = Vec::new();

        let title = self.highlighted(&result.title, highlighter);
        lines.push(format!(
            "{:>2}. {}",
            index,
            self.styled(&title, |t| t.bold().to_string())
        ));

        if !result.authors.is_empty() {
            let authors = truncate_with_ellipsis(&result.author_names(), inner.saturating_sub(9));
            lines.push(format!("{}Authors: {}", indent, authors));
        }

        let mut meta = Vec::new();
        if let Some(year) = result.year {
            meta.push(format!("Year: {}", year));
        }
        if let Some(score) = result.score {
            meta.push(format!("Relevance: {:.2}", score));
        }
        if !meta.is_empty() {
            let meta = meta.join(" | ");
            lines.push(format!("{}{}", indent, self.styled(&meta, |m| m.dimmed().to_string())));
        }

        if let Some(snippet) = result.snippet.as_deref().filter(|s| !s.trim().is_empty()) {
            let snippet = truncate_with_ellipsis(snippet.trim(), SNIPPET_WIDTH);
            lines.push(format!("{}{}", indent, self.highlighted(&snippet, highlighter)));
        }

        lines.push(format!(
            "{}{}",
            indent,
            self.styled(&result.link, |l| l.blue().underline().to_string())
        ));
        lines.join("\n")
    }

    /// Pager line, e.g. `‹ Prev  1 … 3 4 [5] 6 7 … 10  Next ›`
    pub fn pager(&self, pager: &Pager) -> String {
        let prev = if pager.previous_enabled {
            "‹ Prev".to_string()
        } else {
            self.styled("‹ Prev", |p| p.dimmed().to_string())
        };
        let next = if pager.next_enabled {
            "Next ›".to_string()
        } else {
            self.styled("Next ›", |n| n.dimmed().to_string())
        };

        let pages: Vec<String> = pager
            .window
            .iter()
            .map(|token| match token {
                PageToken::Page(n) if *n == pager.current => {
                    self.styled(&format!("[{}]", n), |c| c.cyan().bold().to_string())
                }
                PageToken::Page(n) => n.to_string(),
                PageToken::Ellipsis => "…".to_string(),
            })
            .collect();

        format!("{}  {}  {}", prev, pages.join(" "), next)
    }

    /// The whole search section
    pub fn search_view(&self, state: &SearchState, pager: &Pager) -> String {
        let mut out = Vec::new();
        let query = state.submitted().map(|q| q.as_str()).unwrap_or_default();

        match state.phase() {
            Phase::Idle => {
                out.push(self.status(Status::Info, "Enter a query to search publications."));
            }
            Phase::Loading => {
                let page = state.requested_page().unwrap_or(1);
                out.push(self.status(
                    Status::Loading,
                    &format!("Searching for \"{}\" (page {})...", query, page),
                ));
            }
            Phase::Failure => {
                let message = state.error().unwrap_or_default();
                out.push(self.status(Status::Error, &self.styled(message, |m| m.red().to_string())));
            }
            Phase::Success if state.results().is_empty() => {
                out.push(self.status(Status::Warning, &format!("No results found for \"{}\".", query)));
            }
            Phase::Success => {
                out.push(self.status(
                    Status::Search,
                    &format!(
                        "Results for \"{}\" (page {} of {})",
                        query,
                        pager.current,
                        pager.total
                    ),
                ));
            }
        }

        // results stay on screen while the next page loads
        if !state.results().is_empty() {
            let highlighter = Highlighter::new(query);
            for (i, result) in state.results().iter().enumerate() {
                out.push(String::new());
                out.push(self.result_card(i + 1, result, &highlighter));
            }
            if pager.is_visible() {
                out.push(String::new());
                out.push(self.pager(pager));
            }
        }

        out.join("\n")
    }

    /// Probability table for a successful classification, or its error
    pub fn classification(&self, result: &ClassificationResult) -> String {
        if let Some(message) = &result.error_message {
            return self.status(Status::Error, &self.styled(message, |m| m.red().to_string()));
        }

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(self.width.min(u16::MAX as usize) as u16)
            .set_header(vec!["Category", "Probability", ""]);
        if self.color {
            table.enforce_styling();
        } else {
            table.force_no_tty();
        }

        for (label, probability) in result.ranked() {
            let label_cell = if label == result.prediction {
                Cell::new(label).add_attribute(Attribute::Bold)
            } else {
                Cell::new(label)
            };
            table.add_row(vec![
                label_cell,
                Cell::new(format_percentage(probability)).set_alignment(CellAlignment::Right),
                Cell::new(probability_bar(probability)),
            ]);
        }

        let prediction = self.styled(&result.prediction, |p| p.green().bold().to_string());
        format!("Prediction: {}\n{}", prediction, table)
    }

    /// The whole classifier section
    pub fn classifier_view(&self, state: &ClassifierState) -> String {
        let mut out = vec![self.styled(&stats_line(state.stats()), |s| s.dimmed().to_string())];

        match (state.phase(), state.result()) {
            (Phase::Loading, _) => out.push(self.status(Status::Loading, "Classifying...")),
            (_, Some(result)) => out.push(self.classification(result)),
            (_, None) if state.text().trim().is_empty() => {
                out.push(self.status(Status::Info, "Enter text to classify."))
            }
            (_, None) => {}
        }

        out.join("\n")
    }
}

/// `Characters: n | Words: m`
pub fn stats_line(stats: TextStats) -> String {
    format!("Characters: {} | Words: {}", stats.chars, stats.words)
}

/// Probability as a percentage with two decimals
pub fn format_percentage(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Horizontal bar proportional to `probability`
pub fn probability_bar(probability: f64) -> String {
    let filled = (probability.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated.trim_end())
}

/// Loading spinner shown while a one-shot request is in flight
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .map(|style| style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "))
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner on a terminal, nothing otherwise
    pub fn when_terminal(enabled: bool, msg: &str) -> Option<Self> {
        (enabled && std::io::stderr().is_terminal()).then(|| Self::new(msg))
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.finish_with_message(format!("✓ {}", msg));
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.finish_with_message(format!("✗ {}", msg));
    }

    /// Remove the spinner from the terminal.
    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
