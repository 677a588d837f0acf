//! Publication model representing a single hit from the search index.

use serde::{Deserialize, Deserializer, Serialize};

/// An author credited on a publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Display name
    pub name: String,

    /// Profile page URL, when the index knows one
    #[serde(default, alias = "profile", skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl Author {
    /// Create an author without a profile link
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_url: None,
        }
    }

    /// Attach a profile link
    pub fn with_profile(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }
}

/// A publication returned by the search endpoint
///
/// Instances are immutable once received. A whole page of them is owned by the
/// session state and replaced wholesale by the next successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Publication title
    pub title: String,

    /// Authors in credited order
    #[serde(default)]
    pub authors: Vec<Author>,

    /// Publication year
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,

    /// Abstract excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Link to the publication page
    pub link: String,

    /// Relevance score computed by the index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SearchResult {
    /// Create a result with the required fields
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            year: None,
            snippet: None,
            link: link.into(),
            score: None,
        }
    }

    /// Author names joined for display
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builder for constructing SearchResult objects
#[derive(Debug, Clone)]
pub struct SearchResultBuilder {
    result: SearchResult,
}

impl SearchResultBuilder {
    /// Create a new builder with required fields
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            result: SearchResult::new(title, link),
        }
    }

    /// Append an author
    pub fn author(mut self, author: Author) -> Self {
        self.result.authors.push(author);
        self
    }

    /// Set publication year
    pub fn year(mut self, year: i32) -> Self {
        self.result.year = Some(year);
        self
    }

    /// Set snippet
    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.result.snippet = Some(snippet.into());
        self
    }

    /// Set relevance score
    pub fn score(mut self, score: f64) -> Self {
        self.result.score = Some(score);
        self
    }

    /// Build the SearchResult
    pub fn build(self) -> SearchResult {
        self.result
    }
}

/// The index reports years as integers, as full dates (`"2021-05-03"`), or as
/// an empty string when unknown.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YearRepr {
        Number(i64),
        Text(String),
    }

    let repr = Option::<YearRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(YearRepr::Number(n)) => i32::try_from(n).ok(),
        Some(YearRepr::Text(s)) => year_from_text(&s),
        None => None,
    })
}

fn year_from_text(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|start| text[start..start + 4].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_builder() {
        let result = SearchResultBuilder::new("Climate Policy Review", "https://example.com/1")
            .author(Author::new("Jane Doe").with_profile("https://example.com/jane"))
            .author(Author::new("John Smith"))
            .year(2021)
            .snippet("A review of climate policy...")
            .score(0.42)
            .build();

        assert_eq!(result.title, "Climate Policy Review");
        assert_eq!(result.author_names(), "Jane Doe, John Smith");
        assert_eq!(result.year, Some(2021));
        assert_eq!(result.score, Some(0.42));
    }

    #[test]
    fn test_deserialize_server_shape() {
        let json = r#"{
            "title": "Deep Nets",
            "link": "https://example.com/deep",
            "authors": [{"name": "A. Author", "profile": "https://example.com/a"}, {"name": "B. Author", "profile": null}],
            "year": "2019-11-02",
            "snippet": "We study deep nets...",
            "score": 0.8123
        }"#;

        let result: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.year, Some(2019));
        assert_eq!(
            result.authors[0].profile_url.as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(result.authors[1].profile_url, None);
        assert_eq!(result.score, Some(0.8123));
    }

    #[test]
    fn test_year_variants() {
        let parse = |year: &str| -> Option<i32> {
            let json = format!(r#"{{"title": "t", "link": "l", "year": {}}}"#, year);
            serde_json::from_str::<SearchResult>(&json).unwrap().year
        };

        assert_eq!(parse("2020"), Some(2020));
        assert_eq!(parse(r#""2018""#), Some(2018));
        assert_eq!(parse(r#""May 2017""#), Some(2017));
        assert_eq!(parse(r#""""#), None);
        assert_eq!(parse("null"), None);
    }

    #[test]
    fn test_missing_optional_fields() {
        let result: SearchResult =
            serde_json::from_str(r#"{"title": "Bare", "link": "https://example.com"}"#).unwrap();
        assert!(result.authors.is_empty());
        assert_eq!(result.year, None);
        assert_eq!(result.snippet, None);
        assert_eq!(result.score, None);
    }

    #[test]
    fn test_title_and_link_are_required() {
        assert!(serde_json::from_str::<SearchResult>(r#"{"link": "https://example.com"}"#).is_err());
        assert!(serde_json::from_str::<SearchResult>(r#"{"title": "No link"}"#).is_err());
    }
}
