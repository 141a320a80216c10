// src/error.rs
use thiserror::Error;

/// Failure modes of the wiki lookup path.
///
/// `Parse` is deliberately separate from `Remote`: a page that exists but
/// carries no structured block still allows a minimal name-only reply,
/// while a network failure produces no reply at all.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network or API failure; no structured data was obtained.
    #[error("wiki request failed: {0}")]
    Remote(String),

    /// The search endpoint returned no hits for the query.
    #[error("no search results for `{0}`")]
    NoResults(String),

    /// The page source carries no matching double-brace section.
    #[error("no `{{{{{0}}}}}` block found in page source")]
    Parse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        Self::Remote(e.to_string())
    }
}

impl LookupError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
