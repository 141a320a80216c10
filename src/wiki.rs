// src/wiki.rs
//
// Thin client for the wiki content API: free-text search, article detail
// lookup, raw page source, and extraction of the semi-structured Infobox
// block. One best-effort shot per call; no retries.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::LookupError;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    basepath: String,
    items: HashMap<String, ArticleDetail>,
}

#[derive(Debug, Deserialize)]
struct ArticleDetail {
    url: String,
}

#[derive(Debug, Clone)]
pub struct WikiClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl WikiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, LookupError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }

    /// Ranked search hits for a free-text query.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, LookupError> {
        tracing::debug!(query = %query, limit, "wiki search");
        let url = format!("{}Search/List", self.base_url);
        let limit = limit.to_string();
        let body = self
            .get_text(&url, &[("query", query), ("limit", limit.as_str())])
            .await?;
        parse_search(&body)
    }

    /// Canonical content URL for an article id.
    pub async fn resolve_url(&self, id: u64) -> Result<String, LookupError> {
        tracing::debug!(id, "wiki article lookup");
        let url = format!("{}Articles/Details", self.base_url);
        let ids = id.to_string();
        let body = self.get_text(&url, &[("ids", ids.as_str())]).await?;
        parse_details(&body, id)
    }

    /// Raw markup source of a content page.
    pub async fn fetch_raw_source(&self, page_url: &str) -> Result<String, LookupError> {
        tracing::debug!(url = %page_url, "fetching page source");
        self.get_text(page_url, &[("action", "raw")]).await
    }
}

fn parse_search(body: &str) -> Result<Vec<SearchHit>, LookupError> {
    let resp: SearchResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::Remote(format!("malformed search response: {e}")))?;
    Ok(resp.items)
}

fn parse_details(body: &str, id: u64) -> Result<String, LookupError> {
    let resp: DetailsResponse = serde_json::from_str(body)
        .map_err(|e| LookupError::Remote(format!("malformed details response: {e}")))?;
    let detail = resp
        .items
        .get(&id.to_string())
        .ok_or_else(|| LookupError::Remote(format!("article {id} missing from details response")))?;
    Ok(format!("{}{}", resp.basepath, detail.url))
}

/// Extract the first `{{section ...}}` block from raw markup as a key/value
/// map. Lines look like `|key=value`; the leading marker is stripped from
/// the key if present and blank keys or values are dropped. A missing
/// section is a parse failure, distinct from any network failure.
pub fn extract_field_block(
    raw: &str,
    section: &str,
) -> Result<HashMap<String, String>, LookupError> {
    let pattern = format!(r"(?s)\{{\{{{}(.*?)\}}\}}", regex::escape(section));
    let re = Regex::new(&pattern).unwrap();
    let caps = re
        .captures(raw)
        .ok_or_else(|| LookupError::Parse(section.to_string()))?;

    let mut fields = HashMap::new();
    for line in caps[1].lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim_start_matches('|').trim();
        let value = value.trim();
        if !key.is_empty() && !value.is_empty() {
            fields.insert(key.to_string(), value.to_string());
        }
    }
    Ok(fields)
}
