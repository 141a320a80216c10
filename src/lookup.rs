// src/lookup.rs
//
// The item lookup pipeline: query → search hit → article url → raw source
// → Infobox fields → projected record.

use crate::error::LookupError;
use crate::format::{self, ItemRecord};
use crate::matcher::ReplyHandler;
use crate::wiki::{self, WikiClient};

/// Bracketed item references, e.g. `[[Ice Breaker]]`.
pub const ITEM_PATTERN: &str = r"(?s)\[\[(.*?)\]\]";

const INFOBOX_SECTION: &str = "Infobox";

/// Resolve a free-text item name to a projected record.
///
/// A page without an Infobox still produces a minimal name + url record;
/// network failures and empty search results propagate to the caller.
pub async fn find_item(wiki: &WikiClient, query: &str) -> Result<ItemRecord, LookupError> {
    let hits = wiki.search(query, 1).await?;
    let hit = hits
        .first()
        .ok_or_else(|| LookupError::NoResults(query.to_string()))?;
    let url = wiki.resolve_url(hit.id).await?;
    let source = wiki.fetch_raw_source(&url).await?;

    match wiki::extract_field_block(&source, INFOBOX_SECTION) {
        Ok(fields) => Ok(format::project(query, &url, &fields)),
        Err(e) if e.is_parse() => {
            tracing::warn!(query = %query, url = %url, "no structured data on page, using name-only record");
            Ok(ItemRecord::minimal(query, &url))
        }
        Err(e) => Err(e),
    }
}

/// `ReplyHandler` that turns one captured item name into a rendered reply.
pub struct ItemLookupHandler {
    wiki: WikiClient,
}

impl ItemLookupHandler {
    pub fn new(wiki: WikiClient) -> Self {
        Self { wiki }
    }
}

#[async_trait::async_trait]
impl ReplyHandler for ItemLookupHandler {
    async fn handle(&self, capture: &str) -> anyhow::Result<String> {
        let record = find_item(&self.wiki, capture).await?;
        Ok(format::render(&record))
    }
}
