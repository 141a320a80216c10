// src/reddit.rs
//
// Reddit plumbing behind the `CommentStream` / `ReplyPoster` seams. Reading
// polls the public comment listing; posting goes through the OAuth comment
// endpoint with a bearer token from the environment. The listing re-delivers
// comments across polls; the engine's dedup store filters repeats.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::config::BotConfig;
use crate::stream::{Comment, CommentStream, ReplyPoster};

const ENV_ACCESS_TOKEN: &str = "REDDIT_ACCESS_TOKEN";
const LISTING_URL_BASE: &str = "https://www.reddit.com";
const OAUTH_COMMENT_URL: &str = "https://oauth.reddit.com/api/comment";
const PAGE_LIMIT: &str = "100";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: CommentData,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    permalink: String,
}

#[derive(Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    user_agent: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl RedditClient {
    pub fn new(config: &BotConfig) -> Self {
        let access_token = std::env::var(ENV_ACCESS_TOKEN).ok();
        if access_token.is_none() {
            tracing::warn!("{ENV_ACCESS_TOKEN} not set, posting will fail");
        }
        Self {
            client: reqwest::Client::new(),
            user_agent: config.user_agent.clone(),
            access_token,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn comment_stream(&self, config: &BotConfig) -> RedditCommentStream {
        RedditCommentStream {
            client: self.clone(),
            subreddits: config.subreddits.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            pending: VecDeque::new(),
            last_poll: None,
        }
    }

    async fn fetch_comment_page(&self, subreddits: &[String]) -> Result<Vec<Comment>> {
        let url = format!("{LISTING_URL_BASE}/r/{}/comments.json", subreddits.join("+"));
        let body = self
            .client
            .get(&url)
            .query(&[("limit", PAGE_LIMIT)])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .context("fetching comment listing")?
            .error_for_status()?
            .text()
            .await
            .context("reading comment listing")?;
        parse_comment_listing(&body)
    }
}

#[async_trait::async_trait]
impl ReplyPoster for RedditClient {
    async fn post_reply(&self, comment_id: &str, text: &str) -> Result<()> {
        let Some(token) = &self.access_token else {
            bail!("{ENV_ACCESS_TOKEN} is not set, cannot post replies");
        };
        let form = [
            ("api_type", "json".to_string()),
            ("thing_id", format!("t1_{comment_id}")),
            ("text", text.to_string()),
        ];
        self.client
            .post(OAUTH_COMMENT_URL)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await
            .context("posting reply")?
            .error_for_status()
            .context("reply rejected")?;
        Ok(())
    }
}

/// Polling view over the subreddits' combined comment listing. Buffers one
/// page at a time and yields comments oldest-first; poll failures are
/// logged and retried on the next tick.
pub struct RedditCommentStream {
    client: RedditClient,
    subreddits: Vec<String>,
    poll_interval: Duration,
    pending: VecDeque<Comment>,
    last_poll: Option<Instant>,
}

#[async_trait::async_trait]
impl CommentStream for RedditCommentStream {
    async fn next_comment(&mut self) -> Result<Option<Comment>> {
        loop {
            if let Some(c) = self.pending.pop_front() {
                return Ok(Some(c));
            }
            if let Some(last) = self.last_poll {
                let elapsed = last.elapsed();
                if elapsed < self.poll_interval {
                    tokio::time::sleep(self.poll_interval - elapsed).await;
                }
            }
            self.last_poll = Some(Instant::now());
            match self.client.fetch_comment_page(&self.subreddits).await {
                Ok(batch) => self.pending.extend(batch),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "comment poll failed");
                }
            }
        }
    }
}

fn parse_comment_listing(body: &str) -> Result<Vec<Comment>> {
    let listing: Listing = serde_json::from_str(body).context("parsing comment listing")?;
    let mut out: Vec<Comment> = listing
        .data
        .children
        .into_iter()
        .filter(|c| !c.data.body.is_empty())
        .map(|c| Comment {
            id: c.data.id,
            body: html_escape::decode_html_entities(&c.data.body).into_owned(),
            permalink: c.data.permalink,
        })
        .collect();
    // Listings are newest-first; the engine expects arrival order.
    out.reverse();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "kind": "Listing",
        "data": {
            "children": [
                {"kind": "t1", "data": {"id": "c2", "body": "newer &amp; loud", "permalink": "/r/x/2"}},
                {"kind": "t1", "data": {"id": "c1", "body": "older [[Thorn]]", "permalink": "/r/x/1"}},
                {"kind": "t1", "data": {"id": "c0", "body": "", "permalink": "/r/x/0"}}
            ]
        }
    }"#;

    #[test]
    fn listing_parses_oldest_first_with_decoded_bodies() {
        let comments = parse_comment_listing(FIXTURE).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[0].body, "older [[Thorn]]");
        assert_eq!(comments[1].id, "c2");
        assert_eq!(comments[1].body, "newer & loud");
    }

    #[test]
    fn bodyless_entries_are_skipped() {
        let comments = parse_comment_listing(FIXTURE).unwrap();
        assert!(comments.iter().all(|c| c.id != "c0"));
    }

    #[test]
    fn malformed_listing_is_an_error() {
        assert!(parse_comment_listing("<html>blocked</html>").is_err());
    }
}
