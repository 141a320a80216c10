// src/stream.rs
//
// Interface to the social platform. The engine only ever sees these two
// traits plus `Comment`; the concrete Reddit client lives in `reddit.rs`
// and tests substitute scripted mocks.

use anyhow::Result;

/// One externally-sourced comment to be scanned for item references.
/// Owned by the platform; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub permalink: String,
}

/// A live, ordered comment stream. `Ok(None)` means the stream ended.
#[async_trait::async_trait]
pub trait CommentStream: Send {
    async fn next_comment(&mut self) -> Result<Option<Comment>>;
}

/// Capability to post a reply under a comment.
#[async_trait::async_trait]
pub trait ReplyPoster: Send + Sync {
    async fn post_reply(&self, comment_id: &str, text: &str) -> Result<()>;
}
