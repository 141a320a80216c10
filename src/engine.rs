// src/engine.rs
//
// The run loop: consume the comment stream in arrival order, skip already
// processed ids, dispatch the matcher registry, post replies, and persist
// dedup state on every exit path.

use anyhow::Result;

use crate::config::BotConfig;
use crate::dedup::SeenStore;
use crate::format;
use crate::matcher::{Matcher, MatcherRegistry};
use crate::stream::{Comment, CommentStream, ReplyPoster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    ShuttingDownClean,
    ShuttingDownError,
    Stopped,
}

/// Orchestrator owning the dedup store and matcher registry. Single logical
/// thread of control: one comment is fully processed before the next is
/// pulled, and an interrupt only takes effect at the loop boundary.
pub struct Engine {
    config: BotConfig,
    registry: MatcherRegistry,
    seen: SeenStore,
    state: EngineState,
}

impl Engine {
    pub fn new(config: BotConfig, seen: SeenStore) -> Self {
        Self {
            config,
            registry: MatcherRegistry::default(),
            seen,
            state: EngineState::Idle,
        }
    }

    pub fn register_matcher(&mut self, matcher: Matcher) {
        self.registry.register(matcher);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn transition(&mut self, next: EngineState) {
        tracing::debug!(from = ?self.state, to = ?next, "engine state");
        self.state = next;
    }

    /// Drive the stream until it ends, errors, or an interrupt arrives.
    /// Dedup state is persisted exactly once on every one of those paths.
    pub async fn run(
        &mut self,
        stream: &mut dyn CommentStream,
        poster: &dyn ReplyPoster,
    ) -> Result<()> {
        if self.registry.is_empty() {
            tracing::warn!("no matchers registered, stream will be consumed without effect");
        }
        if self.config.subreddits.is_empty() {
            tracing::warn!("no subreddits configured");
        }
        if !self.seen.load() {
            tracing::info!("starting with empty dedup state");
        }

        self.transition(EngineState::Running);
        let outcome = self.run_loop(stream, poster).await;
        match &outcome {
            Ok(()) => self.transition(EngineState::ShuttingDownClean),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "engine loop aborted");
                self.transition(EngineState::ShuttingDownError);
            }
        }

        if let Err(e) = self.seen.persist() {
            tracing::warn!(error = %format!("{e:#}"), "failed to persist dedup state");
        }
        self.transition(EngineState::Stopped);
        outcome
    }

    async fn run_loop(
        &mut self,
        stream: &mut dyn CommentStream,
        poster: &dyn ReplyPoster,
    ) -> Result<()> {
        // Registered once so a signal arriving mid-event is still observed
        // at the next iteration boundary.
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        loop {
            tokio::select! {
                _ = &mut interrupt => {
                    tracing::info!("interrupt received, shutting down");
                    return Ok(());
                }
                next = stream.next_comment() => match next? {
                    Some(comment) => self.process_comment(&comment, poster).await,
                    None => {
                        tracing::info!("comment stream ended");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handle one comment. The id is recorded before any reply is attempted
    /// so a failing or crashing downstream step never causes reprocessing;
    /// any error inside is contained here and logged with the permalink.
    async fn process_comment(&mut self, comment: &Comment, poster: &dyn ReplyPoster) {
        if self.seen.contains(&comment.id) {
            return;
        }
        self.seen.record(comment.id.clone());

        if let Err(e) = self.reply_to_matches(comment, poster).await {
            tracing::error!(
                permalink = %comment.permalink,
                error = %format!("{e:#}"),
                "failed to process comment"
            );
        }
    }

    async fn reply_to_matches(&self, comment: &Comment, poster: &dyn ReplyPoster) -> Result<()> {
        for outcome in self.registry.dispatch_all(&comment.body).await {
            let Some(text) = outcome.reply else { continue };
            let text = if self.config.author.is_empty() {
                text
            } else {
                format::append_signature(&text, &self.config.author, &self.config.source_link)
            };

            if self.config.debug {
                tracing::info!(
                    matcher = %outcome.matcher,
                    capture = %outcome.capture,
                    "debug mode, reply suppressed:\n{text}"
                );
            } else {
                poster.post_reply(&comment.id, &text).await?;
                tracing::info!(
                    matcher = %outcome.matcher,
                    permalink = %comment.permalink,
                    "posted reply"
                );
            }
        }
        Ok(())
    }
}
