// src/matcher.rs
//
// A Matcher pairs a capture pattern with a handler that turns one capture
// into reply text. Handler failures are contained here: a misbehaving
// lookup path yields "no reply" for that match and nothing else.

use anyhow::{Context, Result};
use regex::Regex;

/// Turns one captured reference into reply text.
#[async_trait::async_trait]
pub trait ReplyHandler: Send + Sync {
    async fn handle(&self, capture: &str) -> Result<String>;
}

/// Named `(pattern, handler)` pair. Immutable once registered.
pub struct Matcher {
    name: String,
    pattern: Regex,
    handler: Box<dyn ReplyHandler>,
}

impl Matcher {
    pub fn new(name: &str, pattern: &str, handler: Box<dyn ReplyHandler>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("compiling pattern for matcher `{name}`"))?;
        Ok(Self {
            name: name.to_string(),
            pattern,
            handler,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All captures in left-to-right order; the first capture group of each
    /// match, or the whole match for group-less patterns. May be empty.
    pub fn extract(&self, body: &str) -> Vec<String> {
        self.pattern
            .captures_iter(body)
            .filter_map(|c| c.get(1).or_else(|| c.get(0)))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Invoke the handler for one capture. Any handler error is logged with
    /// this matcher's name and converted to `None`.
    pub async fn safe_invoke(&self, capture: &str) -> Option<String> {
        match self.handler.handle(capture).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(matcher = %self.name, capture = %capture, error = %format!("{e:#}"), "handler failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Outcome of applying one matcher to one capture.
#[derive(Debug)]
pub struct Dispatch {
    pub matcher: String,
    pub capture: String,
    pub reply: Option<String>,
}

/// Ordered collection of matchers applied to every incoming comment body.
/// Dispatch order is registration order. Read-only after startup.
#[derive(Debug, Default)]
pub struct MatcherRegistry {
    matchers: Vec<Matcher>,
}

impl MatcherRegistry {
    pub fn register(&mut self, matcher: Matcher) {
        tracing::info!(matcher = %matcher.name(), "registered matcher");
        self.matchers.push(matcher);
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Apply every registered matcher to one body. Matchers without captures
    /// contribute nothing; failed handler invocations appear with
    /// `reply: None`.
    pub async fn dispatch_all(&self, body: &str) -> Vec<Dispatch> {
        let mut out = Vec::new();
        for m in &self.matchers {
            for capture in m.extract(body) {
                let reply = m.safe_invoke(&capture).await;
                out.push(Dispatch {
                    matcher: m.name().to_string(),
                    capture,
                    reply,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Echo;
    #[async_trait::async_trait]
    impl ReplyHandler for Echo {
        async fn handle(&self, capture: &str) -> Result<String> {
            Ok(format!("echo:{capture}"))
        }
    }

    struct AlwaysFails;
    #[async_trait::async_trait]
    impl ReplyHandler for AlwaysFails {
        async fn handle(&self, _capture: &str) -> Result<String> {
            bail!("simulated handler crash")
        }
    }

    fn item_matcher(name: &str, handler: Box<dyn ReplyHandler>) -> Matcher {
        Matcher::new(name, r"(?s)\[\[(.*?)\]\]", handler).unwrap()
    }

    #[test]
    fn extract_yields_captures_left_to_right() {
        let m = item_matcher("items", Box::new(Echo));
        let caps = m.extract("check out [[Thorn]] and [[Ice Breaker]]");
        assert_eq!(caps, vec!["Thorn".to_string(), "Ice Breaker".to_string()]);
    }

    #[test]
    fn extract_on_plain_text_is_empty() {
        let m = item_matcher("items", Box::new(Echo));
        assert!(m.extract("nothing bracketed here").is_empty());
    }

    #[test]
    fn bad_pattern_is_a_construction_error() {
        assert!(Matcher::new("broken", r"[[unclosed", Box::new(Echo)).is_err());
    }

    #[tokio::test]
    async fn safe_invoke_contains_handler_errors() {
        let m = item_matcher("crashy", Box::new(AlwaysFails));
        assert_eq!(m.safe_invoke("Thorn").await, None);
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_siblings() {
        let mut reg = MatcherRegistry::default();
        reg.register(item_matcher("crashy", Box::new(AlwaysFails)));
        reg.register(item_matcher("items", Box::new(Echo)));

        let out = reg.dispatch_all("see [[Thorn]]").await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].matcher, "crashy");
        assert!(out[0].reply.is_none());
        assert_eq!(out[1].matcher, "items");
        assert_eq!(out[1].reply.as_deref(), Some("echo:Thorn"));
    }

    #[tokio::test]
    async fn dispatch_preserves_registration_order() {
        let mut reg = MatcherRegistry::default();
        reg.register(item_matcher("first", Box::new(Echo)));
        reg.register(item_matcher("second", Box::new(Echo)));

        let out = reg.dispatch_all("[[A]] [[B]]").await;
        let names: Vec<&str> = out.iter().map(|d| d.matcher.as_str()).collect();
        assert_eq!(names, vec!["first", "first", "second", "second"]);
    }
}
