// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_CONFIG_PATH: &str = "BOT_CONFIG_PATH";
const ENV_DEBUG: &str = "BOT_DEBUG";
const DEFAULT_CONFIG_PATH: &str = "config/bot.toml";

/// Runtime configuration, normally read from `config/bot.toml`.
/// Every field has a default so the bot starts from an empty file.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// When set, replies are logged instead of posted.
    #[serde(default)]
    pub debug: bool,

    /// Subreddits whose comment streams are monitored.
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,

    /// Reddit username credited in the reply signature. Empty = no signature.
    #[serde(default)]
    pub author: String,

    /// Repository link shown in the reply signature.
    #[serde(default = "default_source_link")]
    pub source_link: String,

    /// Path of the persisted dedup state blob.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// How many processed comment ids are retained for deduplication.
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: usize,

    /// Base URL of the wiki content API.
    #[serde(default = "default_wiki_base_url")]
    pub wiki_base_url: String,

    /// User agent sent with every Reddit request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds between comment-listing polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_subreddits() -> Vec<String> {
    vec!["DestinyTheGame".to_string()]
}
fn default_source_link() -> String {
    "https://github.com/lumlich/wikilink-bot".to_string()
}
fn default_cache_path() -> String {
    "cache".to_string()
}
fn default_seen_capacity() -> usize {
    100
}
fn default_wiki_base_url() -> String {
    "https://destiny.fandom.com/api/v1/".to_string()
}
fn default_user_agent() -> String {
    format!("wikilink-bot/{}", env!("CARGO_PKG_VERSION"))
}
fn default_poll_interval() -> u64 {
    30
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            debug: false,
            subreddits: default_subreddits(),
            author: String::new(),
            source_link: default_source_link(),
            cache_path: default_cache_path(),
            seen_capacity: default_seen_capacity(),
            wiki_base_url: default_wiki_base_url(),
            user_agent: default_user_agent(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Load config from an explicit TOML file.
pub fn load_from(path: &Path) -> Result<BotConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let cfg: BotConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $BOT_CONFIG_PATH
/// 2) config/bot.toml
/// 3) built-in defaults
///
/// `BOT_DEBUG=1` forces debug mode regardless of the file.
pub fn load_default() -> Result<BotConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        load_from(&PathBuf::from(p))?
    } else {
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            load_from(&default)?
        } else {
            BotConfig::default()
        }
    };

    if std::env::var(ENV_DEBUG).ok().is_some_and(|v| v == "1") {
        cfg.debug = true;
    }
    Ok(cfg)
}
