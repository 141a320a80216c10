//! wikilink-bot — Binary Entrypoint
//! Wires config, the wiki lookup matcher, and the Reddit stream into the
//! engine. With trailing arguments it instead looks one item up directly
//! and prints the rendered reply, for manual verification.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wikilink_bot::config;
use wikilink_bot::dedup::SeenStore;
use wikilink_bot::engine::Engine;
use wikilink_bot::format;
use wikilink_bot::lookup::{self, ItemLookupHandler, ITEM_PATTERN};
use wikilink_bot::matcher::Matcher;
use wikilink_bot::reddit::RedditClient;
use wikilink_bot::wiki::WikiClient;

#[derive(Parser)]
#[command(name = "wikilink-bot")]
#[command(about = "Replies to [[item]] references with wiki item stats", long_about = None)]
struct Cli {
    /// Item name to look up directly; prints the reply without posting
    #[arg(trailing_var_arg = true)]
    item: Vec<String>,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wikilink_bot=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent. This supplies
    // REDDIT_ACCESS_TOKEN and the BOT_* overrides.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_default()?;
    let wiki = WikiClient::new(&cfg.wiki_base_url);

    // Direct-invocation mode: look the item up, print, exit.
    if !cli.item.is_empty() {
        let query = cli.item.join(" ");
        let record = lookup::find_item(&wiki, &query).await?;
        println!("{}", format::render(&record));
        return Ok(());
    }

    if cfg.debug {
        tracing::info!("debug mode enabled, replies are logged instead of posted");
    }

    let seen = SeenStore::new(&cfg.cache_path, cfg.seen_capacity);
    let mut engine = Engine::new(cfg.clone(), seen);
    engine.register_matcher(Matcher::new(
        "item_matcher",
        ITEM_PATTERN,
        Box::new(ItemLookupHandler::new(wiki)),
    )?);

    let reddit = RedditClient::new(&cfg);
    let mut stream = reddit.comment_stream(&cfg);
    engine.run(&mut stream, &reddit).await
}
