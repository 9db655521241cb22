use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::oneshot;
use url::Url;

use podcast_feed_loader::{CachePolicy, CallbackQueue, LoaderConfig, Podcast, PodcastFeedLoader};

#[derive(Parser, Debug)]
#[command(
    name = "podcast-feed-loader",
    about = "Fetch a podcast feed and show its channel metadata"
)]
struct Args {
    /// Feed URL (RSS or Atom)
    url: Url,

    /// Loader config file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ignore cached responses and always hit the network
    #[arg(long)]
    reload: bool,

    /// Print the podcast as JSON
    #[arg(long)]
    json: bool,
}

fn print_podcast(podcast: &Podcast) {
    println!("Title:       {}", podcast.title);
    println!("Author:      {}", podcast.author);
    println!("Artwork:     {}", podcast.artwork_url);
    if let Some(genre) = &podcast.primary_genre {
        println!("Genre:       {}", genre);
    }
    if !podcast.description.is_empty() {
        println!();
        println!("{}", podcast.description);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LoaderConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LoaderConfig::default(),
    };
    if args.reload {
        config.cache_policy = CachePolicy::ReloadIgnoringCacheData;
    }

    let (callbacks, _callback_thread) =
        CallbackQueue::spawn("feed-callbacks").context("Failed to start callback thread")?;
    let loader =
        PodcastFeedLoader::new(&config, callbacks).context("Failed to create feed loader")?;

    let (tx, rx) = oneshot::channel();
    loader.fetch(args.url.clone(), move |result| {
        let _ = tx.send(result);
    });

    let result = rx.await.context("Feed loader dropped the result")?;

    let podcast = result.with_context(|| format!("Failed to load {}", args.url))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&podcast)?);
    } else {
        print_podcast(&podcast);
    }

    Ok(())
}
