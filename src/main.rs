use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use newsline::app::{App, FeedResult};
use newsline::config::Config;
use newsline::feed::validate_date_key;
use newsline::render;

#[derive(Parser, Debug)]
#[command(
    name = "newsline",
    version,
    about = "Command-line RSS reader with a per-day news cache"
)]
struct Args {
    /// RSS URL
    source: Option<String>,

    /// Print result as JSON in stdout
    #[arg(long)]
    json: bool,

    /// Output verbose status messages
    #[arg(long)]
    verbose: bool,

    /// Limit news topics if this parameter provided
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Print cached news for specified date (YYYYMMDD)
    #[arg(long, value_name = "DATE")]
    date: Option<String>,

    /// Convert news to HTML and save to specified directory
    #[arg(long, value_name = "DIR")]
    to_html: Option<PathBuf>,
}

/// Config file path (~/.config/newsline/config.toml), when HOME is known.
fn config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("newsline")
            .join("config.toml")
    })
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("newsline=debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    // Logs go to stderr; stdout carries only rendered news.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Renders one result according to the output flags: JSON when asked, HTML
/// to a file when asked, plain text otherwise. `--limit` truncates what is
/// shown, never what is cached.
fn emit(args: &Args, result: &FeedResult) -> Result<()> {
    let shown = match args.limit {
        Some(n) => &result.items[..n.min(result.items.len())],
        None => &result.items[..],
    };

    if args.json {
        println!("{}", render::format_json(shown)?);
    }
    if let Some(dir) = &args.to_html {
        let path = render::write_html_file(dir, &result.file_stem, shown, &result.title)?;
        println!("Saved HTML to: {}", path.display());
    } else if !args.json {
        print!("{}", render::format_feed(shown, &result.title));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.source.is_none() && args.date.is_none() {
        bail!("nothing to do: provide an RSS URL, or --date to replay cached news");
    }

    if let Some(date) = &args.date {
        validate_date_key(date)?;
    }

    let config = match config_path() {
        Some(path) => Config::load(&path).context("Failed to load configuration")?,
        None => {
            tracing::debug!("HOME not set, using default configuration");
            Config::default()
        }
    };

    let app = App::new(config)?;

    match (&args.source, &args.date) {
        (Some(source), None) => {
            let result = app.fetch_and_cache(source).await?;
            emit(&args, &result)?;
        }
        (Some(source), Some(date)) => {
            // Refresh the cache when the network cooperates; the replay below
            // is the actual deliverable and decides success.
            if let Err(e) = app.fetch_and_cache(source).await {
                tracing::warn!(error = %e, "Fetch failed, replaying cache only");
            }
            let result = app.replay_source(source, date)?;
            emit(&args, &result)?;
        }
        (None, Some(date)) => {
            for result in app.replay_all(date)? {
                emit(&args, &result)?;
            }
        }
        (None, None) => unreachable!("guarded above"),
    }

    Ok(())
}
