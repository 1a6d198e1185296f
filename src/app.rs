use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::feed::{fetch, parse_feed, partition_by_date};
use crate::storage::{reconcile, CacheError, CacheStore, NewsItem};
use crate::util::{parse_source_url, source_host};

/// A finalized pipeline result handed to the renderers.
#[derive(Debug)]
pub struct FeedResult {
    /// Ordered, deduplicated, field-complete items.
    pub items: Vec<NewsItem>,
    /// Feed title for human-readable output; partition name in replay mode.
    pub title: String,
    /// Stem for generated output files (`<host>` or `<host>_<date>`).
    pub file_stem: String,
}

/// Pipeline coordinator: owns the HTTP client and the cache store and wires
/// them through one invocation. Components receive their collaborators
/// explicitly — there is no ambient global state beyond `tracing`.
pub struct App {
    client: reqwest::Client,
    store: CacheStore,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            store: CacheStore::new(&config.cache_dir),
        })
    }

    /// Direct store access, used by offline replay and tests.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Fetch-and-cache mode: retrieve the feed, normalize it, merge every
    /// date partition of the batch into the store, and return the batch for
    /// rendering.
    ///
    /// The returned items are the freshly fetched batch in feed order — what
    /// the user asked to see — while the cache receives the merged union.
    pub async fn fetch_and_cache(&self, source: &str) -> Result<FeedResult> {
        let url = parse_source_url(source).context("Failed to read source URL")?;
        let host = source_host(&url);

        let bytes = fetch(&self.client, source)
            .await
            .with_context(|| format!("Failed to get news from '{}'", source))?;
        let content = String::from_utf8_lossy(&bytes);

        let parsed = parse_feed(&content)
            .with_context(|| format!("Source '{}' did not yield a readable feed", source))?;
        if parsed.skipped > 0 {
            tracing::warn!(skipped = parsed.skipped, "Some feed items were missing title or link");
        }

        let title = if parsed.title.is_empty() {
            host.clone()
        } else {
            parsed.title.clone()
        };

        let items = parsed.items;
        self.cache_batch(&host, items.clone())
            .context("Failed to reconcile news into the cache")?;

        Ok(FeedResult {
            items,
            title,
            file_stem: host,
        })
    }

    /// Offline replay of one source's partition for a date. Here a missing
    /// partition is fatal — there is nothing else to show.
    pub fn replay_source(&self, source: &str, date_key: &str) -> Result<FeedResult> {
        let url = parse_source_url(source).context("Failed to read source URL")?;
        let host = source_host(&url);
        let stem = format!("{}_{}", host, date_key);

        let items = self
            .store
            .load(&host, date_key)
            .with_context(|| format!("There is no readable cached news for '{}'", stem))?;

        Ok(FeedResult {
            items,
            title: stem.clone(),
            file_stem: stem,
        })
    }

    /// Offline replay across every cached source. Sources without a
    /// partition for the date are skipped; no partition anywhere is an error.
    pub fn replay_all(&self, date_key: &str) -> Result<Vec<FeedResult>> {
        let mut results = Vec::new();
        for host in self.store.hosts().context("Failed to list cached sources")? {
            if !self.store.exists(&host, date_key) {
                continue;
            }
            let stem = format!("{}_{}", host, date_key);
            let items = self
                .store
                .load(&host, date_key)
                .with_context(|| format!("Cached news for '{}' is unreadable", stem))?;
            results.push(FeedResult {
                items,
                title: stem.clone(),
                file_stem: stem,
            });
        }

        if results.is_empty() {
            bail!("No cached news for '{}' date", date_key);
        }
        Ok(results)
    }

    /// Partitions a batch by canonical date and merges each partition into
    /// the store. A corrupt existing partition aborts before anything is
    /// written — overwriting it would lose history and re-duplicate items on
    /// the next merge.
    fn cache_batch(&self, host: &str, items: Vec<NewsItem>) -> Result<()> {
        if items.is_empty() {
            tracing::debug!(host, "Empty batch, nothing to cache");
            return Ok(());
        }

        for (date_key, fresh) in partition_by_date(items)? {
            let existing = match self.store.load(host, &date_key) {
                Ok(existing) => existing,
                Err(CacheError::NotFound(_)) => Vec::new(),
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Refusing to overwrite partition '{}_{}'", host, date_key)
                    })
                }
            };

            let merged = reconcile(fresh, existing);
            if merged.should_persist {
                self.store.save(host, &date_key, &merged.items)?;
            } else {
                tracing::info!(host, date = %date_key, "No new news");
            }
        }
        Ok(())
    }
}
