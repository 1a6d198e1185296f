use crate::storage::NewsItem;

/// Outcome of merging a freshly parsed batch against a stored partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Final ordered, duplicate-free union. Newest first, matching the feed
    /// convention.
    pub items: Vec<NewsItem>,
    /// Whether the partition must be rewritten. False means the cache already
    /// holds everything in the batch.
    pub should_persist: bool,
}

/// Merges fresh items into an existing partition.
///
/// Feeds list newest-first, so `existing[0]` is the newest item the cache
/// knows about. The fresh batch is scanned for the first item whose title
/// equals that anchor:
///
/// - anchor found at index 0: nothing new, the partition stands;
/// - anchor found at index `n > 0`: `fresh[..n]` are new, prepend them;
/// - anchor not found: the whole batch is new, prepend everything.
///
/// Matching is exact title equality. Two genuinely distinct entries that
/// share a title are indistinguishable here and collapse into one — a known
/// limitation of the title key, kept deliberately.
pub fn reconcile(fresh: Vec<NewsItem>, existing: Vec<NewsItem>) -> Reconciled {
    if existing.is_empty() {
        return Reconciled {
            items: fresh,
            should_persist: true,
        };
    }

    let anchor = &existing[0].title;
    match fresh.iter().position(|item| &item.title == anchor) {
        Some(0) => {
            tracing::debug!("no new items, partition unchanged");
            Reconciled {
                items: existing,
                should_persist: false,
            }
        }
        Some(index) => {
            tracing::debug!(new_items = index, "prepending items newer than cache head");
            let mut items: Vec<NewsItem> = fresh.into_iter().take(index).collect();
            items.extend(existing);
            Reconciled {
                items,
                should_persist: true,
            }
        }
        None => {
            tracing::debug!(new_items = fresh.len(), "no overlap with cache, whole batch is new");
            let mut items = fresh;
            items.extend(existing);
            Reconciled {
                items,
                should_persist: true,
            }
        }
    }
}
