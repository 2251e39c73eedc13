use crate::matcher::is_match;
use crate::model::BatchStats;
use bwscan_scanner::{Fetch, FetchOptions};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything one batch needs
pub struct BatchOptions {
    pub sites: Vec<String>,
    pub pattern: Regex,
    pub remove_comments: bool,
    pub show_progress: bool,
}

/// Called with the URL of each matching site, as soon as it matches
pub type MatchCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Fetch every site concurrently and check each page against the pattern.
///
/// All fetches are started before the first result is looked at, and results are
/// handled in the order they complete. Returns `None` when there are no sites, so
/// callers can tell "nothing to do" from "nothing matched".
pub async fn run_batch<F: Fetch>(
    fetcher: &F,
    options: BatchOptions,
    match_callback: Option<MatchCallback>,
) -> Option<BatchStats> {
    let BatchOptions {
        sites,
        pattern,
        remove_comments,
        show_progress,
    } = options;

    if sites.is_empty() {
        debug!("No sites to check, skipping batch");
        return None;
    }

    let total = sites.len();
    info!("Starting batch of {} sites", total);

    let progress_bar = show_progress.then(|| {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message("0 matched");
        pb
    });

    let fetch_options = FetchOptions {
        remove_comments,
        allow_redirects: true,
    };

    let mut in_flight: FuturesUnordered<_> = sites
        .iter()
        .map(|site| fetcher.fetch(site, fetch_options))
        .collect();

    let mut stats = BatchStats::default();
    while let Some(outcome) = in_flight.next().await {
        match outcome {
            None => stats.failed += 1,
            Some(page) => {
                stats.checked += 1;
                if is_match(&page.body, &pattern) {
                    stats.matched += 1;
                    if let Some(ref callback) = match_callback {
                        match &progress_bar {
                            Some(pb) => pb.suspend(|| callback(page.url)),
                            None => callback(page.url),
                        }
                    }
                }
            }
        }

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
            pb.set_message(format!("{} matched", stats.matched));
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    info!(
        "Batch complete: {} checked, {} failed, {} matched",
        stats.checked, stats.failed, stats.matched
    );
    Some(stats)
}
