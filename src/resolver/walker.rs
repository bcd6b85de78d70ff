use super::dedup::DedupSet;
use super::report::{BranchError, PartialFailure, ResolveReport};
use crate::fetcher::{fetch_with_retry, FetchError, Fetcher, RetryPolicy};
use crate::shutdown::Shutdown;
use crate::sitemap::{decode, DecodedSitemap, SitemapNode};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Everything one sitemap visit needs, owned so visits can run concurrently
#[derive(Clone)]
pub(super) struct VisitContext {
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) policy: RetryPolicy,
    pub(super) shutdown: Shutdown,
}

impl VisitContext {
    async fn visit(self, url: Url) -> (Url, Result<DecodedSitemap, BranchError>) {
        let result =
            match fetch_with_retry(self.fetcher.as_ref(), &url, &self.policy, &self.shutdown).await
            {
                Ok(body) => decode(&body).map_err(BranchError::from),
                Err(e) => Err(e.into()),
            };
        (url, result)
    }
}

/// Breadth-first walk below an already decoded root
pub(super) struct Walker {
    ctx: VisitContext,
    fan_out: usize,
    sitemaps: DedupSet,
    articles: DedupSet,
    tx: mpsc::Sender<Url>,
    closed: bool,
    report: ResolveReport,
}

impl Walker {
    pub(super) fn new(
        ctx: VisitContext,
        fan_out: usize,
        tx: mpsc::Sender<Url>,
        report: ResolveReport,
    ) -> Self {
        Self {
            ctx,
            fan_out: fan_out.max(1),
            sitemaps: DedupSet::new(),
            articles: DedupSet::new(),
            tx,
            closed: false,
            report,
        }
    }

    /// Walks the tree level by level and returns the final report
    ///
    /// Sitemaps on the same level are fetched concurrently, at most `fan_out`
    /// at a time. A failed sitemap is recorded and its subtree skipped; the
    /// rest of the walk carries on.
    pub(super) async fn run(mut self, root: Url, root_doc: DecodedSitemap) -> ResolveReport {
        self.sitemaps.insert(&root);
        self.report.sitemaps_visited = 1;

        let mut level = self.absorb(root_doc).await;
        let mut depth = 1usize;

        while !level.is_empty() {
            if self.should_stop() {
                self.abandon(level.iter().map(Url::to_string));
                break;
            }

            tracing::debug!(
                "Visiting {} sitemap(s) at depth {} (fan-out {})",
                level.len(),
                depth,
                self.fan_out
            );

            let mut outstanding: HashSet<String> = level.iter().map(Url::to_string).collect();
            let ctx = self.ctx.clone();
            let mut visits = stream::iter(level)
                .map(move |url| ctx.clone().visit(url))
                .buffer_unordered(self.fan_out);

            let mut next = Vec::new();
            while let Some((url, result)) = visits.next().await {
                outstanding.remove(url.as_str());

                match result {
                    Ok(doc) => {
                        self.report.sitemaps_visited += 1;
                        next.extend(self.absorb(doc).await);
                    }
                    Err(BranchError::Fetch(FetchError::Cancelled { .. })) => {
                        self.report.abandoned.push(url.to_string());
                    }
                    Err(reason) => {
                        tracing::warn!(url = %url, depth, error = %reason, "skipping sitemap subtree");
                        self.report.skipped.push(PartialFailure {
                            url: url.to_string(),
                            depth,
                            reason,
                        });
                    }
                }

                if self.closed {
                    break;
                }
            }

            if !outstanding.is_empty() {
                self.abandon(outstanding);
            }

            level = next;
            depth += 1;
        }

        self.report.cancelled = self.ctx.shutdown.is_triggered();
        tracing::info!(
            "Sitemap walk finished: {} sitemaps, {} articles, {} duplicates, {} skipped",
            self.report.sitemaps_visited,
            self.report.articles_emitted,
            self.report.duplicates_dropped,
            self.report.skipped.len()
        );
        self.report
    }

    /// Emits a leaf's articles or returns an index's unvisited children
    async fn absorb(&mut self, doc: DecodedSitemap) -> Vec<Url> {
        self.report.malformed_entries += doc.dropped.len();

        match doc.node {
            SitemapNode::Index(children) => {
                let mut fresh = Vec::with_capacity(children.len());
                for child in children {
                    if self.sitemaps.insert(&child) {
                        fresh.push(child);
                    } else {
                        tracing::debug!("Sitemap {} already visited", child);
                    }
                }
                fresh
            }
            SitemapNode::Leaf(urls) => {
                for url in urls {
                    if self.should_stop() {
                        break;
                    }
                    if !self.articles.insert(&url) {
                        self.report.duplicates_dropped += 1;
                        continue;
                    }
                    if self.tx.send(url).await.is_err() {
                        self.closed = true;
                        break;
                    }
                    self.report.articles_emitted += 1;
                }
                Vec::new()
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.closed || self.ctx.shutdown.is_triggered()
    }

    fn abandon(&mut self, urls: impl IntoIterator<Item = String>) {
        let mut urls: Vec<String> = urls.into_iter().collect();
        urls.sort();
        self.report.abandoned.extend(urls);
    }
}
