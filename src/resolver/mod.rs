//! Sitemap resolver
//!
//! Walks a sitemap hierarchy (index → index → ... → leaf) starting from a root
//! URL and streams the deduplicated article URLs found in the leaves.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_harvester::config::ResolverConfig;
//! use sitemap_harvester::fetcher::HttpFetcher;
//! use sitemap_harvester::Resolver;
//! use std::sync::Arc;
//!
//! # async fn run() -> sitemap_harvester::Result<()> {
//! let fetcher = Arc::new(HttpFetcher::from_config(&Default::default())?);
//! let resolver = Resolver::new(fetcher, &ResolverConfig::default());
//!
//! let mut stream = resolver.resolve("https://example.com/sitemap_index.xml").await?;
//! while let Some(url) = stream.next().await {
//!     println!("{}", url);
//! }
//! let report = stream.finish().await;
//! println!("{} sitemaps visited", report.sitemaps_visited);
//! # Ok(())
//! # }
//! ```

mod dedup;
mod report;
mod walker;

pub use dedup::DedupSet;
pub use report::{BranchError, PartialFailure, ResolveReport};

use crate::config::ResolverConfig;
use crate::fetcher::{fetch_with_retry, Fetcher, RetryPolicy};
use crate::shutdown::Shutdown;
use crate::sitemap::decode;
use crate::url::parse_absolute_url;
use crate::HarvestError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;
use walker::{VisitContext, Walker};

/// Article URLs buffered between the walk and its consumer
const ARTICLE_BUFFER: usize = 1024;

/// Resolves a root sitemap into a stream of article URLs
pub struct Resolver {
    fetcher: Arc<dyn Fetcher>,
    policy: RetryPolicy,
    fan_out: usize,
    shutdown: Shutdown,
}

impl Resolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &ResolverConfig) -> Self {
        Self::with_policy(fetcher, RetryPolicy::from_config(config), config.fan_out)
    }

    pub fn with_policy(fetcher: Arc<dyn Fetcher>, policy: RetryPolicy, fan_out: usize) -> Self {
        Self {
            fetcher,
            policy,
            fan_out: fan_out.max(1),
            shutdown: Shutdown::new(),
        }
    }

    /// Uses `shutdown` to cancel walks started by this resolver
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Starts a walk from `root`
    ///
    /// The root document is fetched and decoded before this returns, so a bad
    /// root surfaces here as an error. Everything below the root is walked in
    /// a background task feeding the returned stream.
    ///
    /// # Returns
    ///
    /// * `Ok(ArticleStream)` - The lazily filled stream of article URLs
    /// * `Err(HarvestError::InvalidRoot)` - `root` is not an absolute HTTP(S) URL
    /// * `Err(HarvestError::RootFetch)` - The root could not be fetched
    /// * `Err(HarvestError::RootDecode)` - The root is not a sitemap document
    pub async fn resolve(&self, root: &str) -> Result<ArticleStream, HarvestError> {
        let root_url = parse_absolute_url(root)?;
        tracing::info!("Resolving sitemap tree from {}", root_url);

        let body = fetch_with_retry(self.fetcher.as_ref(), &root_url, &self.policy, &self.shutdown)
            .await
            .map_err(|source| HarvestError::RootFetch {
                url: root_url.to_string(),
                source,
            })?;

        let root_doc = decode(&body).map_err(|source| HarvestError::RootDecode {
            url: root_url.to_string(),
            source,
        })?;

        let (tx, receiver) = mpsc::channel(ARTICLE_BUFFER);
        let ctx = VisitContext {
            fetcher: Arc::clone(&self.fetcher),
            policy: self.policy.clone(),
            shutdown: self.shutdown.clone(),
        };
        let walker = Walker::new(ctx, self.fan_out, tx, ResolveReport::new(root_url.as_str()));
        let handle = tokio::spawn(walker.run(root_url.clone(), root_doc));

        Ok(ArticleStream {
            receiver,
            walker: handle,
            root: root_url.to_string(),
        })
    }

    /// Resolves the whole tree into memory
    pub async fn resolve_all(&self, root: &str) -> Result<(Vec<Url>, ResolveReport), HarvestError> {
        let mut stream = self.resolve(root).await?;
        let mut urls = Vec::new();
        while let Some(url) = stream.next().await {
            urls.push(url);
        }
        Ok((urls, stream.finish().await))
    }
}

/// A finite, non-restartable stream of deduplicated article URLs
pub struct ArticleStream {
    receiver: mpsc::Receiver<Url>,
    walker: JoinHandle<ResolveReport>,
    root: String,
}

impl ArticleStream {
    /// Next article URL, or `None` once the walk is over
    pub async fn next(&mut self) -> Option<Url> {
        self.receiver.recv().await
    }

    /// Closes the stream and returns the walk's report
    ///
    /// Calling this before the stream is exhausted stops the walk early; the
    /// sitemaps it did not get to are listed as abandoned.
    pub async fn finish(self) -> ResolveReport {
        let Self {
            mut receiver,
            walker,
            root,
        } = self;
        receiver.close();
        drop(receiver);

        match walker.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Sitemap walk for {} ended abnormally: {}", root, e);
                let mut report = ResolveReport::new(&root);
                report.cancelled = true;
                report
            }
        }
    }
}
