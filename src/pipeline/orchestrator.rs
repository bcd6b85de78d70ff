use crate::article::Article;
use crate::config::{validate, Config};
use crate::extract::{Extractor, HtmlMetaExtractor};
use crate::fetcher::{Fetcher, HttpFetcher, RetryPolicy};
use crate::output::{ArticleFailure, ArticleSink, RunReport};
use crate::resolver::{ArticleStream, Resolver};
use crate::shutdown::Shutdown;
use crate::HarvestError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use url::Url;

/// Drives resolver → extractor → sink for one root sitemap
///
/// Extraction runs on a pool of at most `concurrency` tasks. Articles reach
/// the sink in completion order.
pub struct Pipeline {
    resolver: Resolver,
    extractor: Arc<dyn Extractor>,
    concurrency: usize,
}

impl Pipeline {
    /// Creates a pipeline sharing the resolver's shutdown signal
    pub fn new(resolver: Resolver, extractor: Arc<dyn Extractor>, concurrency: usize) -> Self {
        Self {
            resolver,
            extractor,
            concurrency: concurrency.max(1),
        }
    }

    /// Builds the default HTTP pipeline described by `config`
    ///
    /// The resolver and the [`HtmlMetaExtractor`] share one HTTP client.
    /// Only the resolver observes `shutdown`; the extractor keeps its own
    /// signal so articles already being fetched still finish.
    pub fn from_config(config: &Config, shutdown: Shutdown) -> Result<Self, HarvestError> {
        validate(config)?;

        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::from_config(&config.user_agent)?);
        let resolver =
            Resolver::new(Arc::clone(&fetcher), &config.resolver).with_shutdown(shutdown);
        let extractor = Arc::new(HtmlMetaExtractor::new(
            fetcher,
            RetryPolicy::from_config(&config.resolver),
        ));

        Ok(Self::new(resolver, extractor, config.extractor.concurrency))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn shutdown(&self) -> &Shutdown {
        self.resolver.shutdown()
    }

    /// Harvests every article below `root` into `sink`
    ///
    /// # Cancellation
    ///
    /// When the shutdown signal fires no new extraction is started, the ones
    /// already running finish and reach the sink, and the report is returned
    /// with `cancelled` set.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run finished or was cancelled
    /// * `Err(HarvestError)` - The root could not be resolved or the sink failed
    pub async fn run<S>(&self, root: &str, sink: &mut S) -> Result<RunReport, HarvestError>
    where
        S: ArticleSink + ?Sized,
    {
        let started = Instant::now();
        let shutdown = self.shutdown().clone();
        let mut stream = self.resolver.resolve(root).await?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<Article> = JoinSet::new();
        let mut report = RunReport::default();

        tracing::info!(
            "Extracting articles from {} with {} workers",
            root,
            self.concurrency
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => {
                    tracing::info!(
                        "Shutdown requested; waiting for {} in-flight extraction(s)",
                        tasks.len()
                    );
                    break;
                }
                Some(joined) = tasks.join_next() => {
                    settle(joined, sink, &mut report)?;
                }
                admitted = admit(&semaphore, &mut stream) => {
                    match admitted? {
                        Some((permit, url)) => {
                            report.discovered += 1;
                            tasks.spawn(extract_one(Arc::clone(&self.extractor), url, permit));
                        }
                        None => break,
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            settle(joined, sink, &mut report)?;
        }

        report.resolve = stream.finish().await;
        sink.finish()?;
        report.cancelled = shutdown.is_triggered() || report.resolve.cancelled;
        report.elapsed = started.elapsed();

        tracing::info!(
            "Harvest finished: {} discovered, {} extracted, {} failed in {:.1}s",
            report.discovered,
            report.extracted,
            report.failed,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }
}

/// Waits for a free worker slot, then for the next URL
async fn admit(
    semaphore: &Arc<Semaphore>,
    stream: &mut ArticleStream,
) -> Result<Option<(OwnedSemaphorePermit, Url)>, HarvestError> {
    let permit = Arc::clone(semaphore)
        .acquire_owned()
        .await
        .map_err(|_| HarvestError::PoolClosed)?;
    Ok(stream.next().await.map(|url| (permit, url)))
}

/// Extracts one article; the permit is held until the article is finished
async fn extract_one(
    extractor: Arc<dyn Extractor>,
    url: Url,
    _permit: OwnedSemaphorePermit,
) -> Article {
    let stub = Article::stub(&url);

    match AssertUnwindSafe(extractor.extract(&url)).catch_unwind().await {
        Ok(Ok(content)) => {
            tracing::debug!("Extracted {}", url);
            stub.complete(content)
        }
        Ok(Err(e)) => {
            tracing::debug!("Extraction failed for {}: {}", url, e);
            stub.fail(e.to_string())
        }
        Err(panic) => {
            let reason = format!("extractor panicked: {}", panic_message(panic.as_ref()));
            tracing::warn!("{} ({})", reason, url);
            stub.fail(reason)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Counts a finished article and hands it to the sink
fn settle<S>(
    joined: Result<Article, JoinError>,
    sink: &mut S,
    report: &mut RunReport,
) -> Result<(), HarvestError>
where
    S: ArticleSink + ?Sized,
{
    let article = joined.map_err(|e| {
        tracing::error!("Extraction worker ended abnormally: {}", e);
        HarvestError::PoolClosed
    })?;

    if article.is_complete() {
        report.extracted += 1;
    } else {
        report.failed += 1;
        report.failures.push(ArticleFailure {
            url: article.url().to_string(),
            reason: article.error().unwrap_or_default().to_string(),
        });
    }

    sink.accept(article)?;
    Ok(())
}
