//! Run reports
//!
//! This module defines the end-of-run summary and prints it for operators.

use crate::resolver::ResolveReport;
use std::fmt::{self, Write};
use std::time::Duration;

/// One article that could not be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFailure {
    pub url: String,
    pub reason: String,
}

/// Summary of one harvesting run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Article URLs the resolver emitted
    pub discovered: usize,

    /// Articles extracted successfully
    pub extracted: usize,

    /// Articles whose extraction failed
    pub failed: usize,

    /// One entry per failed article
    pub failures: Vec<ArticleFailure>,

    /// The sitemap walk's own report
    pub resolve: ResolveReport,

    pub elapsed: Duration,

    /// True if the run was stopped by the shutdown signal
    pub cancelled: bool,
}

impl RunReport {
    /// Articles handed to the sink, complete or failed
    pub fn settled(&self) -> usize {
        self.extracted + self.failed
    }

    /// Share of work that failed
    ///
    /// Skipped sitemap subtrees count as failures on top of failed articles:
    /// `(failed + skipped) / (discovered + skipped)`.
    pub fn failure_ratio(&self) -> f64 {
        let skipped = self.resolve.skipped.len();
        let total = self.discovered + skipped;
        if total == 0 {
            return 0.0;
        }
        (self.failed + skipped) as f64 / total as f64
    }

    /// Returns the success rate as a percentage of discovered articles
    pub fn success_rate(&self) -> f64 {
        if self.discovered == 0 {
            return 0.0;
        }
        (self.extracted as f64 / self.discovered as f64) * 100.0
    }

    /// Returns true if the failure ratio is above `max_ratio`
    pub fn exceeds_failure_ratio(&self, max_ratio: f64) -> bool {
        self.failure_ratio() > max_ratio
    }
}

/// Prints a run report to stderr in a formatted manner
pub fn print_report(report: &RunReport) {
    eprint!("{}", format_report(report));
}

/// Renders the plain-text run report, listing every skipped sitemap and
/// failed article
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &RunReport) -> fmt::Result {
    writeln!(out, "=== Harvest Report ===\n")?;

    writeln!(out, "Sitemaps:")?;
    writeln!(out, "  Root: {}", report.resolve.root)?;
    writeln!(out, "  Visited: {}", report.resolve.sitemaps_visited)?;
    writeln!(out, "  Skipped: {}", report.resolve.skipped.len())?;
    writeln!(out, "  Malformed entries dropped: {}", report.resolve.malformed_entries)?;
    writeln!(out, "  Duplicate URLs dropped: {}", report.resolve.duplicates_dropped)?;
    writeln!(out)?;

    writeln!(out, "Articles:")?;
    writeln!(out, "  Discovered: {}", report.discovered)?;
    writeln!(out, "  Extracted: {}", report.extracted)?;
    writeln!(out, "  Failed: {}", report.failed)?;
    writeln!(out)?;

    if !report.resolve.skipped.is_empty() {
        writeln!(out, "Skipped Sitemaps ({}):", report.resolve.skipped.len())?;
        for failure in &report.resolve.skipped {
            writeln!(out, "  - {} (depth {}): {}", failure.url, failure.depth, failure.reason)?;
        }
        writeln!(out)?;
    }

    if !report.failures.is_empty() {
        writeln!(out, "Failed Articles ({}):", report.failures.len())?;
        for failure in &report.failures {
            writeln!(out, "  - {}: {}", failure.url, failure.reason)?;
        }
        writeln!(out)?;
    }

    if report.cancelled {
        writeln!(
            out,
            "Run was cancelled; {} sitemap(s) abandoned.",
            report.resolve.abandoned.len()
        )?;
    }

    writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} articles) in {:.1}s, failure ratio {:.3}",
        report.success_rate(),
        report.extracted,
        report.discovered,
        report.elapsed.as_secs_f64(),
        report.failure_ratio()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use crate::resolver::{BranchError, PartialFailure};

    fn skipped(url: &str) -> PartialFailure {
        PartialFailure {
            url: url.to_string(),
            depth: 1,
            reason: BranchError::Fetch(FetchError::Fatal {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            }),
        }
    }

    #[test]
    fn test_empty_report_ratio_is_zero() {
        let report = RunReport::default();
        assert_eq!(report.failure_ratio(), 0.0);
        assert_eq!(report.success_rate(), 0.0);
        assert!(!report.exceeds_failure_ratio(0.0));
    }

    #[test]
    fn test_failure_ratio_counts_articles() {
        let report = RunReport {
            discovered: 10,
            extracted: 8,
            failed: 2,
            ..RunReport::default()
        };
        assert!((report.failure_ratio() - 0.2).abs() < 1e-9);
        assert!((report.success_rate() - 80.0).abs() < 0.01);
        assert!(report.exceeds_failure_ratio(0.1));
        assert!(!report.exceeds_failure_ratio(0.25));
    }

    #[test]
    fn test_failure_ratio_counts_skipped_sitemaps() {
        let mut report = RunReport {
            discovered: 6,
            extracted: 6,
            ..RunReport::default()
        };
        report.resolve.skipped = vec![skipped("https://example.com/s1.xml"), skipped("https://example.com/s2.xml")];

        assert!((report.failure_ratio() - 0.25).abs() < 1e-9);
        assert_eq!(report.settled(), 6);
    }

    #[test]
    fn test_format_report_lists_every_failure() {
        let mut report = RunReport {
            discovered: 30,
            extracted: 5,
            failed: 25,
            failures: (0..25)
                .map(|i| ArticleFailure {
                    url: format!("https://example.com/{}", i),
                    reason: "HTTP 503".to_string(),
                })
                .collect(),
            ..RunReport::default()
        };
        report.resolve.skipped.push(skipped("https://example.com/s.xml"));

        let text = format_report(&report);

        assert!(text.contains("Failed Articles (25):"));
        assert!(text.contains("  - https://example.com/0: HTTP 503"));
        assert!(text.contains("  - https://example.com/24: HTTP 503"));
        assert!(!text.contains("more"));
        assert!(text.contains("  - https://example.com/s.xml (depth 1):"));
    }
}
