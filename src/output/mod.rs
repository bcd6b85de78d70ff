//! Output module for harvested articles and run reports
//!
//! This module handles:
//! - The `ArticleSink` trait every destination implements
//! - JSON-lines and URL-list writers
//! - Run reports printed to stderr or written as markdown

mod jsonl;
mod markdown;
mod report;
mod traits;

pub use jsonl::{write_url_list, JsonLinesSink};
pub use markdown::{format_markdown_report, write_markdown_report};
pub use report::{format_report, print_report, ArticleFailure, RunReport};
pub use traits::{ArticleSink, SinkError, SinkResult};
