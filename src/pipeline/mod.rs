//! Pipeline orchestration
//!
//! Connects the sitemap resolver, the extraction pool and an article sink
//! into a single cancellable run.

mod orchestrator;

pub use orchestrator::Pipeline;
