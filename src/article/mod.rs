//! The article data model
//!
//! An [`Article`] is created as a stub holding only its URL, then promoted
//! exactly once to either complete (with [`ArticleContent`]) or failed (with an
//! error annotation).

mod record;
mod state;

pub use record::{Article, ArticleContent, InvalidArticle};
pub use state::ArticleStatus;
