use crate::article::Article;
use crate::output::traits::{ArticleSink, SinkResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use url::Url;

/// Writes one JSON object per article, one article per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of articles written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> ArticleSink for JsonLinesSink<W> {
    fn accept(&mut self, article: Article) -> SinkResult<()> {
        serde_json::to_writer(&mut self.writer, &article)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes URLs one per line
pub fn write_url_list<W: Write>(writer: &mut W, urls: &[Url]) -> std::io::Result<()> {
    for url in urls {
        writeln!(writer, "{}", url)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ArticleContent, ArticleStatus};

    fn article(path: &str) -> Article {
        Article::stub(&Url::parse(&format!("https://example.com/{}", path)).unwrap())
    }

    #[test]
    fn test_one_line_per_article() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.accept(article("a").complete(ArticleContent {
            title: Some("A".to_string()),
            ..ArticleContent::default()
        }))
        .unwrap();
        sink.accept(article("b").fail("HTTP 404")).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.written(), 2);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Article = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.url(), "https://example.com/a");
        assert_eq!(first.status(), ArticleStatus::Complete);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["status"], "failed");
        assert_eq!(second["error"], "HTTP 404");
    }

    #[test]
    fn test_create_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.jsonl");

        let mut sink = JsonLinesSink::create(&path).unwrap();
        sink.accept(article("a").complete(ArticleContent::default()))
            .unwrap();
        sink.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_write_url_list() {
        let urls = vec![
            Url::parse("https://example.com/a").unwrap(),
            Url::parse("https://example.com/b").unwrap(),
        ];
        let mut out = Vec::new();
        write_url_list(&mut out, &urls).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://example.com/a\nhttps://example.com/b\n"
        );
    }
}
