//! Namespace-aware sitemap decoder
//!
//! The decoder walks the document with `quick_xml::NsReader` and only looks at
//! three levels: the root element, its entry children (`<sitemap>` or `<url>`)
//! and the `<loc>` element inside each entry. Everything else is skipped so
//! that extensions like `<lastmod>`, `<priority>` or image/news tags never
//! cause a failure.

use super::{DecodedSitemap, SitemapNode, SITEMAP_NAMESPACE};
use crate::url::parse_absolute_url;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use thiserror::Error;
use url::Url;

/// Leading bytes of a gzip stream
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Errors that can occur while decoding a sitemap document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("unrecognized sitemap schema: root element {0}")]
    UnrecognizedSchema(String),
}

/// The two root schemas of the sitemap protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schema {
    Index,
    UrlSet,
}

impl Schema {
    /// Local name of the entry elements under this root
    fn entry_tag(self) -> &'static [u8] {
        match self {
            Self::Index => b"sitemap",
            Self::UrlSet => b"url",
        }
    }
}

/// Decodes one sitemap document
///
/// # Arguments
///
/// * `bytes` - The raw document as returned by the server
///
/// # Returns
///
/// * `Ok(DecodedSitemap)` - The node plus any dropped `<loc>` values
/// * `Err(DecodeError::MalformedXml)` - The bytes are not well-formed XML
/// * `Err(DecodeError::UnrecognizedSchema)` - The root is neither
///   `<sitemapindex>` nor `<urlset>` in the sitemap namespace
///
/// # Example
///
/// ```
/// use sitemap_harvester::sitemap::{decode, SitemapNode};
///
/// let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
/// <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <sitemap><loc>https://example.com/sitemap-2024-01.xml</loc></sitemap>
/// </sitemapindex>"#;
///
/// let decoded = decode(xml).unwrap();
/// assert!(matches!(decoded.node, SitemapNode::Index(ref urls) if urls.len() == 1));
/// ```
pub fn decode(bytes: &[u8]) -> Result<DecodedSitemap, DecodeError> {
    if bytes.starts_with(GZIP_MAGIC) {
        return Err(DecodeError::MalformedXml(
            "payload is gzip-compressed; compressed sitemaps are not supported".to_string(),
        ));
    }

    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut schema: Option<Schema> = None;
    let mut root_closed = false;
    let mut depth = 0usize;
    let mut in_entry = false;
    let mut in_loc = false;
    let mut entries = 0usize;
    let mut loc = String::new();
    let mut urls = Vec::new();
    let mut dropped = Vec::new();

    loop {
        {
            let (resolved, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| DecodeError::MalformedXml(e.to_string()))?;

            match event {
                Event::Start(ref e) => {
                    if root_closed {
                        return Err(multiple_roots());
                    }
                    depth += 1;
                    let local = e.local_name();
                    let local = local.as_ref();
                    match depth {
                        1 => schema = Some(classify_root(&resolved, local)?),
                        2 => {
                            in_entry = is_entry(schema, &resolved, local);
                            if in_entry {
                                entries += 1;
                            }
                        }
                        3 => {
                            in_loc = in_entry && is_loc(&resolved, local);
                            loc.clear();
                        }
                        _ => {}
                    }
                }

                Event::Empty(ref e) => {
                    if root_closed {
                        return Err(multiple_roots());
                    }
                    let local = e.local_name();
                    let local = local.as_ref();
                    match depth {
                        0 => {
                            schema = Some(classify_root(&resolved, local)?);
                            root_closed = true;
                        }
                        1 => {
                            if is_entry(schema, &resolved, local) {
                                entries += 1;
                            }
                        }
                        2 => {
                            if in_entry && is_loc(&resolved, local) {
                                dropped.push(String::new());
                            }
                        }
                        _ => {}
                    }
                }

                Event::End(_) => {
                    match depth {
                        3 if in_loc => {
                            in_loc = false;
                            record_loc(&loc, &mut urls, &mut dropped);
                        }
                        2 => in_entry = false,
                        1 => root_closed = true,
                        _ => {}
                    }
                    // Unbalanced end tags are rejected by the reader itself
                    depth = depth.saturating_sub(1);
                }

                Event::Text(ref text) => {
                    if depth == 0 {
                        return Err(DecodeError::MalformedXml(
                            "text content outside the root element".to_string(),
                        ));
                    }
                    if in_loc {
                        let unescaped = text
                            .unescape()
                            .map_err(|e| DecodeError::MalformedXml(e.to_string()))?;
                        loc.push_str(&unescaped);
                    }
                }

                Event::CData(ref data) => {
                    if in_loc {
                        let text = std::str::from_utf8(data)
                            .map_err(|e| DecodeError::MalformedXml(e.to_string()))?;
                        loc.push_str(text);
                    }
                }

                Event::Eof => break,

                _ => {}
            }
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(DecodeError::MalformedXml(format!(
            "unexpected end of document with {} unclosed element(s)",
            depth
        )));
    }

    let schema = schema.ok_or_else(|| {
        DecodeError::MalformedXml("document has no root element".to_string())
    })?;

    let node = match schema {
        _ if entries == 0 => SitemapNode::Leaf(Vec::new()),
        Schema::Index => SitemapNode::Index(urls),
        Schema::UrlSet => SitemapNode::Leaf(urls),
    };

    tracing::trace!(
        "Decoded sitemap with {} entries, {} urls, {} dropped",
        entries,
        node.urls().len(),
        dropped.len()
    );

    Ok(DecodedSitemap { node, dropped })
}

fn in_sitemap_namespace(resolved: &ResolveResult) -> bool {
    matches!(
        resolved,
        ResolveResult::Bound(Namespace(ns)) if *ns == SITEMAP_NAMESPACE.as_bytes()
    )
}

fn classify_root(resolved: &ResolveResult, local: &[u8]) -> Result<Schema, DecodeError> {
    let schema = match local {
        b"sitemapindex" => Some(Schema::Index),
        b"urlset" => Some(Schema::UrlSet),
        _ => None,
    };

    match schema {
        Some(schema) if in_sitemap_namespace(resolved) => Ok(schema),
        _ => Err(DecodeError::UnrecognizedSchema(describe_element(
            resolved, local,
        ))),
    }
}

fn describe_element(resolved: &ResolveResult, local: &[u8]) -> String {
    let name = String::from_utf8_lossy(local);
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => {
            format!("<{}> in namespace {}", name, String::from_utf8_lossy(ns))
        }
        _ => format!("<{}> without the sitemap namespace", name),
    }
}

fn is_entry(schema: Option<Schema>, resolved: &ResolveResult, local: &[u8]) -> bool {
    schema.is_some_and(|schema| in_sitemap_namespace(resolved) && local == schema.entry_tag())
}

fn is_loc(resolved: &ResolveResult, local: &[u8]) -> bool {
    in_sitemap_namespace(resolved) && local == b"loc"
}

fn multiple_roots() -> DecodeError {
    DecodeError::MalformedXml("document has more than one root element".to_string())
}

fn record_loc(raw: &str, urls: &mut Vec<Url>, dropped: &mut Vec<String>) {
    match parse_absolute_url(raw) {
        Ok(url) => urls.push(url),
        Err(e) => {
            tracing::trace!("Dropping malformed <loc> {:?}: {}", raw, e);
            dropped.push(raw.trim().to_string());
        }
    }
}
