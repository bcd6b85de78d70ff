use super::{SitemapNode, SITEMAP_NAMESPACE};
use quick_xml::escape::escape;

/// Encodes a sitemap node as a protocol 0.9 document
///
/// Index nodes become `<sitemapindex>` with one `<sitemap>` per URL, leaf
/// nodes become `<urlset>` with one `<url>` per URL. Only `<loc>` is written.
/// The output always decodes back to an equal node.
pub fn encode(node: &SitemapNode) -> String {
    let (root, entry) = match node {
        SitemapNode::Index(_) => ("sitemapindex", "sitemap"),
        SitemapNode::Leaf(_) => ("urlset", "url"),
    };

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<{} xmlns=\"{}\">\n", root, SITEMAP_NAMESPACE));

    for url in node.urls() {
        xml.push_str(&format!(
            "  <{entry}><loc>{}</loc></{entry}>\n",
            escape(url.as_str()),
            entry = entry
        ));
    }

    xml.push_str(&format!("</{}>\n", root));
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::decode;
    use url::Url;

    #[test]
    fn test_encode_index() {
        let node = SitemapNode::Index(vec![Url::parse("https://example.com/a.xml").unwrap()]);
        let xml = encode(&node);
        assert!(xml.contains("<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<sitemap><loc>https://example.com/a.xml</loc></sitemap>"));
    }

    #[test]
    fn test_encode_escapes_ampersands() {
        let node = SitemapNode::Leaf(vec![Url::parse("https://example.com/?a=1&b=2").unwrap()]);
        let xml = encode(&node);
        assert!(xml.contains("https://example.com/?a=1&amp;b=2"));
    }

    #[test]
    fn test_encoded_documents_decode_back() {
        let leaf = SitemapNode::Leaf(vec![
            Url::parse("https://example.com/news/1").unwrap(),
            Url::parse("https://example.com/news/2?ref=a&b=<c>").unwrap(),
        ]);
        let index = SitemapNode::Index(vec![
            Url::parse("https://example.com/s1.xml").unwrap(),
            Url::parse("https://example.com/s2.xml").unwrap(),
        ]);

        for node in [leaf, index] {
            let decoded = decode(encode(&node).as_bytes()).unwrap();
            assert_eq!(decoded.node, node);
            assert!(decoded.dropped.is_empty());
        }
    }

    #[test]
    fn test_empty_node_encodes_to_empty_root() {
        let xml = encode(&SitemapNode::Leaf(vec![]));
        let decoded = decode(xml.as_bytes()).unwrap();
        assert!(decoded.node.is_empty());
    }
}
