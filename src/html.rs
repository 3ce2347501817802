//! Small helpers over `scraper` shared by the adapters and extractors.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{Result, SearchError};

/// Parses a CSS selector, mapping failures to [`SearchError::Parse`].
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector {css:?}: {e:?}")))
}

/// Returns the trimmed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Returns all text of a document, concatenated.
pub(crate) fn page_text(document: &Html) -> String {
    document.root_element().text().collect()
}

/// One anchor from a result listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListingEntry {
    /// Position among the first anchors matching the selector, counting
    /// skipped ones.
    pub rank: usize,
    pub title: String,
    /// Absolute link target.
    pub url: String,
}

/// Collects the first `limit` anchors matching `css` from the listing at
/// `page_url`.
///
/// Anchors without text or with an unusable `href` are skipped after the
/// limit is applied, so `rank` keeps their position.
pub(crate) fn listing(
    html: &str,
    page_url: &str,
    css: &str,
    limit: usize,
) -> Result<Vec<ListingEntry>> {
    let document = Html::parse_document(html);
    let anchors = selector(css)?;

    Ok(document
        .select(&anchors)
        .take(limit)
        .enumerate()
        .filter_map(|(rank, a)| {
            let href = a.value().attr("href")?.trim();
            let title = text_of(a);
            if href.is_empty() || title.is_empty() {
                return None;
            }
            let url = resolve_url(page_url, href).ok()?;
            Some(ListingEntry { rank, title, url })
        })
        .collect())
}

/// Resolves `href` against `base`.
pub(crate) fn resolve_url(base: &str, href: &str) -> Result<String> {
    Ok(Url::parse(base)?.join(href)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_invalid() {
        assert!(matches!(selector("h1[["), Err(SearchError::Parse(_))));
        assert!(selector("article h2.post-title a").is_ok());
    }

    fn entry(rank: usize, title: &str, url: &str) -> ListingEntry {
        ListingEntry {
            rank,
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_listing_limits_before_skipping_empty() {
        let html = r#"
            <h2 class="title"><a href="https://a.example/1">One</a></h2>
            <h2 class="title"><a href="">Empty href</a></h2>
            <h2 class="title"><a href="https://a.example/2">  </a></h2>
            <h2 class="title"><a href="https://a.example/3"> Three </a></h2>
            <h2 class="title"><a href="https://a.example/4">Four</a></h2>
        "#;
        let entries = listing(html, "https://a.example/?s=x", "h2.title a", 4).unwrap();
        assert_eq!(
            entries,
            vec![
                entry(0, "One", "https://a.example/1"),
                entry(3, "Three", "https://a.example/3"),
            ]
        );

        let entries = listing(html, "https://a.example/?s=x", "h2.title a", 2).unwrap();
        assert_eq!(entries, vec![entry(0, "One", "https://a.example/1")]);
    }

    #[test]
    fn test_listing_resolves_relative_links() {
        let html = r#"<h2 class="title"><a href="/hollow-knight/">Hollow Knight</a></h2>"#;
        let entries = listing(html, "https://a.example/?s=hollow", "h2.title a", 3).unwrap();
        assert_eq!(
            entries,
            vec![entry(0, "Hollow Knight", "https://a.example/hollow-knight/")]
        );
    }

    #[test]
    fn test_page_text() {
        let document = Html::parse_document("<html><body><p>Repack</p><p>Download</p></body></html>");
        let text = page_text(&document);
        assert!(text.contains("Repack"));
        assert!(text.contains("Download"));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://game3rb.com/some-game/", "/dl/1").unwrap(),
            "https://game3rb.com/dl/1"
        );
        assert_eq!(
            resolve_url("https://game3rb.com/", "https://other.example/x").unwrap(),
            "https://other.example/x"
        );
        assert!(matches!(
            resolve_url("not a base", "relative"),
            Err(SearchError::UrlParse(_))
        ));
    }
}
