//! Best-effort metadata extraction for confirmed candidate pages.
//!
//! Every field is optional; a page that cannot be fetched or parsed simply
//! yields an empty [`Metadata`].

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fetcher::PageFetcher;
use crate::html::{resolve_url, selector, text_of};
use crate::SourceId;

static SIZE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"Size:\s*([0-9.]+\s+(?:GB|MB))",
        r"Total Size:\s*([0-9.]+\s+(?:GB|MB))",
        r"Repack Size:\s*([0-9.]+\s+(?:GB|MB))",
        r"Download Size:\s*([0-9.]+\s+(?:GB|MB))",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});
static BARE_SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9.]+\s+(?:GB|MB))").unwrap());
static RELEASE_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Release Date:\s*([\w ,]+)").unwrap());
static ONCLICK_MAGNET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(magnet:\?xt=urn:btih:[^"']+)"#).unwrap());
static MAGNET_HASH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"btih:(?:[0-9a-fA-F]{40}|[0-9a-zA-Z]{32})(?:&|$)").unwrap()
});

/// A labelled download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    /// Link text, or "Download" when the anchor has none.
    pub label: String,
    /// Absolute link target.
    pub url: String,
}

/// Details pulled from a candidate's page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Download size, e.g. "12.5 GB".
    pub size: Option<String>,
    /// System requirements block.
    pub requirements: Option<String>,
    /// Languages block.
    pub languages: Option<String>,
    /// Release date as written on the page.
    pub release_date: Option<String>,
    /// Validated magnet links.
    pub magnet_links: Vec<String>,
    /// Direct download links.
    pub download_links: Vec<DownloadLink>,
}

/// Fetches and extracts [`Metadata`] for candidate URLs.
pub struct MetadataExtractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl MetadataExtractor {
    /// Creates an extractor using the given fetcher.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetches `url` once and extracts what the source's pages offer.
    pub async fn fetch_metadata(&self, url: &str, source: SourceId) -> Metadata {
        let Some(html) = self.page(url).await else {
            return Metadata::default();
        };

        let metadata = match source {
            SourceId::FitGirl => extract_metadata(&html),
            SourceId::Dodi => Metadata {
                size: extract_size(&html),
                ..Default::default()
            },
            SourceId::Game3rb => Metadata {
                download_links: extract_download_links(&html, url),
                ..Default::default()
            },
        };
        debug!("Metadata for {}: {:?}", url, metadata);
        metadata
    }

    /// Fetches `url` and extracts only its download size.
    pub async fn fetch_size(&self, url: &str) -> Option<String> {
        extract_size(&self.page(url).await?)
    }

    async fn page(&self, url: &str) -> Option<String> {
        match self.fetcher.get_html(url).await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Metadata fetch failed for {}: {}", url, e);
                None
            }
        }
    }
}

/// Extracts the full metadata set from a repack page.
pub fn extract_metadata(html: &str) -> Metadata {
    let document = Html::parse_document(html);
    let text = block_text(&document);

    Metadata {
        size: size_from(&document, &text),
        requirements: labelled_block(&document, "System Requirements"),
        languages: labelled_block(&document, "Languages"),
        release_date: RELEASE_DATE_PATTERN
            .captures(&text)
            .map(|c| c[1].trim().to_string())
            .filter(|d| !d.is_empty()),
        magnet_links: extract_magnet_links(html)
            .into_iter()
            .filter(|m| is_valid_magnet(m))
            .collect(),
        download_links: Vec::new(),
    }
}

/// Extracts the download size from any catalog page.
pub fn extract_size(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    size_from(&document, &block_text(&document))
}

fn size_from(document: &Html, text: &str) -> Option<String> {
    let labelled = SIZE_PATTERNS
        .iter()
        .find_map(|p| p.captures(text).map(|c| c[1].to_string()));
    if labelled.is_some() {
        return labelled;
    }

    // Fall back to bold "Size" labels whose value sits next to them.
    let strong = selector("strong").ok()?;
    document
        .select(&strong)
        .filter(|s| text_of(*s).contains("Size"))
        .filter_map(parent_text)
        .find_map(|t| BARE_SIZE_PATTERN.captures(&t).map(|c| c[1].to_string()))
}

fn labelled_block(document: &Html, label: &str) -> Option<String> {
    let strong = selector("strong").ok()?;
    document
        .select(&strong)
        .find(|s| text_of(*s).contains(label))
        .and_then(parent_text)
}

fn parent_text(element: ElementRef<'_>) -> Option<String> {
    let parent = element.parent().and_then(ElementRef::wrap)?;
    let text = text_of(parent);
    (!text.is_empty()).then_some(text)
}

/// Text nodes joined by newlines, so adjacent blocks don't run together.
fn block_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collects magnet links from anchors, falling back to `onclick` handlers and
/// clipboard attributes when no anchor carries one. Links are not validated.
pub fn extract_magnet_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(anchors) = selector("a[href]") {
        links.extend(
            document
                .select(&anchors)
                .filter_map(|a| a.value().attr("href"))
                .filter(|href| href.starts_with("magnet:") && href.contains("&tr=") && href.contains("btih:"))
                .map(str::to_string),
        );
    }
    if !links.is_empty() {
        return links;
    }

    if let Ok(handlers) = selector("[onclick]") {
        links.extend(
            document
                .select(&handlers)
                .filter_map(|e| e.value().attr("onclick"))
                .filter_map(|js| ONCLICK_MAGNET_PATTERN.captures(js).map(|c| c[1].to_string())),
        );
    }
    if let Ok(clipboard) = selector("[data-clipboard-text]") {
        links.extend(
            document
                .select(&clipboard)
                .filter_map(|e| e.value().attr("data-clipboard-text"))
                .filter(|text| text.contains("magnet:"))
                .map(str::to_string),
        );
    }
    links
}

/// Returns true for `magnet:?xt=urn:btih:<hash>&...` links that name a
/// tracker or display name and carry a 40-hex or 32-character hash.
pub fn is_valid_magnet(link: &str) -> bool {
    link.contains("xt=urn:btih:")
        && (link.contains("&tr=") || link.contains("&dn="))
        && MAGNET_HASH_PATTERN.is_match(link)
}

/// Collects download links from buttons, download boxes and anchors whose
/// text mentions downloading. Relative links are resolved against `page_url`.
pub fn extract_download_links(html: &str, page_url: &str) -> Vec<DownloadLink> {
    let document = Html::parse_document(html);
    let groups = [
        "a.dl-button, a.download-button, a.btn-download",
        "div.download-links a, div.download-box a, div.dl-box a",
    ];

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut push = |anchor: ElementRef<'_>| {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            return;
        };
        if href.is_empty() || href.starts_with('#') {
            return;
        }
        let Ok(url) = resolve_url(page_url, href) else {
            return;
        };
        if seen.insert(url.clone()) {
            let label = text_of(anchor);
            links.push(DownloadLink {
                label: if label.is_empty() { "Download".to_string() } else { label },
                url,
            });
        }
    };

    for css in groups {
        match selector(css) {
            Ok(sel) => document.select(&sel).for_each(&mut push),
            Err(e) => warn!("{}", e),
        }
    }
    if let Ok(anchors) = selector("a") {
        document
            .select(&anchors)
            .filter(|a| {
                let text = text_of(*a).to_lowercase();
                text.contains("download") || text.contains("direct link")
            })
            .for_each(&mut push);
    }

    links
}
