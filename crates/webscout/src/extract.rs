//! Resilient selector-driven extraction from scraped HTML.
//!
//! Upstream markup drifts without notice, so every extraction site works
//! from an *ordered list* of selector candidates held as data: try each in
//! priority order, keep the first one that produces results. Rewrites must
//! treat that fallback policy as load-bearing, not incidental.

use crate::textprep::{self, norm_ws, truncate_chars};
use scraper::{ElementRef, Html, Selector};
use url::Url;
use webscout_core::SearchResult;

/// Ordered selector candidates for one upstream's results page.
#[derive(Debug, Clone, Copy)]
pub struct ResultSelectors {
    /// Result-block containers, most specific first.
    pub containers: &'static [&'static str],
    /// Title+link element within a block.
    pub title_link: &'static [&'static str],
    /// Snippet element within a block.
    pub snippet: &'static [&'static str],
}

/// Resolved result URLs shorter than this are treated as parse noise.
const MIN_URL_LEN: usize = 10;

/// Extract search results from a results page.
///
/// Container selector groups are tried in priority order; the first group
/// that yields at least one accepted result wins and later groups are
/// skipped. Blocks without a usable title and link are dropped silently.
pub fn extract_results(
    html: &str,
    selectors: &ResultSelectors,
    origin: &Url,
    max_results: usize,
    snippet_cap: usize,
) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let mut results = Vec::new();

    for container in selectors.containers {
        let Ok(sel) = Selector::parse(container) else {
            continue;
        };
        let mut matched = 0usize;
        for block in doc.select(&sel) {
            if results.len() >= max_results {
                break;
            }
            matched += 1;
            if let Some(result) = result_from_block(block, selectors, origin, snippet_cap) {
                results.push(result);
            }
        }
        tracing::debug!(
            selector = *container,
            matched,
            accepted = results.len(),
            "result selector group"
        );
        if !results.is_empty() {
            break;
        }
    }

    results
}

fn result_from_block(
    block: ElementRef<'_>,
    selectors: &ResultSelectors,
    origin: &Url,
    snippet_cap: usize,
) -> Option<SearchResult> {
    let link = select_first_of(block, selectors.title_link)?;
    let title = norm_ws(&link.text().collect::<Vec<_>>().join(" "));
    let href = link.value().attr("href").unwrap_or("").trim();
    if title.is_empty() || href.is_empty() {
        return None;
    }

    let url = resolve_href(href, origin)?;
    if url.len() < MIN_URL_LEN {
        return None;
    }

    let snippet = select_first_of(block, selectors.snippet)
        .map(|el| norm_ws(&el.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default();
    let snippet = truncate_chars(&snippet, snippet_cap);

    let keywords = textprep::snippet_keywords(&title, &snippet);
    let summary = textprep::snippet_summary(&title, &snippet, &url);
    Some(SearchResult {
        title,
        url,
        keywords,
        summary,
    })
}

fn select_first_of<'a>(scope: ElementRef<'a>, candidates: &[&str]) -> Option<ElementRef<'a>> {
    for candidate in candidates {
        let Ok(sel) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(el) = scope.select(&sel).next() {
            return Some(el);
        }
    }
    None
}

/// Resolve protocol-relative and root-relative hrefs against the upstream's
/// origin; anything that does not land on http(s) is rejected.
fn resolve_href(href: &str, origin: &Url) -> Option<String> {
    let resolved = origin.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

pub const FALLBACK_TITLE: &str = "Untitled Document";

const TITLE_SELECTORS: &[&str] = &[
    "title",
    r#"meta[property="og:title"]"#,
    r#"meta[name="twitter:title"]"#,
    "h1",
];

/// Document title via the usual sources, or a fixed placeholder.
pub fn extract_title(doc: &Html) -> String {
    for raw in TITLE_SELECTORS {
        let Ok(sel) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            let text = if raw.starts_with("meta") {
                el.value().attr("content").unwrap_or("").to_string()
            } else {
                el.text().collect::<Vec<_>>().join(" ")
            };
            let text = norm_ws(&text);
            if !text.is_empty() {
                return text;
            }
        }
    }
    FALLBACK_TITLE.to_string()
}

const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".main-content",
    ".post-content",
    ".entry-content",
    "#content",
    "#main",
    ".container",
];

const NOISE_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];
const NOISE_CLASSES: &[&str] = &["advertisement", "ads", "sidebar"];

/// A content container must carry at least this much text to be accepted.
const MIN_CONTAINER_CHARS: usize = 100;

/// Main page text: first content container with substance, else the whole
/// body. Script/style/nav chrome and ad/sidebar blocks never contribute.
pub fn extract_main_content(doc: &Html, max_chars: usize) -> String {
    for raw in CONTENT_SELECTORS {
        let Ok(sel) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            let text = filtered_text(el);
            if text.chars().count() > MIN_CONTAINER_CHARS {
                return truncate_chars(&text, max_chars);
            }
        }
    }

    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };
    let text = doc.select(&body).next().map(filtered_text).unwrap_or_default();
    truncate_chars(&text, max_chars)
}

/// Text of a subtree with noise subtrees skipped entirely, whitespace
/// normalized.
fn filtered_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    // Explicit DFS stack; children pushed in reverse keeps document order.
    let mut stack: Vec<_> = root.children().collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
        match node.value() {
            scraper::Node::Text(t) => {
                out.push_str(t);
                out.push(' ');
            }
            scraper::Node::Element(el) => {
                if !is_noise_element(el) {
                    let mut kids: Vec<_> = node.children().collect();
                    kids.reverse();
                    stack.extend(kids);
                }
            }
            _ => {}
        }
    }
    norm_ws(&out)
}

fn is_noise_element(el: &scraper::node::Element) -> bool {
    if NOISE_TAGS.contains(&el.name()) {
        return true;
    }
    el.classes()
        .any(|c| NOISE_CLASSES.iter().any(|n| c.eq_ignore_ascii_case(n)))
}
