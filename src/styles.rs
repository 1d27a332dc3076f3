//! Style discovery: explicit lists, style files, listing-page scraping and
//! storefront product search
//!
//! Every path here is best effort. Failures are logged and turned into an
//! empty [`StyleSet`]; the orchestrator decides whether that is fatal.

use crate::error::ResolutionError;
use crate::models::{StyleCode, StyleSet};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

lazy_static! {
    /// SanMar style codes look like K420, PC61, L223, JST81, LOG105
    static ref STYLE_RE: Regex = Regex::new(r"\b[A-Z]{1,5}\d{2,5}\b").expect("valid style regex");
    static ref SEPARATOR_RE: Regex = Regex::new(r"[,\s]+").expect("valid separator regex");
}

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// Attributes some storefronts use to tag product tiles
const STYLE_ATTRIBUTES: [&str; 4] = ["data-style", "data-sku", "data-productid", "data-style-id"];

/// Marker text of the storefront's bot-block page
const REJECTED_MARKER: &str = "Request Rejected";

const STOREFRONT_ORIGIN: &str = "https://www.sanmar.com";
const SEARCH_PAGE_SIZE: u32 = 24;

/// A text query against the storefront's product search endpoint
#[derive(Debug, Clone, Copy)]
pub struct ProductSearch<'a> {
    pub text: &'a str,
    pub endpoint: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    text: &'a str,
    current_page: u32,
    page_size: u32,
    sort: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<SearchProduct>>,
    #[serde(default)]
    products: Option<Vec<SearchProduct>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchProduct {
    #[serde(default)]
    style_number: Option<String>,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl SearchProduct {
    fn style_code(self) -> Option<StyleCode> {
        [self.style_number, self.style, self.code]
            .into_iter()
            .flatten()
            .find_map(|value| StyleCode::new(&value))
    }
}

/// Resolve the style set for a run.
///
/// Precedence: explicit list, then styles file, then listing URL, then
/// product search. Only the last two touch the network.
pub fn resolve(
    explicit: Option<&str>,
    styles_file: Option<&Path>,
    listing_url: Option<&str>,
    search: Option<ProductSearch<'_>>,
    timeout: Duration,
) -> StyleSet {
    if let Some(text) = explicit {
        let styles = parse_styles_from_text(text);
        log::info!("Using {} style(s) from the command line", styles.len());
        return styles;
    }

    if let Some(path) = styles_file {
        return match read_styles_from_file(path) {
            Ok(styles) => {
                log::info!("Read {} style(s) from {}", styles.len(), path.display());
                styles
            }
            Err(e) => {
                log::warn!("{}", e);
                StyleSet::new()
            }
        };
    }

    if let Some(url) = listing_url {
        return match fetch_styles_from_url(url, timeout) {
            Ok(styles) => {
                if styles.is_empty() {
                    log::warn!("No style codes found on {}", url);
                } else {
                    log::info!("Scraped {} style(s) from {}", styles.len(), url);
                }
                styles
            }
            Err(e) => {
                log::warn!("{}", e);
                StyleSet::new()
            }
        };
    }

    if let Some(search) = search {
        return match search_styles(search.text, search.endpoint, timeout) {
            Ok(styles) => {
                if styles.is_empty() {
                    log::warn!("Product search for {:?} found no styles", search.text);
                } else {
                    log::info!("Found {} style(s) searching for {:?}", styles.len(), search.text);
                }
                styles
            }
            Err(e) => {
                log::warn!("{}", e);
                StyleSet::new()
            }
        };
    }

    StyleSet::new()
}

/// Split free text on commas and whitespace into normalized codes
pub fn parse_styles_from_text(text: &str) -> StyleSet {
    SEPARATOR_RE
        .split(text)
        .filter_map(StyleCode::new)
        .collect()
}

/// Read a styles file: codes separated by commas/whitespace, `#` comment lines
pub fn read_styles_from_file(path: &Path) -> Result<StyleSet, ResolutionError> {
    let content = std::fs::read_to_string(path).map_err(|source| ResolutionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut styles = StyleSet::new();
    for line in content.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        styles.extend(SEPARATOR_RE.split(line).filter_map(StyleCode::new));
    }
    Ok(styles)
}

/// Fetch a category/search page and extract style codes from it.
///
/// Single GET, no retries. Blocked or failed requests come back as errors
/// which [`resolve`] downgrades to warnings.
pub fn fetch_styles_from_url(url: &str, timeout: Duration) -> Result<StyleSet, ResolutionError> {
    log::info!("Fetching listing page: {}", url);

    let network = |source| ResolutionError::Network {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(network)?;

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .map_err(network)?;

    if !response.status().is_success() {
        return Err(ResolutionError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let body = response.text().map_err(network)?;
    if body.contains(REJECTED_MARKER) {
        return Err(ResolutionError::Rejected {
            url: url.to_string(),
        });
    }

    Ok(extract_styles_from_html(&body))
}

/// Ask the storefront's product search for `text` and collect the style
/// numbers of the first result page.
pub fn search_styles(
    text: &str,
    endpoint: &str,
    timeout: Duration,
) -> Result<StyleSet, ResolutionError> {
    log::info!("Searching products for {:?} at {}", text, endpoint);

    let network = |source| ResolutionError::Network {
        url: endpoint.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(network)?;

    let referer = reqwest::Url::parse_with_params(
        &format!("{STOREFRONT_ORIGIN}/search/"),
        &[("text", text)],
    )
    .map(String::from)
    .unwrap_or_else(|_| STOREFRONT_ORIGIN.to_string());

    let response = client
        .post(endpoint)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "application/json, text/plain, */*")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("X-Requested-With", "XMLHttpRequest")
        .header("Origin", STOREFRONT_ORIGIN)
        .header("Referer", referer)
        .json(&SearchRequest {
            text,
            current_page: 0,
            page_size: SEARCH_PAGE_SIZE,
            sort: "relevance",
        })
        .send()
        .map_err(network)?;

    if !response.status().is_success() {
        return Err(ResolutionError::HttpStatus {
            url: endpoint.to_string(),
            status: response.status(),
        });
    }

    let body = response.text().map_err(network)?;
    parse_search_results(&body).map_err(|source| ResolutionError::SearchFormat {
        url: endpoint.to_string(),
        source,
    })
}

/// Style codes from a product search payload, in result order.
///
/// Products are read from `results`, or `products` when `results` is
/// missing or empty. Each contributes its `styleNumber`, falling back to
/// `style` and then `code`.
pub fn parse_search_results(body: &str) -> Result<StyleSet, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let products = match response.results {
        Some(results) if !results.is_empty() => results,
        _ => response.products.unwrap_or_default(),
    };

    Ok(products
        .into_iter()
        .filter_map(SearchProduct::style_code)
        .collect())
}

/// Pull style-looking tokens out of a listing page.
///
/// Looks at product data attributes first, then link targets, then visible
/// text of links and common text containers.
pub fn extract_styles_from_html(html: &str) -> StyleSet {
    let document = Html::parse_document(html);
    let mut styles = StyleSet::new();

    for attr in STYLE_ATTRIBUTES {
        let Some(sel) = selector(&format!("[{attr}]")) else {
            continue;
        };
        for element in document.select(&sel) {
            if let Some(value) = element.value().attr(attr) {
                collect_matches(value, &mut styles);
            }
        }
    }

    if let Some(sel) = selector("a[href]") {
        for element in document.select(&sel) {
            if let Some(href) = element.value().attr("href") {
                collect_matches(href, &mut styles);
            }
        }
    }

    if let Some(sel) = selector("a, div, span, p") {
        for element in document.select(&sel) {
            let text = element.text().collect::<Vec<_>>().join(" ");
            collect_matches(&text, &mut styles);
        }
    }

    styles
}

fn collect_matches(value: &str, styles: &mut StyleSet) {
    let upper = value.to_uppercase();
    styles.extend(
        STYLE_RE
            .find_iter(&upper)
            .filter_map(|m| StyleCode::new(m.as_str())),
    );
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            log::warn!("Invalid selector {:?}: {}", css, e);
            None
        }
    }
}

#[cfg(test)]
#[path = "styles_tests.rs"]
mod tests;
