// Parsing of BuiltWith pages: the "websitelist" listing and the Technology Overview

use crate::model::TechnologyDetails;
use bwscan_scanner::error::{Result, ScanError};
use bwscan_scanner::{Fetch, FetchOptions};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Where BuiltWith lists the sites using a technology
pub const BUILTWITH_LISTING_BASE: &str = "https://trends.builtwith.com/websitelist/";

static CLIENT_SITE_CELL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"tr[data-domain] > td[class="pl-0 text-primary"]"#)
        .expect("static selector")
});
static BREADCRUMB_TRENDS_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"nav[aria-label="breadcrumb"] > ol > li > a[href*="//trends"]"#)
        .expect("static selector")
});
static DETAIL_PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div > * > div[class="col-9 col-md-10"] > p"#).expect("static selector")
});
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector"));
static ICON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[class="col-md-2 col-3 text-center"] > img[data-src]"#)
        .expect("static selector")
});

/// Build the listing URL for a technology name
pub fn listing_url(technology: &str) -> Result<Url> {
    listing_url_from(BUILTWITH_LISTING_BASE, technology)
}

/// Build the listing URL under an explicit base.
///
/// The listing path does not accept literal slashes, so they become spaces
/// before the name is percent-encoded as a single path segment.
pub fn listing_url_from(base: &str, technology: &str) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base, e)))?;

    let technology = technology.replace('/', " ");
    url.path_segments_mut()
        .map_err(|_| ScanError::InvalidUrl(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .push(&technology);

    Ok(url)
}

/// Turn `site.com` or `//site.com` into `https://site.com`.
///
/// URLs that already carry a scheme come back unchanged, so applying this twice
/// gives the same result as applying it once.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if has_scheme(raw) {
        return raw.to_string();
    }
    format!("https://{}", raw.trim_start_matches('/'))
}

fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Text nodes directly under an element, skipping text of nested elements
fn own_text<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
}

/// Parse the listing page and return the normalized URL of every client site
pub fn extract_client_sites(page_body: &str) -> Vec<String> {
    let document = Html::parse_document(page_body);

    let sites: Vec<String> = document
        .select(&CLIENT_SITE_CELL)
        .flat_map(own_text)
        .map(normalize_url)
        .collect();

    debug!("Found {} client sites on listing page", sites.len());
    sites
}

/// Link to the Technology Overview page, taken from the listing page breadcrumb
pub fn technology_link(page_body: &str) -> Option<String> {
    let document = Html::parse_document(page_body);

    document
        .select(&BREADCRUMB_TRENDS_LINK)
        .find_map(|link| link.value().attr("href"))
        .map(normalize_url)
}

/// Parse a Technology Overview page.
///
/// The page must have exactly three detail paragraphs (description, homepage,
/// tags); any other shape yields `None`.
pub fn parse_technology_details(page_body: &str) -> Option<TechnologyDetails> {
    let document = Html::parse_document(page_body);

    let paragraphs: Vec<ElementRef> = document.select(&DETAIL_PARAGRAPH).collect();
    let [description, site, tags] = paragraphs.as_slice() else {
        debug!("Expected 3 detail paragraphs, found {}", paragraphs.len());
        return None;
    };

    // Only the text before the first child element, like the page renders it
    let description = description
        .children()
        .next()
        .and_then(|node| node.value().as_text())
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let site = site.select(&ANCHOR).flat_map(own_text).next()?.to_string();

    let tags = tags
        .select(&ANCHOR)
        .flat_map(own_text)
        .map(String::from)
        .collect();

    let image_link = document
        .select(&ICON)
        .last()
        .and_then(|img| img.value().attr("data-src"))
        .map(String::from);

    Some(TechnologyDetails {
        description,
        site,
        tags,
        image_link,
    })
}

/// Follow the listing page breadcrumb and read the Technology Overview page
pub async fn fetch_technology_details<F: Fetch>(
    fetcher: &F,
    listing_body: &str,
) -> Option<TechnologyDetails> {
    let link = technology_link(listing_body)?;
    let page = fetcher.fetch(&link, FetchOptions::default()).await?;
    parse_technology_details(&page.body)
}
