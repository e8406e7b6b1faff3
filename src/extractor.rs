//! Result extraction for the two search result layouts served by the library.
//!
//! The older *legacy* layout renders each hit as a `ul.results.resultContentDocument`
//! with a `li.caption` title and a `li.searchResult` snippet. The newer *card*
//! layout renders `li.navCard` entries with `div.cardLine1`/`div.cardLine2` title
//! lines and a `div.cardTitleDetail` publication line.

use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::data_models::ResultRecord;

fn selector(css: &'static str) -> Selector {
    // Only called with the literals below.
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

static LEGACY_CONTAINER: Lazy<Selector> = Lazy::new(|| selector("ul.results.resultContentDocument"));
static LEGACY_CAPTION: Lazy<Selector> = Lazy::new(|| selector("li.caption"));
static LEGACY_LINK: Lazy<Selector> = Lazy::new(|| selector("a.lnk"));
static LEGACY_SNIPPET: Lazy<Selector> = Lazy::new(|| selector("li.searchResult"));
static LEGACY_DOCUMENT: Lazy<Selector> = Lazy::new(|| selector("div.document"));

static CARD_CONTAINER: Lazy<Selector> = Lazy::new(|| selector("li.navCard"));
static CARD_TITLE_BLOCK: Lazy<Selector> = Lazy::new(|| selector("div.cardTitleBlock"));
static CARD_LINE1: Lazy<Selector> = Lazy::new(|| selector("div.cardLine1"));
static CARD_LINE2: Lazy<Selector> = Lazy::new(|| selector("div.cardLine2"));
static CARD_DETAIL: Lazy<Selector> = Lazy::new(|| selector("div.cardTitleDetail"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLayout {
    Legacy,
    Card,
}

impl ResultLayout {
    /// Order in which a result block is tried against each layout.
    pub const PRIORITY: [ResultLayout; 2] = [ResultLayout::Legacy, ResultLayout::Card];

    fn container(&self) -> &'static Selector {
        match self {
            ResultLayout::Legacy => &*LEGACY_CONTAINER,
            ResultLayout::Card => &*CARD_CONTAINER,
        }
    }

    /// Returns `None` when the block does not have this layout's shape.
    /// A matching block may still produce a record with empty fields.
    pub fn parse_block(&self, block: ElementRef<'_>, base: &Url) -> Option<ResultRecord> {
        match self {
            ResultLayout::Legacy => parse_legacy(block, base),
            ResultLayout::Card => parse_card(block, base),
        }
    }
}

/// Parses the result blocks of one page. Records lacking a title or a link are dropped.
pub fn extract(markup: &str, base: &Url) -> Vec<ResultRecord> {
    extract_from_document(&Html::parse_document(markup), base)
}

pub fn extract_from_document(document: &Html, base: &Url) -> Vec<ResultRecord> {
    let (layout, blocks) = result_blocks(document);
    if let Some(layout) = layout {
        log::debug!("found {} result blocks ({layout:?} containers)", blocks.len());
    }

    blocks
        .into_iter()
        .filter_map(|block| {
            ResultLayout::PRIORITY
                .iter()
                .find_map(|layout| layout.parse_block(block, base))
        })
        .filter(ResultRecord::is_complete)
        .collect()
}

/// Legacy containers win; card containers are only looked for when there are none.
fn result_blocks(document: &Html) -> (Option<ResultLayout>, Vec<ElementRef<'_>>) {
    for layout in ResultLayout::PRIORITY {
        let blocks: Vec<ElementRef<'_>> = document.select(layout.container()).collect();
        if !blocks.is_empty() {
            return (Some(layout), blocks);
        }
    }
    (None, Vec::new())
}

fn parse_legacy(block: ElementRef<'_>, base: &Url) -> Option<ResultRecord> {
    let caption = block.select(&LEGACY_CAPTION).next()?;

    let (title, link) = match caption.select(&LEGACY_LINK).next() {
        Some(anchor) => (stripped_text(anchor, ""), resolve_href(anchor, base)),
        None => (String::new(), String::new()),
    };
    let snippet = block
        .select(&LEGACY_SNIPPET)
        .next()
        .and_then(|li| li.select(&LEGACY_DOCUMENT).next())
        .map(|doc| stripped_text(doc, " "))
        .unwrap_or_default();

    Some(ResultRecord::new(title, link, snippet, String::new()))
}

fn parse_card(block: ElementRef<'_>, base: &Url) -> Option<ResultRecord> {
    block.select(&CARD_TITLE_BLOCK).next()?;

    let mut title = first_text(block, &CARD_LINE1);
    if title.is_empty() {
        title = first_text(block, &CARD_LINE2);
    }
    let link = block
        .select(&ANCHOR)
        .next()
        .map(|anchor| resolve_href(anchor, base))
        .unwrap_or_default();
    let publication = first_text(block, &CARD_DETAIL);

    Some(ResultRecord::new(title, link, String::new(), publication))
}

fn first_text(block: ElementRef<'_>, selector: &Selector) -> String {
    block
        .select(selector)
        .next()
        .map(|el| stripped_text(el, ""))
        .unwrap_or_default()
}

/// Text nodes trimmed, empty ones dropped, joined with `separator`.
fn stripped_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join(separator)
}

/// Resolves the anchor's href against the endpoint. A missing href resolves to
/// the endpoint itself; an unjoinable one yields an empty link.
fn resolve_href(anchor: ElementRef<'_>, base: &Url) -> String {
    let href = anchor.value().attr("href").unwrap_or("").trim();
    match base.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            log::debug!("dropping unresolvable href {href:?}: {e}");
            String::new()
        }
    }
}
