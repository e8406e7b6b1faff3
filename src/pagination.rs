use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::data_models::{PageInfo, PageOutcome};
use crate::extractor;
use crate::fetcher::RawPage;

static TOTAL: Lazy<Selector> = Lazy::new(|| metadata_selector("#searchResultsTotal"));
static PAGE_SIZE: Lazy<Selector> = Lazy::new(|| metadata_selector("#searchResultsPageSize"));
static PAGE_NUMBER: Lazy<Selector> = Lazy::new(|| metadata_selector("#searchResultsPageNumber"));

fn metadata_selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub has_next: bool,
    pub page_info: PageInfo,
}

impl PaginationState {
    fn fallback(record_count: usize) -> PaginationState {
        PaginationState {
            has_next: false,
            page_info: PageInfo::single_page(record_count),
        }
    }
}

/// Reads the pagination metadata embedded in the page as `value` attributes.
///
/// Missing, non-numeric or zero metadata never fails: the page is treated as the
/// only page, holding `record_count` results.
pub fn inspect(markup: &str, record_count: usize) -> PaginationState {
    inspect_document(&Html::parse_document(markup), record_count)
}

pub fn inspect_document(document: &Html, record_count: usize) -> PaginationState {
    match read_metadata(document) {
        Some((total_results, page_size, current_page)) => {
            let total_pages = u32::try_from(total_results.div_ceil(page_size)).unwrap_or(u32::MAX);
            PaginationState {
                has_next: current_page < total_pages,
                page_info: PageInfo {
                    total_results,
                    current_page,
                    total_pages,
                },
            }
        }
        None => {
            log::debug!("pagination metadata unavailable, assuming a single page");
            PaginationState::fallback(record_count)
        }
    }
}

fn read_metadata(document: &Html) -> Option<(u64, u64, u32)> {
    let total: u64 = read_value(document, &TOTAL)?;
    let page_size: u64 = read_value(document, &PAGE_SIZE)?;
    let current_page: u32 = read_value(document, &PAGE_NUMBER)?;
    if page_size == 0 || current_page == 0 {
        return None;
    }
    Some((total, page_size, current_page))
}

fn read_value<T: std::str::FromStr>(document: &Html, selector: &Selector) -> Option<T> {
    document
        .select(selector)
        .next()?
        .value()
        .attr("value")?
        .trim()
        .parse()
        .ok()
}

/// Extracts records and pagination state from one fetched page.
pub fn parse_page(page: &RawPage) -> PageOutcome {
    let document = Html::parse_document(&page.body);
    let records = extractor::extract_from_document(&document, &page.endpoint);
    let state = inspect_document(&document, records.len());
    PageOutcome {
        records,
        has_next: state.has_next,
        page_info: state.page_info,
    }
}
