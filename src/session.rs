use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::data_models::{ResultRecord, SearchQuery};
use crate::fetcher::PageFetcher;
use crate::pagination;

/// Results collected across the pages of one search, in page order.
#[derive(Debug, Default, Clone)]
pub struct ResultAccumulator {
    records: Vec<ResultRecord>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    fn extend(&mut self, records: Vec<ResultRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}

/// Snapshot sent after every accumulated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub page: u32,
    pub total_pages: Option<u32>,
    pub record_count: usize,
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    EmptyFirstPage,
    EmptyLaterPage { page: u32 },
    CeilingReached { ceiling: u32 },
    NoNextPage,
    TransportFailure { page: u32, message: String },
    Cancelled { page: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Success,
    Partial,
    Empty,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub termination: Termination,
    pub pages_fetched: u32,
    pub total_pages: Option<u32>,
    pub record_count: usize,
    pub unbounded: bool,
}

impl SearchReport {
    pub fn status(&self) -> SearchStatus {
        match &self.termination {
            Termination::CeilingReached { .. } | Termination::NoNextPage => SearchStatus::Success,
            Termination::EmptyFirstPage => SearchStatus::Empty,
            Termination::TransportFailure { page: 1, .. } => SearchStatus::Failure,
            Termination::EmptyLaterPage { .. }
            | Termination::TransportFailure { .. }
            | Termination::Cancelled { .. } => {
                if self.record_count == 0 {
                    SearchStatus::Empty
                } else {
                    SearchStatus::Partial
                }
            }
        }
    }

    /// Human readable summary for the presentation layer.
    pub fn message(&self) -> String {
        match &self.termination {
            Termination::EmptyFirstPage | Termination::TransportFailure { page: 1, .. } => {
                "no results found, try a different keyword".to_string()
            }
            Termination::EmptyLaterPage { page } | Termination::TransportFailure { page, .. } => {
                format!("could not fetch page {page}, showing results gathered so far")
            }
            Termination::Cancelled { page } => format!(
                "search cancelled before page {page}, showing {} results gathered so far",
                self.record_count
            ),
            Termination::NoNextPage if self.unbounded => {
                format!("retrieved all {} results", self.record_count)
            }
            Termination::NoNextPage | Termination::CeilingReached { .. } => {
                format!("found {} results", self.record_count)
            }
        }
    }
}

/// Drives fetch, extraction and pagination one page at a time.
pub struct SearchSession<F> {
    fetcher: F,
    config: SessionConfig,
    progress_tx: Option<mpsc::UnboundedSender<Progress>>,
    cancel: CancellationToken,
}

impl<F: PageFetcher> SearchSession<F> {
    pub fn new(fetcher: F, config: SessionConfig) -> Self {
        Self {
            fetcher,
            config,
            progress_tx: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<Progress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// The session stops at the next page boundary once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs one search. `results` is reset first; whatever it holds when this
    /// returns is the outcome, including on failure.
    pub async fn run(&self, query: &SearchQuery, results: &mut ResultAccumulator) -> SearchReport {
        results.reset();
        log::info!(
            "searching {:?} ({}, {:?}, ceiling {:?})",
            query.keyword(),
            query.language.code(),
            query.sort,
            self.config.page_ceiling
        );

        let mut page: u32 = 1;
        let mut ceiling: Option<u32> = None;
        let mut pages_fetched: u32 = 0;

        let termination = loop {
            if self.cancel.is_cancelled() {
                break Termination::Cancelled { page };
            }

            let raw = match self.fetcher.fetch(query, page).await {
                Ok(raw) => raw,
                Err(e) => {
                    log::error!("error fetching page {page}, error: {e}");
                    break Termination::TransportFailure {
                        page,
                        message: e.to_string(),
                    };
                }
            };
            let outcome = pagination::parse_page(&raw);
            pages_fetched += 1;

            if outcome.records.is_empty() {
                if page == 1 {
                    break Termination::EmptyFirstPage;
                }
                log::warn!("page {page} returned no results, keeping earlier pages");
                break Termination::EmptyLaterPage { page };
            }
            results.extend(outcome.records);

            let effective = match ceiling {
                Some(effective) => effective,
                None => {
                    let server_total = outcome.page_info.total_pages;
                    let effective = self.config.effective_ceiling(server_total);
                    ceiling = Some(effective);
                    if server_total == 0 {
                        break Termination::NoNextPage;
                    }
                    effective
                }
            };

            self.report_progress(Progress {
                page,
                total_pages: ceiling,
                record_count: results.len(),
            });

            if !outcome.has_next {
                if page > 1 && outcome.page_info.total_pages == 1 && page < effective {
                    // Metadata fallback mid-session looks like the last page.
                    log::warn!("page {page} has no pagination metadata, stopping early");
                }
                break Termination::NoNextPage;
            }
            if page >= effective {
                break Termination::CeilingReached { ceiling: effective };
            }

            if !self.pause(self.config.inter_page_delay).await {
                break Termination::Cancelled { page: page + 1 };
            }
            page += 1;
        };

        let report = SearchReport {
            termination,
            pages_fetched,
            total_pages: ceiling,
            record_count: results.len(),
            unbounded: self.config.is_unbounded(),
        };
        log::info!(
            "search finished after {} page(s): {:?}, {} results",
            report.pages_fetched,
            report.termination,
            report.record_count
        );
        report
    }

    fn report_progress(&self, progress: Progress) {
        log::info!(
            "page {}/{} fetched, {} results so far",
            progress.page,
            progress
                .total_pages
                .map_or_else(|| "?".to_string(), |t| t.to_string()),
            progress.record_count
        );
        if let Some(tx) = &self.progress_tx {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(progress);
        }
    }

    /// Politeness delay. Returns false if cancelled while waiting.
    async fn pause(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
