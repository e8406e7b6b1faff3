use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{DEFAULT_MAX_PAGES, DEFAULT_UNBOUNDED_DELAY, MAX_BOUNDED_PAGES, SessionConfig};
use crate::data_models::{Language, SearchQuery};
use crate::session::{ResultAccumulator, SearchSession};

use super::AppState;
use super::models::{SearchRequest, SearchResponse};

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = Instant::now();

    let language = request
        .language
        .as_deref()
        .map(Language::from_code)
        .unwrap_or_default();
    let query = SearchQuery::new(request.keyword.as_str(), language, request.sort.unwrap_or_default())
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let config = session_config(&request).map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let session = SearchSession::new(state.fetcher.clone(), config);
    let mut results = ResultAccumulator::new();
    let report = session.run(&query, &mut results).await;

    Ok(Json(SearchResponse {
        query,
        status: report.status(),
        message: report.message(),
        total_results: results.len(),
        pages_fetched: report.pages_fetched,
        total_pages: report.total_pages,
        termination: report.termination,
        results: results.into_records(),
        processing_time_ms: start.elapsed().as_millis(),
    }))
}

/// Bounded requests take `max_pages` in `1..=MAX_BOUNDED_PAGES`; only unbounded
/// requests take `delay_ms`.
fn session_config(request: &SearchRequest) -> Result<SessionConfig, String> {
    if request.unbounded {
        if request.max_pages.is_some() {
            return Err("max_pages cannot be combined with unbounded".to_string());
        }
        let delay = request
            .delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_UNBOUNDED_DELAY);
        return Ok(SessionConfig::unbounded(delay));
    }

    if request.delay_ms.is_some() {
        return Err("delay_ms only applies to unbounded searches".to_string());
    }
    let max_pages = request.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
    if !(1..=MAX_BOUNDED_PAGES).contains(&max_pages) {
        return Err(format!(
            "max_pages must be between 1 and {MAX_BOUNDED_PAGES}, got {max_pages}"
        ));
    }
    Ok(SessionConfig::bounded(max_pages))
}
