use serde::{Deserialize, Serialize};

use crate::data_models::{ResultRecord, SearchQuery, SortOrder};
use crate::session::{SearchStatus, Termination};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub keyword: String,
    /// Language code; unknown codes search the primary library.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub unbounded: bool,
    /// Delay between pages in unbounded mode.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: SearchQuery,
    pub results: Vec<ResultRecord>,
    pub total_results: usize,
    pub pages_fetched: u32,
    pub total_pages: Option<u32>,
    pub status: SearchStatus,
    pub termination: Termination,
    pub message: String,
    pub processing_time_ms: u128,
}
