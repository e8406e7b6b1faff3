use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Library language. Each language has its own search endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Primary endpoint. Unknown language codes land here.
    #[default]
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Never fails: anything other than `"en"` selects the primary endpoint.
    pub fn from_code(code: &str) -> Language {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Language::English,
            _ => Language::Japanese,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::English => "en",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "occ")]
    Relevance,
    #[serde(alias = "newest")]
    Recency,
}

impl SortOrder {
    /// Value of the `r` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "occ",
            SortOrder::Recency => "newest",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("search keyword cannot be empty")]
    EmptyKeyword,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    pub language: Language,
    pub sort: SortOrder,
}

impl SearchQuery {
    pub fn new(
        keyword: impl Into<String>,
        language: Language,
        sort: SortOrder,
    ) -> Result<SearchQuery, QueryError> {
        let keyword = keyword.into().trim().to_string();
        if keyword.is_empty() {
            return Err(QueryError::EmptyKeyword);
        }
        Ok(SearchQuery {
            keyword,
            language,
            sort,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultRecord {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub publication: String,
}

impl ResultRecord {
    pub fn new(title: String, link: String, snippet: String, publication: String) -> ResultRecord {
        ResultRecord {
            title,
            link,
            snippet,
            publication,
        }
    }

    /// A record without both a title and a link is never emitted.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.link.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub total_results: u64,
    pub current_page: u32,
    pub total_pages: u32,
}

impl PageInfo {
    /// Used whenever the pagination metadata is missing or unreadable.
    pub fn single_page(record_count: usize) -> PageInfo {
        PageInfo {
            total_results: record_count as u64,
            current_page: 1,
            total_pages: 1,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub records: Vec<ResultRecord>,
    pub has_next: bool,
    pub page_info: PageInfo,
}
