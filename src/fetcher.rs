use anyhow::{Context, Result};
use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::data_models::{Language, SearchQuery};

/// Fixed search-type flag (`st`).
const SEARCH_TYPE: &str = "a";
/// Fixed search-scope flag (`p`): match within paragraphs.
const SEARCH_SCOPE: &str = "par";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build request for {url}: {message}")]
    Build { url: String, message: String },
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("server returned {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Markup of one search results page together with the endpoint it came from.
/// Relative links in `body` resolve against `endpoint`.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub endpoint: Url,
    pub body: String,
}

/// Fetches one page of search results.
pub trait PageFetcher {
    fn fetch(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> impl Future<Output = Result<RawPage, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub primary: Url,
    pub secondary: Url,
}

impl Endpoints {
    pub fn new(primary: &str, secondary: &str) -> Result<Endpoints> {
        Ok(Endpoints {
            primary: Url::parse(primary)
                .with_context(|| format!("invalid primary endpoint {primary:?}"))?,
            secondary: Url::parse(secondary)
                .with_context(|| format!("invalid secondary endpoint {secondary:?}"))?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Endpoints> {
        Self::new(&config.primary_endpoint, &config.secondary_endpoint)
    }

    pub fn for_language(&self, language: Language) -> &Url {
        match language {
            Language::Japanese => &self.primary,
            Language::English => &self.secondary,
        }
    }
}

/// Renders an error with all of its causes, outermost first.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// reqwest backed fetcher for the online library search endpoints.
#[derive(Debug, Clone)]
pub struct WolFetcher {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl WolFetcher {
    pub fn new(endpoints: Endpoints) -> WolFetcher {
        WolFetcher {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    pub fn from_config(config: &Config) -> Result<WolFetcher> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(WolFetcher {
            client,
            endpoints: Endpoints::from_config(config)?,
        })
    }

    pub fn build_request(&self, query: &SearchQuery, page: u32) -> Result<reqwest::Request, FetchError> {
        let endpoint = self.endpoints.for_language(query.language);
        let page = page.to_string();
        self.client
            .get(endpoint.clone())
            .query(&[
                ("q", query.keyword()),
                ("st", SEARCH_TYPE),
                ("p", SEARCH_SCOPE),
                ("r", query.sort.as_param()),
                ("pg", page.as_str()),
            ])
            .build()
            .map_err(|e| FetchError::Build {
                url: endpoint.to_string(),
                message: e.to_string(),
            })
    }
}

impl PageFetcher for WolFetcher {
    async fn fetch(&self, query: &SearchQuery, page: u32) -> Result<RawPage, FetchError> {
        let endpoint = self.endpoints.for_language(query.language).clone();
        let request = self.build_request(query, page)?;
        let url = request.url().to_string();
        log::debug!("fetching search page {page}: {url}");

        let res = self
            .client
            .execute(request)
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                message: error_chain(&e),
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = res.text().await.map_err(|e| FetchError::Network {
            url: url.clone(),
            message: error_chain(&e),
        })?;
        Ok(RawPage { endpoint, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::SortOrder;

    fn fetcher() -> WolFetcher {
        WolFetcher::new(
            Endpoints::new(
                crate::config::DEFAULT_PRIMARY_ENDPOINT,
                crate::config::DEFAULT_SECONDARY_ENDPOINT,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_request_carries_all_params() {
        let query = SearchQuery::new("faith", Language::English, SortOrder::Recency).unwrap();
        let request = fetcher().build_request(&query, 4).unwrap();
        let url = request.url();

        assert_eq!(url.path(), "/en/wol/s/r1/lp-e");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "faith".to_string()),
                ("st".to_string(), "a".to_string()),
                ("p".to_string(), "par".to_string()),
                ("r".to_string(), "newest".to_string()),
                ("pg".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_language_uses_primary_endpoint() {
        let query = SearchQuery::new(
            "信仰",
            Language::from_code("xx"),
            SortOrder::Relevance,
        )
        .unwrap();
        let request = fetcher().build_request(&query, 1).unwrap();
        assert_eq!(request.url().path(), "/ja/wol/s/r7/lp-j");
    }

    #[derive(Debug, Error)]
    #[error("{0}")]
    struct Layer(&'static str, #[source] Option<Box<Layer>>);

    #[test]
    fn test_error_chain_keeps_causes() {
        let err = Layer(
            "error sending request",
            Some(Box::new(Layer(
                "client error (Connect)",
                Some(Box::new(Layer("Connection refused", None))),
            ))),
        );
        assert_eq!(
            error_chain(&err),
            "error sending request: client error (Connect): Connection refused"
        );
    }

    #[test]
    fn test_error_chain_without_source() {
        assert_eq!(error_chain(&Layer("timed out", None)), "timed out");
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        assert!(Endpoints::new("not a url", crate::config::DEFAULT_SECONDARY_ENDPOINT).is_err());
    }
}
