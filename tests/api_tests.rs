use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wol_search::api::{AppState, create_router};
use wol_search::fetcher::{Endpoints, WolFetcher};

mod test_helpers {
    use super::*;

    pub fn router_for(server: &MockServer) -> axum::Router {
        let endpoints = Endpoints::new(
            &format!("{}/ja/wol/s/r7/lp-j", server.uri()),
            &format!("{}/en/wol/s/r1/lp-e", server.uri()),
        )
        .unwrap();
        create_router(Arc::new(AppState {
            fetcher: WolFetcher::new(endpoints),
        }))
    }

    pub fn search_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_empty_keyword_is_rejected() {
    let server = MockServer::start().await;
    let response = router_for(&server)
        .oneshot(search_request(serde_json::json!({ "keyword": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_returns_results_and_status() {
    let server = MockServer::start().await;
    let body = r#"<html><body>
        <ul class="results resultContentDocument">
          <li class="caption"><a class="lnk" href="/ja/wol/d/r7/lp-j/1">信仰</a></li>
          <li class="searchResult"><div class="document">信仰は望んでいる事柄</div></li>
        </ul>
        <input id="searchResultsTotal" value="1">
        <input id="searchResultsPageSize" value="10">
        <input id="searchResultsPageNumber" value="1">
      </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/ja/wol/s/r7/lp-j"))
        .and(query_param("q", "信仰"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let response = router_for(&server)
        .oneshot(search_request(serde_json::json!({
            "keyword": "信仰",
            "language": "xx",
            "sort": "relevance",
            "max_pages": 5
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["total_results"], 1);
    assert_eq!(json["pages_fetched"], 1);
    assert_eq!(json["total_pages"], 1);
    assert_eq!(json["termination"]["reason"], "no_next_page");
    assert_eq!(json["query"]["language"], "ja");
    assert_eq!(json["results"][0]["title"], "信仰");
    assert_eq!(json["results"][0]["snippet"], "信仰は望んでいる事柄");
    assert_eq!(json["message"], "found 1 results");
}

#[tokio::test]
async fn test_upstream_failure_is_reported_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = router_for(&server)
        .oneshot(search_request(serde_json::json!({ "keyword": "faith", "language": "en" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "failure");
    assert_eq!(json["termination"]["reason"], "transport_failure");
    assert_eq!(json["termination"]["page"], 1);
    assert_eq!(json["results"], serde_json::json!([]));
}

mod request_validation {
    use super::*;

    async fn assert_rejected(body: serde_json::Value) {
        let server = MockServer::start().await;
        let response = router_for(&server)
            .oneshot(search_request(body.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_max_pages_above_limit_is_rejected() {
        assert_rejected(serde_json::json!({ "keyword": "faith", "max_pages": 11 })).await;
        assert_rejected(serde_json::json!({ "keyword": "faith", "max_pages": 1000 })).await;
    }

    #[tokio::test]
    async fn test_zero_max_pages_is_rejected() {
        assert_rejected(serde_json::json!({ "keyword": "faith", "max_pages": 0 })).await;
    }

    #[tokio::test]
    async fn test_delay_on_bounded_search_is_rejected() {
        assert_rejected(serde_json::json!({ "keyword": "faith", "delay_ms": 300 })).await;
    }

    #[tokio::test]
    async fn test_max_pages_with_unbounded_is_rejected() {
        assert_rejected(serde_json::json!({
            "keyword": "faith",
            "unbounded": true,
            "max_pages": 4
        }))
        .await;
    }

    #[tokio::test]
    async fn test_upper_limit_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let response = router_for(&server)
            .oneshot(search_request(serde_json::json!({ "keyword": "faith", "max_pages": 10 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "empty");
    }
}
