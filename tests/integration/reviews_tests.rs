use crate::common::{config_for, upstream};
use market_mirror::crawler::ReviewsPaginator;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_page_sends_window_and_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/core/api/reviews/item/AB12"))
        .and(query_param("first", "20"))
        .and(query_param("n", "10"))
        .and(query_param("requireMedia", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "item": {"refNum": "AB12"},
                "reviews": [{"rating": 5}, {"rating": 3}],
                "first": 20,
                "n": 10
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let client = upstream(&config);
    let page = ReviewsPaginator::new(&client)
        .fetch_page("AB12", 20, 10)
        .await
        .unwrap();

    assert_eq!(page.item, Some(json!({"refNum": "AB12"})));
    assert_eq!(page.reviews.len(), 2);
    assert_eq!(page.first_offset, 20);
    assert_eq!(page.page_size, 10);
    assert!(page.is_last(10));
    assert!(page.source_url.starts_with(&server.uri()));
}

#[tokio::test]
async fn test_missing_envelope_is_an_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "none"})))
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let page = upstream(&config).fetch_review_page("Z9", 0, 20).await.unwrap();

    assert!(page.item.is_none());
    assert!(page.reviews.is_empty());
    assert_eq!(page.first_offset, 0);
    assert_eq!(page.page_size, 20);
}

#[tokio::test]
async fn test_review_page_fails_over() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"reviews": [{"rating": 4}]}
        })))
        .mount(&fallback)
        .await;

    let config = config_for(&[primary.uri(), fallback.uri()]);
    let page = upstream(&config).fetch_review_page("R1", 0, 20).await.unwrap();

    assert_eq!(page.reviews.len(), 1);
    assert!(page.source_url.starts_with(&fallback.uri()));
}
