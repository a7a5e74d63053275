use crate::common::{config_for, seller_page, upstream};
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_server_error_fails_over_to_next_host() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/viewSubject/p/7"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/viewSubject/p/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(seller_page("seven")))
        .expect(1)
        .mount(&fallback)
        .await;

    let config = config_for(&[primary.uri(), fallback.uri()]);
    let page = upstream(&config).fetch_seller_page("7").await.unwrap();

    assert!(page.source_url.starts_with(&fallback.uri()));
    assert!(page.html.contains("Welcome to seven"));
    assert_eq!(page.byte_count, seller_page("seven").len() as u64);
}

#[tokio::test]
async fn test_client_error_never_tries_next_host() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/viewSubject/p/7"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fallback)
        .await;

    let config = config_for(&[primary.uri(), fallback.uri()]);
    let err = upstream(&config).fetch_seller_page("7").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_all_hosts_failing_returns_last_error() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&fallback)
        .await;

    let config = config_for(&[primary.uri(), fallback.uri()]);
    let err = upstream(&config).fetch_seller_page("7").await.unwrap_err();

    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_unreachable_host_fails_over() {
    // Nothing listens on a port once its listener is dropped
    let dead = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port())
    };
    let live = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/viewSubject/p/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(seller_page("one")))
        .mount(&live)
        .await;

    let config = config_for(&[dead.clone(), live.uri()]);
    let client = upstream(&config);

    let page = client.fetch_seller_page("1").await.unwrap();
    assert!(page.source_url.starts_with(&live.uri()));

    let alone = config_for(&[dead]);
    let err = upstream(&alone).fetch_seller_page("1").await.unwrap_err();
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_slow_host_does_not_shorten_fallback_budget() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(seller_page("slow"))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&slow)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(seller_page("fast"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&fast)
        .await;

    let mut config = config_for(&[slow.uri(), fast.uri()]);
    config.crawler.timeout_ms = 300;
    let page = upstream(&config).fetch_seller_page("1").await.unwrap();

    assert!(page.html.contains("Welcome to fast"));
}

#[tokio::test]
async fn test_timeout_is_recognizable() {
    let slow = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1000)))
        .mount(&slow)
        .await;

    let mut config = config_for(&[slow.uri()]);
    config.crawler.timeout_ms = 100;
    let err = upstream(&config).fetch_seller_page("1").await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_user_summary_with_and_without_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/core/api/getUserSummary/p/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "summary": {"username": "one"},
                "statistics": {"averageRating": 4.5, "numberOfReviews": 12}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core/api/getUserSummary/p/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": {"username": "two"},
            "statistics": null
        })))
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let client = upstream(&config);

    let enveloped = client.fetch_user_summary("1").await.unwrap();
    assert_eq!(enveloped.summary, Some(json!({"username": "one"})));
    assert_eq!(enveloped.statistics.unwrap()["numberOfReviews"], 12);

    let bare = client.fetch_user_summary("2").await.unwrap();
    assert_eq!(bare.summary, Some(json!({"username": "two"})));
    assert!(bare.statistics.is_none());
}

#[tokio::test]
async fn test_invalid_json_fails_over() {
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": {}})))
        .mount(&fallback)
        .await;

    let config = config_for(&[primary.uri(), fallback.uri()]);
    let summary = upstream(&config).fetch_user_summary("3").await.unwrap();

    assert!(summary.source_url.starts_with(&fallback.uri()));
    assert!(summary.summary.is_none());
}

#[tokio::test]
async fn test_seller_page_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/viewSubject/p/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(seller_page("five")))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let client = upstream(&config);

    let first = client.fetch_seller_page("5").await.unwrap();
    let second = client.fetch_seller_page("5").await.unwrap();
    assert_eq!(first.html, second.html);
}
