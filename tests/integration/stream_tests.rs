use crate::common::{config_for, seller_page, upstream};
use market_mirror::config::Markers;
use market_mirror::extract::extract_seller_meta;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_byte_cap_bounds_buffered_html() {
    let server = MockServer::start().await;
    let body = "x".repeat(200_000);

    Mock::given(method("GET"))
        .and(path("/viewSubject/p/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let mut config = config_for(&[server.uri()]);
    config.crawler.max_bytes = 4096;
    let page = upstream(&config).fetch_seller_page("big").await.unwrap();

    assert!(page.html.len() <= 4096);
    assert!(page.byte_count > 4096);
}

#[tokio::test]
async fn test_body_under_cap_is_read_whole() {
    let server = MockServer::start().await;
    let body = seller_page("small");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let page = upstream(&config).fetch_seller_page("small").await.unwrap();

    assert_eq!(page.html, body);
}

#[tokio::test]
async fn test_early_abort_is_a_successful_read() {
    let server = MockServer::start().await;
    let body = format!("{}{}", seller_page("early"), "<p>padding</p>".repeat(20_000));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let mut config = config_for(&[server.uri()]);
    config.crawler.early_abort = true;
    config.crawler.early_abort_min_bytes = 100;
    config.crawler.max_bytes = 1024 * 1024;
    let page = upstream(&config).fetch_seller_page("early").await.unwrap();

    // The whole body fits under the cap, so only the marker can stop the read
    assert!(page.byte_count < body.len() as u64);
    assert!(page.html.len() < body.len());

    let meta = extract_seller_meta(&page.html, &Markers::default());
    assert_eq!(meta.joined_text.as_deref(), Some("May 2020"));
}
