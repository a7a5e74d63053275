use crate::common::{config_for, seller_page, upstream};
use market_mirror::config::CrawlerMode;
use market_mirror::crawler::{select_crawler, CrawlOptions};
use market_mirror::output::publish_index;
use market_mirror::storage::{
    get_json, put_json, reviews_key, seller_key, BlobStore, MemoryStore, SqliteStore,
    MARKET_INDEX_KEY, MARKET_SELLERS_KEY,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_seller(server: &MockServer, id: &str, reviews: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/viewSubject/p/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(seller_page(id)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/core/api/getUserSummary/p/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "summary": {"username": id},
                "statistics": {"averageRating": 4.2, "averageDaysToArrive": 5, "numberOfReviews": reviews}
            }
        })))
        .mount(server)
        .await;
}

fn targets(ids: &[&str]) -> CrawlOptions {
    CrawlOptions {
        targets: ids.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_seller_crawl_then_publish() {
    let server = MockServer::start().await;
    mount_seller(&server, "1", 3).await;
    mount_seller(&server, "2", 40).await;
    Mock::given(method("GET"))
        .and(path("/viewSubject/p/3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let store = Arc::new(MemoryStore::new());
    let crawler = select_crawler(&config, Arc::new(upstream(&config)), store.clone()).unwrap();
    assert_eq!(crawler.name(), "sellers");

    let report = crawler.run(&targets(&["1", "2", "3"])).await.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].target, "3");
    assert_eq!(report.failed[0].status, Some(404));

    let detail: Value = get_json(store.as_ref(), &seller_key("1")).unwrap().unwrap();
    assert_eq!(detail["manifesto"]["text"], "Welcome to 1.\nShips daily.");
    assert_eq!(detail["manifesto"]["lineCount"], 2);
    assert_eq!(detail["onlineStatus"], "today");
    assert_eq!(detail["joinedText"], "May 2020");
    assert_eq!(detail["imageUrl"], "/avatars/1.jpg");
    assert_eq!(detail["stats"]["numberOfReviews"], 3.0);
    assert!(store.get(&seller_key("3")).unwrap().is_none());

    put_json(
        store.as_ref(),
        MARKET_INDEX_KEY,
        &json!([
            {"id": 100, "refNum": "A", "sellerId": "1", "sellerName": "One", "imageUrl": "a.jpg"},
            {"id": 101, "refNum": "B", "sellerId": "1", "sellerName": "One", "imageUrl": "b.jpg"},
            {"id": 102, "refNum": "C", "sellerId": "2", "sellerName": "Two", "imageUrl": "c.jpg"}
        ]),
    )
    .unwrap();

    let summary = publish_index(store.as_ref()).unwrap();
    assert_eq!(summary.sellers, 2);
    assert_eq!(summary.sellers_with_stats, 2);

    let sellers: Vec<Value> = get_json(store.as_ref(), MARKET_SELLERS_KEY).unwrap().unwrap();
    assert_eq!(sellers[0]["id"], "2");
    assert_eq!(sellers[0]["itemsCount"], 1);
    assert_eq!(sellers[0]["url"], "/viewSubject/p/2");
    assert_eq!(sellers[1]["id"], "1");
    assert_eq!(sellers[1]["itemsCount"], 2);
}

#[tokio::test]
async fn test_seller_crawl_survives_missing_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/viewSubject/p/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(seller_page("9")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core/api/getUserSummary/p/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let store = Arc::new(MemoryStore::new());
    let crawler = select_crawler(&config, Arc::new(upstream(&config)), store.clone()).unwrap();

    let report = crawler.run(&targets(&["9"])).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let detail: Value = get_json(store.as_ref(), &seller_key("9")).unwrap().unwrap();
    assert!(detail["stats"].is_null());
    assert_eq!(detail["imageUrl"], "/avatars/9.jpg");
}

#[tokio::test]
async fn test_seller_crawl_keeps_one_request_per_worker() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(150);
    for id in ["1", "2"] {
        Mock::given(method("GET"))
            .and(path(format!("/viewSubject/p/{}", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(seller_page(id))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/core/api/getUserSummary/p/{}", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": {"statistics": {"numberOfReviews": 1}}}))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = config_for(&[server.uri()]);
    config.crawler.concurrency = 1;
    let store = Arc::new(MemoryStore::new());
    let crawler = select_crawler(&config, Arc::new(upstream(&config)), store).unwrap();

    let started = Instant::now();
    let report = crawler.run(&targets(&["1", "2"])).await.unwrap();
    let elapsed = started.elapsed();

    // Four delayed requests, never more than one in flight
    assert_eq!(report.succeeded, 2);
    assert!(elapsed >= delay * 4, "requests overlapped: {:?}", elapsed);
}

#[tokio::test]
async fn test_missing_page_skips_summary_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/viewSubject/p/4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core/api/getUserSummary/p/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let store = Arc::new(MemoryStore::new());
    let crawler = select_crawler(&config, Arc::new(upstream(&config)), store).unwrap();

    let report = crawler.run(&targets(&["4"])).await.unwrap();
    assert_eq!(report.failed.len(), 1);
}

async fn mount_review_page(server: &MockServer, first: &str, count: usize) {
    let reviews: Vec<Value> = (0..count).map(|i| json!({"id": format!("{}-{}", first, i)})).collect();
    Mock::given(method("GET"))
        .and(path("/core/api/reviews/item/R1"))
        .and(query_param("first", first))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"item": {"refNum": "R1"}, "reviews": reviews}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_review_crawl_pages_until_short_page() {
    let server = MockServer::start().await;
    mount_review_page(&server, "0", 2).await;
    mount_review_page(&server, "2", 2).await;
    mount_review_page(&server, "4", 1).await;

    let mut config = config_for(&[server.uri()]);
    config.crawler.mode = CrawlerMode::Reviews;
    let store = Arc::new(MemoryStore::new());
    let crawler = select_crawler(&config, Arc::new(upstream(&config)), store.clone()).unwrap();
    assert_eq!(crawler.name(), "reviews");

    let report = crawler.run(&targets(&["R1"])).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let stored: Value = get_json(store.as_ref(), &reviews_key("R1")).unwrap().unwrap();
    assert_eq!(stored["reviews"].as_array().unwrap().len(), 5);
    assert_eq!(stored["pages"], 3);
    assert_eq!(stored["complete"], true);
    assert_eq!(stored["item"]["refNum"], "R1");
}

#[tokio::test]
async fn test_review_crawl_respects_page_limit() {
    let server = MockServer::start().await;
    mount_review_page(&server, "0", 2).await;
    mount_review_page(&server, "2", 2).await;

    let mut config = config_for(&[server.uri()]);
    config.crawler.mode = CrawlerMode::Reviews;
    config.crawler.max_review_pages = 2;

    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn BlobStore> = Arc::new(SqliteStore::new(&dir.path().join("mirror.db")).unwrap());
    let crawler = select_crawler(&config, Arc::new(upstream(&config)), store.clone()).unwrap();

    let report = crawler.run(&targets(&["R1"])).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let stored: Value = get_json(store.as_ref(), &reviews_key("R1")).unwrap().unwrap();
    assert_eq!(stored["pages"], 2);
    assert_eq!(stored["complete"], false);
    assert_eq!(stored["reviews"].as_array().unwrap().len(), 4);
}
