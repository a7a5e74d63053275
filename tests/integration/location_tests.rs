use crate::common::{config_for, upstream};
use market_mirror::crawler::{LocationFilterOutcome, LocationForm};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn form() -> LocationForm {
    LocationForm {
        ships_to: "DE".to_string(),
        source_page: "/market".to_string(),
        fp: "abc123".to_string(),
    }
}

#[tokio::test]
async fn test_location_filter_applied() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/setLocationFilter"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"shipsTo\""))
        .and(body_string_contains("name=\"_sourcePage\""))
        .and(body_string_contains("name=\"__fp\""))
        .and(body_string_contains("abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let outcome = upstream(&config).apply_location_filter(&form()).await.unwrap();

    assert_eq!(outcome, LocationFilterOutcome::Applied { status: 200 });
}

#[tokio::test]
async fn test_location_filter_redirect_is_not_followed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/setLocationFilter"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let outcome = upstream(&config).apply_location_filter(&form()).await.unwrap();

    assert_eq!(
        outcome,
        LocationFilterOutcome::Redirected {
            status: 302,
            location: Some("/login".to_string()),
        }
    );
}

#[tokio::test]
async fn test_location_filter_client_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let err = upstream(&config).apply_location_filter(&form()).await.unwrap_err();

    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_location_cookie_is_sent_on_later_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/setLocationFilter"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "loc=DE; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/viewSubject/p/1"))
        .and(header("cookie", "loc=DE"))
        .respond_with(ResponseTemplate::new(200).set_body_string("filtered"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/viewSubject/p/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("unfiltered"))
        .mount(&server)
        .await;

    let config = config_for(&[server.uri()]);
    let client = upstream(&config);

    client.apply_location_filter(&form()).await.unwrap();
    let page = client.fetch_seller_page("1").await.unwrap();

    assert_eq!(page.html, "filtered");
}
