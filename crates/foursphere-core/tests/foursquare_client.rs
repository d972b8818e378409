//! Integration tests for `FoursquareClient::fetch_nearby` and `HttpProbe`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made.

use std::net::TcpListener;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foursphere_core::api::{ClientSettings, FetchError, FoursquareClient, VenueSource};
use foursphere_core::connectivity::{ConnectivityGate, HttpProbe};
use foursphere_core::models::Coordinate;
use foursphere_core::parser;

fn test_client(base_url: &str) -> FoursquareClient {
    FoursquareClient::new(ClientSettings {
        base_url: format!("{base_url}/v2"),
        client_id: Some("test-id".to_string()),
        client_secret: Some("test-secret".to_string()),
        request_timeout: Duration::from_secs(5),
        ..ClientSettings::default()
    })
    .expect("failed to build test FoursquareClient")
}

/// A loopback URI nothing listens on. Dropped `MockServer`s are pooled and
/// still answer, so they cannot stand in for a dead host.
fn closed_port_uri() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn here() -> Coordinate {
    Coordinate::new(40.7128, -74.006)
}

fn explore_body() -> serde_json::Value {
    json!({
        "meta": {"code": 200},
        "response": {"groups": [{"items": [
            {"venue": {
                "id": "v1",
                "name": "Corner Deli",
                "location": {"lat": 40.713, "lng": -74.0061},
                "categories": [{"shortName": "Deli"}],
                "photos": {"count": 1, "groups": [{"items": [
                    {"prefix": "https://img.example/", "suffix": "/a.jpg", "width": 300, "height": 200}
                ]}]},
                "hours": {"isOpen": true}
            }}
        ]}]}
    })
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_nearby_sends_explore_query_and_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/venues/explore"))
        .and(query_param("client_id", "test-id"))
        .and(query_param("client_secret", "test-secret"))
        .and(query_param("v", "20130815"))
        .and(query_param("ll", "40.7128,-74.006"))
        .and(query_param("venuePhotos", "1"))
        .and(query_param("query", "food"))
        .respond_with(ResponseTemplate::new(200).set_body_json(explore_body()))
        .expect(1)
        .mount(&server)
        .await;

    let raw = test_client(&server.uri())
        .fetch_nearby(here(), "food")
        .await
        .expect("fetch should succeed");
    assert!(raw.is_success());

    let venues = parser::parse(&raw).expect("body should parse");
    assert_eq!(venues.len(), 1);
    assert_eq!(venues[0].id, "v1");
    assert_eq!(venues[0].category, "Deli");
    assert_eq!(
        venues[0].photo_url.as_deref(),
        Some("https://img.example/300x200/a.jpg")
    );
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_nearby_reports_http_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/venues/explore"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_nearby(here(), "food")
        .await
        .expect_err("500 should fail");
    match err {
        FetchError::ServerRejected { code, detail } => {
            assert_eq!(code, "500");
            assert!(detail.contains("upstream exploded"));
        }
        other => panic!("expected ServerRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_nearby_reports_meta_rejection_inside_ok_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/venues/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"code": 400, "errorType": "param_error", "errorDetail": "Must provide ll"}
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_nearby(here(), "food")
        .await
        .expect_err("meta code 400 should fail");
    match err {
        FetchError::ServerRejected { code, detail } => {
            assert_eq!(code, "400");
            assert_eq!(detail, "Must provide ll");
        }
        other => panic!("expected ServerRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_nearby_rejects_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/venues/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captive portal</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_nearby(here(), "food")
        .await
        .expect_err("html should fail");
    assert!(matches!(err, FetchError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn fetch_nearby_rejects_body_without_meta() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/venues/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": {}})))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_nearby(here(), "food")
        .await
        .expect_err("missing meta should fail");
    assert!(matches!(err, FetchError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn fetch_nearby_reports_unreachable_host_as_no_response() {
    let err = test_client(&closed_port_uri())
        .fetch_nearby(here(), "food")
        .await
        .expect_err("closed port should fail");
    assert!(matches!(err, FetchError::NoResponse(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Connectivity probe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_probe_treats_any_response_as_online() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(server.uri(), Duration::from_secs(2)).expect("build probe");
    assert!(probe.is_online().await);
}

#[tokio::test]
async fn http_probe_treats_unreachable_host_as_offline() {
    let probe = HttpProbe::new(closed_port_uri(), Duration::from_secs(2)).expect("build probe");
    assert!(!probe.is_online().await);
}
