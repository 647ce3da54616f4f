//! Integration tests for the BODS feed client (wiremock-based)

use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use busboard_core::config::MonitorConfig;
use busboard_core::model::TrackedService;
use busboard_core::ports::{FeedError, VehicleFeed};
use busboard_provider_bods::BodsFeed;

fn config_for_mock(base_url: &str) -> MonitorConfig {
    MonitorConfig {
        feed_url: base_url.to_owned(),
        ..MonitorConfig::for_testing()
    }
}

fn feed_for_mock(server: &MockServer) -> BodsFeed {
    BodsFeed::new(reqwest::Client::new(), &config_for_mock(&server.uri()))
}

fn tracked(line: &str, origin: &str, destination: &str) -> TrackedService {
    TrackedService {
        line_ref: line.to_owned(),
        origin_code: origin.to_owned(),
        destination_code: destination.to_owned(),
    }
}

fn activity_json(line: &str, vehicle: &str, latitude: f64) -> String {
    format!(
        r#"{{
            "Siri": {{
                "ServiceDelivery": {{
                    "VehicleMonitoringDelivery": [{{
                        "VehicleActivity": [{{
                            "RecordedAtTime": "2026-08-06T08:59:52+00:00",
                            "MonitoredVehicleJourney": {{
                                "LineRef": "{line}",
                                "OriginRef": "249000000619",
                                "DestinationRef": "249000000700",
                                "VehicleRef": "{vehicle}",
                                "VehicleLocation": {{
                                    "Latitude": {latitude},
                                    "Longitude": 0.5421
                                }}
                            }}
                        }}]
                    }}]
                }}
            }}
        }}"#
    )
}

#[tokio::test]
async fn fetch_passes_credential_and_journey_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("lineRef", "1"))
        .and(query_param("originRef", "249000000619"))
        .and(query_param("destinationRef", "249000000700"))
        .respond_with(ResponseTemplate::new(200).set_body_string(activity_json("1", "A1", 51.39)))
        .expect(1)
        .mount(&server)
        .await;

    let feed = feed_for_mock(&server);
    let positions = feed
        .fetch(&[tracked("1", "249000000619", "249000000700")])
        .await
        .unwrap();

    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].vehicle_ref.as_deref(), Some("A1"));
}

#[tokio::test]
async fn fetch_combines_batches_across_services() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("lineRef", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(activity_json("1", "A1", 51.39)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("lineRef", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(activity_json("7", "B2", 51.40)))
        .mount(&server)
        .await;

    let feed = feed_for_mock(&server);
    let positions = feed
        .fetch(&[
            tracked("1", "249000000619", "249000000700"),
            tracked("7", "249000000619", "249000000700"),
        ])
        .await
        .unwrap();

    assert_eq!(positions.len(), 2);
    let lines: Vec<&str> = positions
        .iter()
        .map(|position| position.line_ref.as_str())
        .collect();
    assert_eq!(lines, vec!["1", "7"]);
}

#[tokio::test]
async fn rejected_credential_maps_to_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let feed = feed_for_mock(&server);
    let result = feed
        .fetch(&[tracked("1", "249000000619", "249000000700")])
        .await;

    assert!(matches!(result, Err(FeedError::Auth { status: 401 })));
}

#[tokio::test]
async fn server_error_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let feed = feed_for_mock(&server);
    let result = feed
        .fetch(&[tracked("1", "249000000619", "249000000700")])
        .await;

    assert!(matches!(result, Err(FeedError::Provider(_))));
}

#[tokio::test]
async fn undecodable_body_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not the feed</html>"))
        .mount(&server)
        .await;

    let feed = feed_for_mock(&server);
    let result = feed
        .fetch(&[tracked("1", "249000000619", "249000000700")])
        .await;

    assert!(matches!(result, Err(FeedError::Provider(_))));
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_network_error() {
    // nothing listens on this port
    let config = config_for_mock("http://127.0.0.1:9");
    let feed = BodsFeed::new(reqwest::Client::new(), &config);

    let result = feed
        .fetch(&[tracked("1", "249000000619", "249000000700")])
        .await;

    assert!(matches!(result, Err(FeedError::Network(_))));
}

#[tokio::test]
async fn empty_feed_is_ok_with_no_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{ "Siri": { "ServiceDelivery": { "VehicleMonitoringDelivery": [] } } }"#,
        ))
        .mount(&server)
        .await;

    let feed = feed_for_mock(&server);
    let positions = feed
        .fetch(&[tracked("1", "249000000619", "249000000700")])
        .await
        .unwrap();

    assert!(positions.is_empty());
}
