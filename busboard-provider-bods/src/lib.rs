//! Vehicle feed client for BODS-style open-data endpoints.
//!
//! Speaks the SIRI-VM JSON rendering: one GET per tracked service, with the
//! API key and the journey filters as query parameters. Records that lack
//! line identity, a position, or a timestamp are skipped rather than failing
//! the batch; retry policy belongs entirely to the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use busboard_core::{
    config::MonitorConfig,
    model::{Coordinate, TrackedService, VehiclePosition},
    ports::{FeedError, VehicleFeed},
};

/// Feed client bound to one BODS-style datafeed endpoint.
pub struct BodsFeed {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BodsFeed {
    /// Create a feed client sharing the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: &MonitorConfig) -> Self {
        Self {
            client,
            base_url: config.feed_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn fetch_service(
        &self,
        service: &TrackedService,
    ) -> Result<Vec<VehiclePosition>, FeedError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("lineRef", service.line_ref.as_str()),
                ("originRef", service.origin_code.as_str()),
                ("destinationRef", service.destination_code.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FeedError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FeedError::Provider(format!("HTTP {status}")));
        }

        let body = response.text().await?;
        parse_feed(&body)
    }
}

#[async_trait]
impl VehicleFeed for BodsFeed {
    async fn fetch(
        &self,
        services: &[TrackedService],
    ) -> Result<Vec<VehiclePosition>, FeedError> {
        let mut positions = Vec::new();

        for service in services {
            let mut batch = self.fetch_service(service).await?;
            debug!(service = %service, count = batch.len(), "fetched vehicle activity");
            positions.append(&mut batch);
        }

        Ok(positions)
    }
}

/// Decode a SIRI-VM JSON body into normalized positions.
///
/// # Errors
///
/// Returns [`FeedError::Provider`] when the body is not the expected shape.
/// Individual activities with missing fields are skipped, not fatal.
fn parse_feed(body: &str) -> Result<Vec<VehiclePosition>, FeedError> {
    let raw: RawFeedResponse =
        serde_json::from_str(body).map_err(|err| FeedError::Provider(err.to_string()))?;

    let activities = raw
        .siri
        .service_delivery
        .map(|delivery| delivery.vehicle_monitoring_delivery)
        .unwrap_or_default()
        .into_iter()
        .flat_map(|delivery| delivery.vehicle_activity);

    Ok(activities.filter_map(convert_activity).collect())
}

fn convert_activity(activity: RawVehicleActivity) -> Option<VehiclePosition> {
    let recorded_at = activity.recorded_at_time;
    let Some(journey) = activity.monitored_vehicle_journey else {
        warn!("skipping activity without a monitored journey");
        return None;
    };

    let (Some(recorded_at), Some(line_ref), Some(origin_code), Some(destination_code)) = (
        recorded_at,
        journey.line_ref,
        journey.origin_ref,
        journey.destination_ref,
    ) else {
        warn!("skipping activity with incomplete journey identity");
        return None;
    };

    let Some(location) = journey.vehicle_location else {
        warn!(line = %line_ref, "skipping activity without a location");
        return None;
    };
    let (Some(latitude), Some(longitude)) = (location.latitude, location.longitude) else {
        warn!(line = %line_ref, "skipping activity with a partial location");
        return None;
    };

    let position = Coordinate::new(latitude, longitude);
    if let Err(err) = position.validate() {
        warn!(line = %line_ref, error = %err, "skipping activity with malformed location");
        return None;
    }

    Some(VehiclePosition {
        line_ref,
        origin_code,
        destination_code,
        vehicle_ref: journey.vehicle_ref,
        position,
        recorded_at,
    })
}

// --- Raw SIRI-VM JSON types for deserialization ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawFeedResponse {
    siri: RawSiri,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSiri {
    service_delivery: Option<RawServiceDelivery>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawServiceDelivery {
    #[serde(default)]
    vehicle_monitoring_delivery: Vec<RawVehicleMonitoringDelivery>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVehicleMonitoringDelivery {
    #[serde(default)]
    vehicle_activity: Vec<RawVehicleActivity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVehicleActivity {
    recorded_at_time: Option<DateTime<Utc>>,
    monitored_vehicle_journey: Option<RawMonitoredVehicleJourney>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMonitoredVehicleJourney {
    line_ref: Option<String>,
    origin_ref: Option<String>,
    destination_ref: Option<String>,
    vehicle_ref: Option<String>,
    vehicle_location: Option<RawVehicleLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVehicleLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_body(activities: &str) -> String {
        format!(
            r#"{{
                "Siri": {{
                    "ServiceDelivery": {{
                        "ResponseTimestamp": "2026-08-06T09:00:00+00:00",
                        "VehicleMonitoringDelivery": [{{
                            "VehicleActivity": [{activities}]
                        }}]
                    }}
                }}
            }}"#
        )
    }

    const COMPLETE_ACTIVITY: &str = r#"{
        "RecordedAtTime": "2026-08-06T08:59:52+00:00",
        "MonitoredVehicleJourney": {
            "LineRef": "1",
            "OriginRef": "249000000619",
            "DestinationRef": "249000000700",
            "VehicleRef": "AKSS-6417",
            "VehicleLocation": { "Latitude": 51.3931, "Longitude": 0.5421 }
        }
    }"#;

    #[test]
    fn parses_complete_activity() {
        let positions = parse_feed(&feed_body(COMPLETE_ACTIVITY)).unwrap();

        assert_eq!(positions.len(), 1);
        let position = &positions[0];
        assert_eq!(position.line_ref, "1");
        assert_eq!(position.origin_code, "249000000619");
        assert_eq!(position.destination_code, "249000000700");
        assert_eq!(position.vehicle_ref.as_deref(), Some("AKSS-6417"));
        assert!((position.position.latitude - 51.3931).abs() < 1e-9);
    }

    #[test]
    fn skips_activity_without_location() {
        let no_location = r#"{
            "RecordedAtTime": "2026-08-06T08:59:52+00:00",
            "MonitoredVehicleJourney": {
                "LineRef": "1",
                "OriginRef": "249000000619",
                "DestinationRef": "249000000700"
            }
        }"#;

        let body = feed_body(&format!("{COMPLETE_ACTIVITY},{no_location}"));
        assert_eq!(parse_feed(&body).unwrap().len(), 1);
    }

    #[test]
    fn skips_activity_without_line_identity() {
        let no_line = r#"{
            "RecordedAtTime": "2026-08-06T08:59:52+00:00",
            "MonitoredVehicleJourney": {
                "OriginRef": "249000000619",
                "DestinationRef": "249000000700",
                "VehicleLocation": { "Latitude": 51.3931, "Longitude": 0.5421 }
            }
        }"#;

        assert!(parse_feed(&feed_body(no_line)).unwrap().is_empty());
    }

    #[test]
    fn skips_activity_without_timestamp() {
        let no_timestamp = r#"{
            "MonitoredVehicleJourney": {
                "LineRef": "1",
                "OriginRef": "249000000619",
                "DestinationRef": "249000000700",
                "VehicleLocation": { "Latitude": 51.3931, "Longitude": 0.5421 }
            }
        }"#;

        assert!(parse_feed(&feed_body(no_timestamp)).unwrap().is_empty());
    }

    #[test]
    fn skips_activity_with_out_of_range_location() {
        let bad_location = r#"{
            "RecordedAtTime": "2026-08-06T08:59:52+00:00",
            "MonitoredVehicleJourney": {
                "LineRef": "1",
                "OriginRef": "249000000619",
                "DestinationRef": "249000000700",
                "VehicleLocation": { "Latitude": 151.0, "Longitude": 0.5421 }
            }
        }"#;

        assert!(parse_feed(&feed_body(bad_location)).unwrap().is_empty());
    }

    #[test]
    fn empty_delivery_is_empty_batch() {
        let body = r#"{ "Siri": { "ServiceDelivery": { "VehicleMonitoringDelivery": [] } } }"#;
        assert!(parse_feed(body).unwrap().is_empty());
    }

    #[test]
    fn missing_service_delivery_is_empty_batch() {
        let body = r#"{ "Siri": {} }"#;
        assert!(parse_feed(body).unwrap().is_empty());
    }

    #[test]
    fn garbage_body_is_a_provider_error() {
        assert!(matches!(
            parse_feed("not json at all"),
            Err(FeedError::Provider(_))
        ));
    }
}
