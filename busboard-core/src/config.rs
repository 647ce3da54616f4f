//! Resolved runtime configuration for the stop monitor.
//!
//! The binary reads this from a TOML file; the core only ever sees the
//! resolved value. Everything here is immutable after startup.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo::GeoError;
use crate::model::{Cardinal, Coordinate, TrackedService};

#[derive(thiserror::Error, Debug)]
/// Configuration problems that are fatal at startup.
pub enum ConfigError {
    /// The feed credential is missing.
    #[error("api_key must not be empty")]
    MissingApiKey,
    /// The feed endpoint is missing.
    #[error("feed_url must not be empty")]
    MissingFeedUrl,
    /// The reference coordinate is malformed.
    #[error("stop coordinate out of range: {0}")]
    InvalidReference(#[from] GeoError),
    /// No services configured to track.
    #[error("at least one tracked service is required")]
    NoServices,
    /// The same (line, origin, destination) tuple appears twice.
    #[error("duplicate tracked service: {0}")]
    DuplicateService(TrackedService),
    /// A numeric setting that must be positive is zero.
    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// The bus stop being watched.
pub struct StopConfig {
    /// Human-readable stop name, shown in the frame header.
    pub name: String,
    /// Stop latitude in decimal degrees.
    pub latitude: f64,
    /// Stop longitude in decimal degrees.
    pub longitude: f64,
}

impl StopConfig {
    /// The stop's position as a coordinate.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Full resolved configuration consumed by every component.
pub struct MonitorConfig {
    /// Credential for the vehicle feed.
    pub api_key: String,

    /// Base URL of the vehicle-monitoring endpoint.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// The reference stop.
    pub stop: StopConfig,

    /// Services to track, matched by exact (line, origin, destination) tuple.
    pub services: Vec<TrackedService>,

    /// Seconds between cycle starts in continuous mode.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Position reports older than this many seconds are discarded.
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: u64,

    /// Content rows available on the display, excluding the header.
    #[serde(default = "default_display_rows")]
    pub display_rows: usize,

    /// Upper bound on the fetch retry backoff, in seconds.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Drop vehicles in this quadrant relative to the stop (already passed).
    #[serde(default)]
    pub ignore_direction: Option<Cardinal>,
}

fn default_feed_url() -> String {
    "https://data.bus-data.dft.gov.uk/api/v1/datafeed".to_owned()
}

const fn default_poll_interval_secs() -> u64 {
    30
}

// three poll intervals: a report can miss two polls before it is distrusted
const fn default_staleness_secs() -> u64 {
    90
}

const fn default_display_rows() -> usize {
    3
}

const fn default_max_backoff_secs() -> u64 {
    300
}

const fn default_timeout_secs() -> u64 {
    10
}

impl MonitorConfig {
    /// Validate the resolved configuration before the loop starts.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; any error here means the
    /// process should exit non-zero without entering the loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.feed_url.trim().is_empty() {
            return Err(ConfigError::MissingFeedUrl);
        }

        self.stop.coordinate().validate()?;

        if self.services.is_empty() {
            return Err(ConfigError::NoServices);
        }
        let mut seen = HashSet::new();
        for service in &self.services {
            if !seen.insert(service) {
                return Err(ConfigError::DuplicateService(service.clone()));
            }
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::NotPositive("poll_interval_secs"));
        }
        if self.staleness_secs == 0 {
            return Err(ConfigError::NotPositive("staleness_secs"));
        }
        if self.display_rows == 0 {
            return Err(ConfigError::NotPositive("display_rows"));
        }
        if self.max_backoff_secs == 0 {
            return Err(ConfigError::NotPositive("max_backoff_secs"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::NotPositive("timeout_secs"));
        }

        Ok(())
    }

    /// A valid configuration for tests, tracking one service at the default
    /// reference stop.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            api_key: "test-key".to_owned(),
            feed_url: default_feed_url(),
            stop: StopConfig {
                name: "The Strand".to_owned(),
                latitude: 51.396_730_9,
                longitude: 0.539_095_2,
            },
            services: vec![TrackedService {
                line_ref: "1".to_owned(),
                origin_code: "249000000619".to_owned(),
                destination_code: "249000000700".to_owned(),
            }],
            poll_interval_secs: default_poll_interval_secs(),
            staleness_secs: default_staleness_secs(),
            display_rows: default_display_rows(),
            max_backoff_secs: default_max_backoff_secs(),
            timeout_secs: default_timeout_secs(),
            ignore_direction: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_config_is_valid() {
        assert!(MonitorConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn rejects_empty_api_key() {
        let config = MonitorConfig {
            api_key: "  ".to_owned(),
            ..MonitorConfig::for_testing()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn rejects_reference_out_of_range() {
        let mut config = MonitorConfig::for_testing();
        config.stop.latitude = 123.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidReference(_))
        ));
    }

    #[test]
    fn rejects_empty_service_list() {
        let config = MonitorConfig {
            services: Vec::new(),
            ..MonitorConfig::for_testing()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoServices)));
    }

    #[test]
    fn rejects_duplicate_service_tuple() {
        let mut config = MonitorConfig::for_testing();
        let duplicate = config.services[0].clone();
        config.services.push(duplicate);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateService(_))
        ));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let config = MonitorConfig {
            poll_interval_secs: 0,
            ..MonitorConfig::for_testing()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive("poll_interval_secs"))
        ));
    }

    #[test]
    fn deserializes_from_toml_with_defaults() {
        let raw = r#"
            api_key = "secret"

            [stop]
            name = "The Strand"
            latitude = 51.3967309
            longitude = 0.5390952

            [[services]]
            line_ref = "1"
            origin_code = "249000000619"
            destination_code = "249000000700"
        "#;

        let config: MonitorConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.staleness_secs, 90);
        assert_eq!(config.display_rows, 3);
        assert!(config.ignore_direction.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_ignore_direction() {
        let raw = r#"
            api_key = "secret"
            ignore_direction = "west"

            [stop]
            name = "s"
            latitude = 51.0
            longitude = 0.5

            [[services]]
            line_ref = "1"
            origin_code = "a"
            destination_code = "b"
        "#;

        let config: MonitorConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.ignore_direction, Some(Cardinal::West));
    }
}
