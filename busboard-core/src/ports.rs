//! Traits describing the boundaries to the vehicle feed and the display.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{TrackedService, VehiclePosition};

#[derive(thiserror::Error, Debug)]
/// Errors from a single fetch attempt against the vehicle feed.
pub enum FeedError {
    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("network error: {0}")]
    Network(#[from] ReqwestError),
    /// The provider rejected the credential.
    #[error("feed credential rejected (HTTP {status})")]
    Auth {
        /// HTTP status the provider answered with.
        status: u16,
    },
    /// The provider answered, but not with anything usable.
    #[error("unexpected feed response: {0}")]
    Provider(String),
}

#[async_trait]
/// A provider of live vehicle positions for a set of tracked services.
pub trait VehicleFeed: Send + Sync {
    /// Fetch current positions for the given services.
    ///
    /// A single attempt: it either succeeds with zero or more records or
    /// fails with a typed error. Retry policy belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`] when the provider is unreachable, rejects the
    /// credential, or answers with an undecodable body.
    async fn fetch(
        &self,
        services: &[TrackedService],
    ) -> Result<Vec<VehiclePosition>, FeedError>;
}

#[derive(thiserror::Error, Debug)]
/// Errors reported by a display sink.
pub enum SinkError {
    /// The underlying transport (SPI, serial, terminal) reported a fault.
    #[error("display transport fault: {0}")]
    Transport(String),
    /// I/O failure while writing to the sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An imperative drawing surface with fixed character cells.
///
/// The hardware binding (display controller, SPI wiring) lives behind this
/// trait so the renderer and its tests never touch a physical transport.
pub trait DisplaySink {
    /// Bring the device to a known blank state.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the transport faults.
    fn initialize(&mut self) -> Result<(), SinkError>;

    /// Erase the current contents.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the transport faults.
    fn clear(&mut self) -> Result<(), SinkError>;

    /// Draw text starting at the given row and column.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the transport faults.
    fn draw_text(&mut self, row: u16, col: u16, text: &str) -> Result<(), SinkError>;

    /// Make everything drawn since the last clear visible.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the transport faults.
    fn show(&mut self) -> Result<(), SinkError>;
}
