//! The fetch → evaluate → render loop and its retry policy.

use std::sync::Arc;
use std::time::Duration;

use busboard_core::config::MonitorConfig;
use busboard_core::estimator::Estimator;
use busboard_core::model::TrackedService;
use busboard_core::ports::{DisplaySink, SinkError, VehicleFeed};
use chrono::{Local, Utc};
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::frame::{FrameView, Renderer};

/// Exponential fetch backoff: base interval, doubling, bounded by a cap.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    base: Duration,
    cap: Duration,
    current: Option<Duration>,
}

impl Backoff {
    /// Create a backoff starting at `base` and never exceeding `cap`.
    #[must_use]
    pub(crate) const fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            current: None,
        }
    }

    /// Delay to wait after one more consecutive failure.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => self.base,
            Some(previous) => self.cap.min(previous.saturating_mul(2)),
        };
        self.current = Some(delay);
        delay
    }

    /// A success puts the next failure back at the base interval.
    pub(crate) fn reset(&mut self) {
        self.current = None;
    }
}

/// Owns one polling cycle end to end; strictly sequential, never overlapping.
pub(crate) struct MonitorLoop {
    feed: Arc<dyn VehicleFeed>,
    sink: Box<dyn DisplaySink>,
    estimator: Estimator,
    renderer: Renderer,
    services: Vec<TrackedService>,
    poll_interval: Duration,
    backoff: Backoff,
}

impl MonitorLoop {
    /// Wire up the loop from the resolved configuration.
    #[must_use]
    pub(crate) fn new(
        config: &MonitorConfig,
        feed: Arc<dyn VehicleFeed>,
        sink: Box<dyn DisplaySink>,
    ) -> Self {
        let poll_interval = Duration::from_secs(config.poll_interval_secs);
        Self {
            feed,
            sink,
            estimator: Estimator::new(config),
            renderer: Renderer::new(config),
            services: config.services.clone(),
            poll_interval,
            backoff: Backoff::new(poll_interval, Duration::from_secs(config.max_backoff_secs)),
        }
    }

    /// Run until the shutdown signal flips.
    ///
    /// Fetch failures are rendered as a status frame and retried with
    /// backoff; they never escape this function. The shutdown signal is
    /// observed between phases, never mid-render.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] only if the display cannot be initialized at
    /// startup.
    pub(crate) async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), SinkError> {
        self.sink.initialize()?;
        info!(interval_secs = self.poll_interval.as_secs(), "entering monitor loop");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let cycle_started = Instant::now();
            let fetched_ok = self.cycle().await;

            if *shutdown.borrow() {
                break;
            }

            // fixed cadence between cycle starts on success; backoff after a
            // failed fetch
            let delay = if fetched_ok {
                self.backoff.reset();
                self.poll_interval.saturating_sub(cycle_started.elapsed())
            } else {
                self.backoff.next_delay()
            };

            tokio::select! {
                () = sleep(delay) => {}
                changed = shutdown.changed() => {
                    // a dropped sender means nobody can ask us to stop again;
                    // treat it as a shutdown request rather than spinning
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        let farewell = self.renderer.compose(&FrameView::ShuttingDown, Local::now());
        if let Err(err) = self.renderer.present(farewell, self.sink.as_mut()) {
            warn!(error = %err, "could not draw the shutdown frame");
        }
        info!("monitor loop stopped");
        Ok(())
    }

    /// Run exactly one fetch → evaluate → render cycle, then stop.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] only if the display cannot be initialized.
    pub(crate) async fn run_once(mut self) -> Result<(), SinkError> {
        self.sink.initialize()?;
        self.cycle().await;
        Ok(())
    }

    /// One cycle. Returns whether the fetch succeeded, for backoff control.
    async fn cycle(&mut self) -> bool {
        match self.feed.fetch(&self.services).await {
            Ok(positions) => {
                let estimates = self.estimator.evaluate(&positions, &self.services, Utc::now());
                info!(
                    reported = positions.len(),
                    shown = estimates.len(),
                    "cycle complete"
                );
                for estimate in &estimates {
                    info!(
                        service = %estimate.service,
                        vehicle = estimate.vehicle_ref.as_deref().unwrap_or("?"),
                        meters = estimate.distance_meters.round(),
                        eta = %estimate.eta,
                        "tracked vehicle"
                    );
                }

                let view = if positions.is_empty() {
                    FrameView::NoData
                } else if estimates.is_empty() {
                    FrameView::NothingTracked
                } else {
                    FrameView::Arrivals(&estimates)
                };
                let frame = self.renderer.compose(&view, Local::now());
                if let Err(err) = self.renderer.present(frame, self.sink.as_mut()) {
                    warn!(error = %err, "display present failed; retrying next cycle");
                }
                true
            }
            Err(err) => {
                warn!(error = %err, "fetch failed; backing off");
                let frame = self.renderer.compose(&FrameView::NetworkError, Local::now());
                if let Err(sink_err) = self.renderer.present(frame, self.sink.as_mut()) {
                    warn!(error = %sink_err, "display present failed; retrying next cycle");
                }
                false
            }
        }
    }
}
