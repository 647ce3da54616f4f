//! Frame composition and presentation for the character-cell display.

use busboard_core::config::MonitorConfig;
use busboard_core::model::ArrivalEstimate;
use busboard_core::ports::{DisplaySink, SinkError};
use chrono::{DateTime, Local};

/// What the current cycle wants on the display.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FrameView<'a> {
    /// Ranked arrival estimates, nearest first.
    Arrivals(&'a [ArrivalEstimate]),
    /// The feed answered but carried no vehicle records at all.
    NoData,
    /// Records came back but none matched a tracked service.
    NothingTracked,
    /// The last fetch attempt failed.
    NetworkError,
    /// The process is about to stop.
    ShuttingDown,
}

/// One fully laid out display refresh: a header plus content rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DisplayFrame {
    /// Clock and stop name, always on row 0.
    pub header: String,
    /// Content rows, already truncated to the display budget.
    pub lines: Vec<String>,
}

/// Maps views onto frames and frames onto a sink, skipping unchanged frames.
pub(crate) struct Renderer {
    stop_name: String,
    rows: usize,
    last: Option<DisplayFrame>,
}

impl Renderer {
    /// Build a renderer for the configured stop and row budget.
    #[must_use]
    pub(crate) fn new(config: &MonitorConfig) -> Self {
        Self {
            stop_name: config.stop.name.clone(),
            rows: config.display_rows,
            last: None,
        }
    }

    /// Lay out a view as a frame. Pure: same view and clock, same frame.
    #[must_use]
    pub(crate) fn compose(&self, view: &FrameView<'_>, now: DateTime<Local>) -> DisplayFrame {
        let header = format!("{}  {}", now.format("%H:%M"), self.stop_name);

        let lines = match view {
            FrameView::Arrivals(estimates) => arrival_lines(estimates, self.rows),
            FrameView::NoData => vec!["no data".to_owned()],
            FrameView::NothingTracked => vec!["no buses tracked".to_owned()],
            FrameView::NetworkError => vec!["network error".to_owned()],
            FrameView::ShuttingDown => vec!["shutting down".to_owned()],
        };

        DisplayFrame { header, lines }
    }

    /// Issue a frame to the sink: clear, draw rows, show.
    ///
    /// A frame identical to the previously presented one is skipped to limit
    /// flicker and transport traffic; the return value says whether the sink
    /// was actually touched.
    ///
    /// # Errors
    ///
    /// Returns the sink's [`SinkError`]. The previous frame is forgotten on
    /// failure so the next cycle redraws from scratch.
    pub(crate) fn present(
        &mut self,
        frame: DisplayFrame,
        sink: &mut dyn DisplaySink,
    ) -> Result<bool, SinkError> {
        if self.last.as_ref() == Some(&frame) {
            return Ok(false);
        }
        self.last = None;

        sink.clear()?;
        sink.draw_text(0, 0, &frame.header)?;
        for (index, line) in frame.lines.iter().enumerate() {
            let row = u16::try_from(index + 1).unwrap_or(u16::MAX);
            sink.draw_text(row, 0, line)?;
        }
        sink.show()?;

        self.last = Some(frame);
        Ok(true)
    }
}

fn arrival_lines(estimates: &[ArrivalEstimate], rows: usize) -> Vec<String> {
    if estimates.len() <= rows {
        return estimates
            .iter()
            .enumerate()
            .map(|(index, estimate)| arrival_line(index, estimate))
            .collect();
    }

    // keep one row for the overflow indicator
    let shown = rows.saturating_sub(1);
    let mut lines: Vec<String> = estimates
        .iter()
        .take(shown)
        .enumerate()
        .map(|(index, estimate)| arrival_line(index, estimate))
        .collect();
    lines.push(format!("+{} more", estimates.len() - shown));
    lines
}

fn arrival_line(index: usize, estimate: &ArrivalEstimate) -> String {
    format!(
        "{} #{:<4} {:>6}  {}",
        index + 1,
        estimate.service.line_ref,
        format_distance(estimate.distance_meters),
        estimate.eta
    )
}

fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{meters:.0}m")
    } else {
        format!("{:.1}km", meters / 1_000.0)
    }
}
