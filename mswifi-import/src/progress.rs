//! Progress and status reporting for long-running imports.

use serde::Serialize;
use tracing::{error, info, warn};

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Receiver of progress percentages and status lines.
///
/// Implementations must not block; callers report and move on.
pub trait StatusLogger {
    fn set_progress(&mut self, percent: u32);
    fn set_text(&mut self, text: &str, severity: Severity);
}

/// Forwards status lines to `tracing`. Progress is logged at debug level.
#[derive(Debug, Default)]
pub struct TracingStatus;

impl StatusLogger for TracingStatus {
    fn set_progress(&mut self, percent: u32) {
        tracing::debug!(percent, "progress");
    }

    fn set_text(&mut self, text: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("{text}"),
            Severity::Warning => warn!("{text}"),
            Severity::Error => error!("{text}"),
        }
    }
}

/// Keeps every report for later inspection.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RecordingStatus {
    pub progress: Vec<u32>,
    pub lines: Vec<(Severity, String)>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lines.iter().filter(|(s, _)| *s == severity).count()
    }

    pub fn last_progress(&self) -> Option<u32> {
        self.progress.last().copied()
    }
}

impl StatusLogger for RecordingStatus {
    fn set_progress(&mut self, percent: u32) {
        self.progress.push(percent);
    }

    fn set_text(&mut self, text: &str, severity: Severity) {
        self.lines.push((severity, text.to_string()));
    }
}

/// A slice `[start, start + width]` of the overall percentage that one step
/// reports into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    at: f64,
    end: f64,
}

impl Span {
    pub fn new(start: f64, width: f64) -> Self {
        Self {
            at: start,
            end: start + width,
        }
    }

    pub fn at(&self) -> f64 {
        self.at
    }

    pub fn remaining(&self) -> f64 {
        (self.end - self.at).max(0.0)
    }

    /// Split off the next `width` of this span as a sub-span.
    pub fn take(&mut self, width: f64) -> Span {
        let sub = Span::new(self.at, width.min(self.remaining()));
        self.at = sub.end;
        sub
    }

    /// Move forward by `amount` percentage points and report.
    pub fn advance(&mut self, amount: f64, status: &mut dyn StatusLogger) {
        self.at = (self.at + amount).min(self.end);
        status.set_progress(percent(self.at));
    }

    /// Jump to the end of the span and report.
    pub fn finish(&mut self, status: &mut dyn StatusLogger) {
        self.at = self.end;
        status.set_progress(percent(self.at));
    }

    pub fn report(&self, status: &mut dyn StatusLogger) {
        status.set_progress(percent(self.at));
    }
}

fn percent(value: f64) -> u32 {
    value.clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::{RecordingStatus, Severity, Span, StatusLogger};

    #[test]
    fn span_splits_into_thirds() {
        let mut status = RecordingStatus::new();
        let mut span = Span::new(20.0, 60.0);
        span.report(&mut status);
        span.advance(20.0, &mut status);
        span.advance(20.0, &mut status);
        span.finish(&mut status);
        assert_eq!(status.progress, vec![20, 40, 60, 80]);
    }

    #[test]
    fn advancing_never_leaves_the_span() {
        let mut status = RecordingStatus::new();
        let mut span = Span::new(90.0, 20.0);
        span.advance(50.0, &mut status);
        assert_eq!(status.last_progress(), Some(100));
    }

    #[test]
    fn take_hands_out_consecutive_sub_spans() {
        let mut span = Span::new(0.0, 100.0);
        let first = span.take(15.0);
        let second = span.take(25.0);
        assert_eq!(first.at(), 0.0);
        assert_eq!(second.at(), 15.0);
        assert_eq!(span.at(), 40.0);
    }

    #[test]
    fn recording_counts_by_severity() {
        let mut status = RecordingStatus::new();
        status.set_text("a", Severity::Info);
        status.set_text("b", Severity::Error);
        assert_eq!(status.count(Severity::Error), 1);
        assert_eq!(status.count(Severity::Warning), 0);
    }
}
