//! Progress/log transport between background jobs and the owning thread.
//!
//! Single producer per job, single consumer. The consumer drains on a fixed
//! tick; intermediate progress values are coalesced to the last one queued,
//! while log lines and lifecycle events are delivered in order, none dropped.

use crate::model::AppEvent;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Handle given to background jobs for reporting progress and log lines.
///
/// All sends are best-effort: a consumer torn down mid-job must never panic
/// the producer, so delivery failures are swallowed.
#[derive(Clone)]
pub struct Reporter {
    tx: UnboundedSender<AppEvent>,
}

impl Reporter {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Report progress in [0, 100]. Values above 100 are clamped.
    pub fn progress(&self, pct: u8) {
        let _ = self.tx.send(AppEvent::Progress { pct: pct.min(100) });
    }

    /// Append a line to the log surface.
    pub fn log(&self, line: impl Into<String>) {
        let _ = self.tx.send(AppEvent::Log { line: line.into() });
    }
}

/// Everything pulled out of the channel in one drain pass.
pub struct Drained {
    /// Last progress value queued since the previous drain, if any.
    pub progress: Option<u8>,
    /// All non-progress events, in queue order.
    pub events: Vec<AppEvent>,
}

/// Drain all queued events without blocking.
///
/// Only the last progress value wins per drain; a fast producer cannot flood
/// the display with intermediate values. Everything else keeps its order.
pub fn drain(rx: &mut UnboundedReceiver<AppEvent>) -> Drained {
    let mut progress = None;
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        match ev {
            AppEvent::Progress { pct } => progress = Some(pct),
            other => events.push(other),
        }
    }
    Drained { progress, events }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn drain_keeps_last_progress_value() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = Reporter::new(tx);
        for pct in [5u8, 40, 17, 99] {
            reporter.progress(pct);
        }
        let drained = drain(&mut rx);
        assert_eq!(drained.progress, Some(99));
        assert!(drained.events.is_empty());
    }

    #[test]
    fn drain_preserves_log_order_around_progress() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = Reporter::new(tx);
        reporter.log("first");
        reporter.progress(10);
        reporter.log("second");
        reporter.progress(20);
        reporter.log("third");

        let drained = drain(&mut rx);
        assert_eq!(drained.progress, Some(20));
        let lines: Vec<_> = drained
            .events
            .iter()
            .map(|ev| match ev {
                AppEvent::Log { line } => line.as_str(),
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(lines, ["first", "second", "third"]);
    }

    #[test]
    fn progress_clamps_above_hundred() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = Reporter::new(tx);
        reporter.progress(200);
        assert_eq!(drain(&mut rx).progress, Some(100));
    }

    #[test]
    fn send_after_consumer_drop_is_swallowed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Reporter::new(tx);
        drop(rx);
        reporter.progress(50);
        reporter.log("no receiver");
    }

    #[test]
    fn drain_on_empty_channel_is_empty() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
        let drained = drain(&mut rx);
        assert_eq!(drained.progress, None);
        assert!(drained.events.is_empty());
    }
}
