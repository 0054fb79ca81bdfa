//! Progress reporting for sweeps. The runner emits done/total in completion
//! order; the CLI consumes it through a sink.

use std::sync::Arc;

/// One progress update: how many units are done and the total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Sink for progress events. The runner calls this each time a unit completes.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Logs roughly every `percent_step` percent, plus the final event.
pub fn log_progress_sink(percent_step: usize) -> ProgressSink {
    let step = percent_step.clamp(1, 100);
    Arc::new(move |ev: ProgressEvent| {
        if should_report(ev, step) {
            tracing::info!(done = ev.done, total = ev.total, "progress");
        }
    })
}

fn should_report(ev: ProgressEvent, step: usize) -> bool {
    if ev.total == 0 {
        return false;
    }
    if ev.done >= ev.total {
        return true;
    }
    let bucket = |done: usize| done * 100 / ev.total / step;
    ev.done > 0 && bucket(ev.done) != bucket(ev.done - 1)
}
