//! Per-episode status and error aggregation.
//!
//! Jobs report into a [`StatusAggregator`] from their worker threads. Records
//! and the error log live behind one mutex that only covers mutation and the
//! snapshot; drawing happens on a dedicated render thread, so a slow sink
//! never holds up a job's progress.

pub mod render;
mod types;

pub use render::{render_table, LogSink, NullSink, StatusSink, TableSink};
pub use types::*;

use crate::scanner::{EpisodeNumber, MediaFile};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Message from the aggregator to its render thread.
struct RenderEvent {
    update: StatusUpdate,
    rows: Vec<StatusRecord>,
}

struct Inner {
    records: BTreeMap<EpisodeNumber, StatusRecord>,
    errors: Vec<ErrorRecord>,
    render_tx: Option<Sender<RenderEvent>>,
}

/// Thread-safe store of per-episode status history and the global error log.
pub struct StatusAggregator {
    inner: Mutex<Inner>,
    renderer: Mutex<Option<JoinHandle<()>>>,
}

impl StatusAggregator {
    /// Create an aggregator drawing to `sink`. `header` is shown above the
    /// table by sinks that draw one.
    pub fn new(sink: Arc<dyn StatusSink>, header: impl Into<String>) -> Arc<Self> {
        let (render_tx, render_rx) = mpsc::channel();
        let header = header.into();

        let renderer = std::thread::Builder::new()
            .name("seasonmux-render".to_string())
            .spawn(move || render_loop(render_rx, sink.as_ref(), &header));

        let (render_tx, renderer) = match renderer {
            Ok(handle) => (Some(render_tx), Some(handle)),
            Err(e) => {
                warn!("Failed to start status renderer, status will not be drawn: {}", e);
                (None, None)
            }
        };

        Arc::new(Self {
            inner: Mutex::new(Inner {
                records: BTreeMap::new(),
                errors: Vec::new(),
                render_tx,
            }),
            renderer: Mutex::new(renderer),
        })
    }

    /// Append `label` to the episode's history, creating the record on first
    /// report, and queue a redraw.
    pub fn report(&self, episode: &EpisodeNumber, label: &str, files: &[MediaFile]) {
        debug!("[{}] {}", episode, label);

        let mut inner = self.inner.lock();
        match inner.records.get_mut(episode) {
            Some(record) => record.push(label, files),
            None => {
                inner
                    .records
                    .insert(episode.clone(), StatusRecord::new(episode.clone(), label, files));
            }
        }

        // Sent under the lock so the render thread sees reports in order.
        if let Some(ref tx) = inner.render_tx {
            let event = RenderEvent {
                update: StatusUpdate {
                    episode: episode.clone(),
                    label: label.to_string(),
                    files: files.iter().map(|f| f.display_path()).collect(),
                },
                rows: inner.records.values().cloned().collect(),
            };
            if tx.send(event).is_err() {
                debug!("Status renderer has stopped; dropping redraw");
            }
        }
    }

    /// Append to the error log. Does not trigger a redraw.
    pub fn report_error(&self, error: ErrorRecord) {
        self.inner.lock().errors.push(error);
    }

    /// Every error recorded so far. The log is not cleared.
    pub fn drain_errors(&self) -> Vec<ErrorRecord> {
        self.inner.lock().errors.clone()
    }

    /// Snapshot of all records, sorted by episode number.
    pub fn records(&self) -> Vec<StatusRecord> {
        self.inner.lock().records.values().cloned().collect()
    }

    pub fn record(&self, episode: &EpisodeNumber) -> Option<StatusRecord> {
        self.inner.lock().records.get(episode).cloned()
    }

    /// Stop accepting redraws and wait until every queued one is drawn.
    ///
    /// Reports made afterwards still update the records but are not drawn.
    pub fn finish(&self) {
        // Dropping the sender ends the render loop once its queue is empty.
        self.inner.lock().render_tx = None;

        if let Some(handle) = self.renderer.lock().take() {
            if handle.join().is_err() {
                warn!("Status renderer panicked");
            }
        }
    }
}

impl Drop for StatusAggregator {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Feed every update to the sink, but draw only the newest snapshot of each
/// batch; older snapshots are already stale.
fn render_loop(rx: Receiver<RenderEvent>, sink: &dyn StatusSink, header: &str) {
    while let Ok(first) = rx.recv() {
        sink.on_update(&first.update);
        let mut latest = first.rows;

        for event in rx.try_iter() {
            sink.on_update(&event.update);
            latest = event.rows;
        }

        sink.render(header, &latest);
    }
}
