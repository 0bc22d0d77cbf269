//! The bounded worker pool that ticks map instances concurrently.
//!
//! One dispatcher thread drains the FIFO submission queue and hands
//! each request to a worker over a zero-capacity channel, so it blocks
//! exactly until a worker slot frees — never on tick duration beyond
//! the N-in-flight cap, and never by polling. Workers run one tick to
//! completion, capture the first failure (error return or panic), and
//! keep going: one map's fault never stops other in-flight work.
//!
//! ```text
//! Submitters                Dispatcher               Workers (N)
//!     |                         |                        |
//!     |--schedule_update()----->| queue_rx.iter()        |
//!     |   [unbounded, FIFO]     | work_tx.send(req) ---->| tick to completion
//!     |                         |   [bounded(0): blocks  | record first error
//!     |--wait()                 |    until a worker      | pending -= 1
//!     |   blocks on pending==0  |    slot frees]         |
//! ```
//!
//! Per-map exclusivity is the caller's responsibility: the scheduler
//! does not deduplicate requests naming the same map. Callers must
//! never have two outstanding requests for one map instance.

use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use weald_core::{TickError, Tickable};

use crate::config::UpdaterConfig;

// ── Errors ───────────────────────────────────────────────────────

/// Error submitting an update request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// The updater has been deactivated.
    Deactivated,
    /// A previous tick failed; the captured error is propagated
    /// fail-fast instead of accepting more work.
    TickFailed(TickError),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deactivated => write!(f, "updater is deactivated"),
            Self::TickFailed(e) => write!(f, "previous tick failed: {e}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TickFailed(e) => Some(e),
            Self::Deactivated => None,
        }
    }
}

// ── Shared state ─────────────────────────────────────────────────

struct UpdateRequest {
    map: Arc<dyn Tickable>,
    elapsed: Duration,
}

struct Shared {
    /// Live work: submitted requests not yet completed or dropped.
    pending: Mutex<usize>,
    drained: Condvar,
    cancelled: AtomicBool,
    first_error: Mutex<Option<TickError>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            pending: Mutex::new(0),
            drained: Condvar::new(),
            cancelled: AtomicBool::new(false),
            first_error: Mutex::new(None),
        }
    }

    /// One request finished (success, failure, or dropped at shutdown).
    fn finish_one(&self) {
        let mut pending = self.pending.lock().expect("pending poisoned");
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    /// Capture the first error; later ones are logged and dropped.
    fn record_error(&self, err: TickError) {
        let mut slot = self.first_error.lock().expect("first_error poisoned");
        if slot.is_none() {
            *slot = Some(err);
        } else {
            log::warn!("dropping subsequent tick error: {err}");
        }
    }

    fn captured_error(&self) -> Option<TickError> {
        self.first_error
            .lock()
            .expect("first_error poisoned")
            .clone()
    }
}

// ── MapUpdater ───────────────────────────────────────────────────

/// Bounded worker pool driving per-map ticks.
///
/// Requests are dispatched to workers in FIFO submission order;
/// completion order is unspecified, since ticks run in parallel and
/// vary in duration.
pub struct MapUpdater {
    shared: Arc<Shared>,
    queue_tx: Option<Sender<UpdateRequest>>,
    dispatcher: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
}

impl MapUpdater {
    /// Spawn the dispatcher and worker threads.
    pub fn new(config: &UpdaterConfig) -> Self {
        let worker_count = config.resolved_worker_count();
        let shared = Arc::new(Shared::new());

        let (queue_tx, queue_rx) = crossbeam_channel::unbounded::<UpdateRequest>();
        // Zero capacity: handing over a request rendezvouses with a free
        // worker, which is exactly the N-in-flight cap.
        let (work_tx, work_rx) = crossbeam_channel::bounded::<UpdateRequest>(0);

        let workers = (0..worker_count)
            .map(|i| {
                let rx = work_rx.clone();
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("weald-worker-{i}"))
                    .spawn(move || worker_loop(rx, shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();
        drop(work_rx);

        let dispatcher = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("weald-dispatch".into())
                .spawn(move || dispatch_loop(queue_rx, work_tx, shared))
                .expect("failed to spawn dispatch thread")
        };

        Self {
            shared,
            queue_tx: Some(queue_tx),
            dispatcher: Some(dispatcher),
            workers,
            worker_count,
        }
    }

    /// The resolved worker count.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Whether the updater is accepting requests.
    pub fn activated(&self) -> bool {
        self.queue_tx.is_some()
    }

    /// Enqueue "advance `map` by `elapsed`". Never blocks the submitter.
    ///
    /// Fails fast with the captured error if a previous tick already
    /// failed. The caller must not have another request outstanding for
    /// the same map instance.
    pub fn schedule_update(
        &self,
        map: Arc<dyn Tickable>,
        elapsed: Duration,
    ) -> Result<(), ScheduleError> {
        if let Some(err) = self.shared.captured_error() {
            return Err(ScheduleError::TickFailed(err));
        }
        let queue_tx = self.queue_tx.as_ref().ok_or(ScheduleError::Deactivated)?;

        *self.shared.pending.lock().expect("pending poisoned") += 1;
        if queue_tx.send(UpdateRequest { map, elapsed }).is_err() {
            self.shared.finish_one();
            return Err(ScheduleError::Deactivated);
        }
        Ok(())
    }

    /// Block until every outstanding request has completed, then
    /// re-raise the captured error, if any.
    pub fn wait(&self) -> Result<(), TickError> {
        let mut pending = self.shared.pending.lock().expect("pending poisoned");
        while *pending > 0 {
            pending = self
                .shared
                .drained
                .wait(pending)
                .expect("pending poisoned");
        }
        drop(pending);
        match self.shared.captured_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Shut the pool down. Non-graceful: queued-but-undispatched
    /// requests are dropped; in-flight ticks finish. Blocks until all
    /// threads have joined and releases any blocked waiters.
    pub fn deactivate(&mut self) {
        if self.queue_tx.is_none() {
            return;
        }
        self.shared.cancelled.store(true, Ordering::Release);
        // Closing the queue ends the dispatcher after it drains (and
        // drops) whatever is still buffered; the dispatcher closing the
        // work channel then ends the workers.
        self.queue_tx = None;
        if let Some(dispatcher) = self.dispatcher.take() {
            let _ = dispatcher.join();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        self.shared.drained.notify_all();
    }
}

impl Drop for MapUpdater {
    fn drop(&mut self) {
        self.deactivate();
    }
}

// ── Threads ──────────────────────────────────────────────────────

fn dispatch_loop(
    queue_rx: Receiver<UpdateRequest>,
    work_tx: Sender<UpdateRequest>,
    shared: Arc<Shared>,
) {
    for request in queue_rx.iter() {
        if shared.cancelled.load(Ordering::Acquire) {
            // Undispatched request dropped at shutdown.
            shared.finish_one();
            continue;
        }
        if work_tx.send(request).is_err() {
            shared.finish_one();
        }
    }
}

fn worker_loop(work_rx: Receiver<UpdateRequest>, shared: Arc<Shared>) {
    for request in work_rx.iter() {
        let map_id = request.map.map_id();
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| request.map.tick(request.elapsed)));
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(TickError::new(map_id, panic_reason(&payload))),
        };
        if let Err(err) = result {
            log::warn!("{err}");
            shared.record_error(err);
        }
        shared.finish_one();
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("tick panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("tick panicked: {s}")
    } else {
        "tick panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use weald_core::MapId;
    use weald_test_utils::{ConcurrencyGauge, CountingMap, FailingMap, PanickingMap};

    fn updater(workers: usize) -> MapUpdater {
        MapUpdater::new(&UpdaterConfig {
            worker_count: Some(workers),
        })
    }

    #[test]
    fn wait_with_no_work_returns_immediately() {
        let updater = updater(2);
        assert!(updater.wait().is_ok());
    }

    #[test]
    fn all_requests_complete_before_wait_returns() {
        let updater = updater(4);
        let maps: Vec<Arc<CountingMap>> = (0..8)
            .map(|i| Arc::new(CountingMap::new(MapId(i))))
            .collect();
        for map in &maps {
            updater
                .schedule_update(Arc::clone(map) as Arc<dyn Tickable>, Duration::from_millis(50))
                .expect("accepting");
        }
        updater.wait().expect("no failures");
        for map in &maps {
            assert_eq!(map.ticks(), 1);
        }
    }

    #[test]
    fn concurrency_never_exceeds_worker_cap() {
        let cap = 2;
        let updater = updater(cap);
        let gauge = Arc::new(ConcurrencyGauge::default());
        let maps: Vec<Arc<CountingMap>> = (0..8)
            .map(|i| {
                Arc::new(
                    CountingMap::new(MapId(i))
                        .with_hold(Duration::from_millis(20))
                        .with_gauge(Arc::clone(&gauge)),
                )
            })
            .collect();
        for map in &maps {
            updater
                .schedule_update(Arc::clone(map) as Arc<dyn Tickable>, Duration::from_millis(50))
                .expect("accepting");
        }
        updater.wait().expect("no failures");

        assert!(gauge.peak() >= 1);
        assert!(
            gauge.peak() <= cap,
            "peak concurrency {} exceeded cap {cap}",
            gauge.peak()
        );
        assert_eq!(maps.iter().map(|m| m.ticks()).sum::<usize>(), 8);
    }

    #[test]
    fn dispatch_follows_submission_order() {
        let updater = updater(1);
        let journal = Arc::new(Mutex::new(Vec::new()));
        let maps: Vec<Arc<CountingMap>> = (0..5)
            .map(|i| {
                Arc::new(
                    CountingMap::new(MapId(i))
                        .with_hold(Duration::from_millis(5))
                        .with_journal(Arc::clone(&journal)),
                )
            })
            .collect();
        for map in &maps {
            updater
                .schedule_update(Arc::clone(map) as Arc<dyn Tickable>, Duration::from_millis(50))
                .expect("accepting");
        }
        updater.wait().expect("no failures");

        let order = journal.lock().expect("journal poisoned").clone();
        assert_eq!(order, (0..5).map(MapId).collect::<Vec<_>>());
    }

    #[test]
    fn one_failure_does_not_stop_other_maps() {
        let updater = updater(2);
        let healthy: Vec<Arc<CountingMap>> = (1..8)
            .map(|i| {
                Arc::new(CountingMap::new(MapId(i)).with_hold(Duration::from_millis(5)))
            })
            .collect();

        for map in &healthy {
            updater
                .schedule_update(Arc::clone(map) as Arc<dyn Tickable>, Duration::from_millis(50))
                .expect("accepting");
        }
        // Scheduled last so its capture cannot fail-fast the healthy
        // submissions above.
        updater
            .schedule_update(
                Arc::new(FailingMap::new(MapId(0), "scripted failure")),
                Duration::from_millis(50),
            )
            .expect("accepting");

        let err = updater.wait().expect_err("failure must surface");
        assert_eq!(err.map, MapId(0));
        for map in &healthy {
            assert_eq!(map.ticks(), 1);
        }

        // Fail-fast: the captured error now rejects new submissions.
        let rejected = updater.schedule_update(
            Arc::new(CountingMap::new(MapId(99))),
            Duration::from_millis(50),
        );
        assert_eq!(rejected, Err(ScheduleError::TickFailed(err)));
    }

    #[test]
    fn panic_is_captured_as_the_maps_error() {
        let updater = updater(2);
        updater
            .schedule_update(
                Arc::new(PanickingMap::new(MapId(7))),
                Duration::from_millis(50),
            )
            .expect("accepting");

        let err = updater.wait().expect_err("panic must surface");
        assert_eq!(err.map, MapId(7));
        assert!(err.reason.contains("panicked"), "reason: {}", err.reason);
    }

    #[test]
    fn wait_surfaces_exactly_one_error() {
        let updater = updater(2);
        for i in 0..3 {
            updater
                .schedule_update(
                    Arc::new(FailingMap::new(MapId(i), format!("failure {i}"))),
                    Duration::from_millis(50),
                )
                .ok();
        }
        let err = updater.wait().expect_err("failure must surface");
        // First captured error wins; repeated waits return the same one.
        assert_eq!(updater.wait().expect_err("still failed"), err);
    }

    #[test]
    fn deactivate_drops_queued_and_rejects_new_work() {
        let mut updater = updater(1);
        let maps: Vec<Arc<CountingMap>> = (0..6)
            .map(|i| {
                Arc::new(CountingMap::new(MapId(i)).with_hold(Duration::from_millis(30)))
            })
            .collect();
        for map in &maps {
            updater
                .schedule_update(Arc::clone(map) as Arc<dyn Tickable>, Duration::from_millis(50))
                .expect("accepting");
        }

        updater.deactivate();
        assert!(!updater.activated());

        // Whatever was in flight finished; the rest was dropped, and
        // the queue is fully drained either way.
        updater.wait().expect("no failures");
        let completed: usize = maps.iter().map(|m| m.ticks()).sum();
        assert!(completed < 6, "deactivate should drop queued requests");

        let rejected = updater.schedule_update(
            Arc::new(CountingMap::new(MapId(9))),
            Duration::from_millis(50),
        );
        assert_eq!(rejected, Err(ScheduleError::Deactivated));
    }

    #[test]
    fn deactivate_twice_is_a_no_op() {
        let mut updater = updater(2);
        updater.deactivate();
        updater.deactivate();
        assert!(!updater.activated());
    }
}
