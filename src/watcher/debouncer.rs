//! Coalesces bursts of file events into single workflow runs.
//!
//! Every event re-arms one deadline. When the deadline passes with no new
//! events, the pending paths are handed to the [`ChangeHandler`] as one batch.
//! Only one batch is in flight at a time; events that arrive meanwhile are
//! kept and get a fresh window once the run finishes.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Quiet period after the last event before a run starts.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Added => "➕",
            Self::Modified => "📝",
            Self::Deleted => "➖",
        }
    }
}

/// A change to one file, relative to the watch root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Distinct paths seen since the last drain.
#[derive(Debug, Default)]
pub struct PendingChanges {
    paths: HashSet<PathBuf>,
}

impl PendingChanges {
    /// Returns false if the path was already pending.
    pub fn insert(&mut self, path: &Path) -> bool {
        self.paths.insert(path.to_path_buf())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Empty the set, returning its paths sorted.
    pub fn drain(&mut self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.paths.drain().collect();
        paths.sort();
        paths
    }
}

/// Receives debounced batches.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    /// Called for every event as it arrives.
    fn on_event(&self, _event: &FileEvent) {}

    /// Process one batch. Never called concurrently.
    async fn handle(&self, changes: Vec<PathBuf>);
}

type RunFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Owns the pending set and the debounce deadline.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: PendingChanges,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: PendingChanges::default(),
            deadline: None,
        }
    }

    /// Add the event's path and restart the quiet period.
    pub fn record(&mut self, event: &FileEvent) {
        if self.pending.insert(&event.path) {
            debug!(path = %event.path.display(), kind = event.kind.label(), "Change pending");
        }
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    /// Disarm and take the batch. `None` if nothing is pending.
    pub fn fire(&mut self) -> Option<Vec<PathBuf>> {
        self.deadline = None;
        if self.pending.is_empty() {
            debug!("Debounce fired with nothing pending");
            return None;
        }
        Some(self.pending.drain())
    }

    /// Drive `handler` from `events` until `shutdown` resolves or the event
    /// source closes. A run in flight at that point is awaited, not dropped.
    pub async fn run<H, F>(
        mut self,
        mut events: mpsc::UnboundedReceiver<FileEvent>,
        handler: &H,
        shutdown: F,
    ) where
        H: ChangeHandler + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut in_flight: Option<RunFuture<'_>> = None;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Shutdown requested");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        warn!("File event source closed");
                        break;
                    };
                    handler.on_event(&event);
                    self.record(&event);
                }
                _ = wait_until(self.deadline), if in_flight.is_none() => {
                    if let Some(batch) = self.fire() {
                        info!(files = batch.len(), "Starting workflow run");
                        in_flight = Some(handler.handle(batch));
                    }
                }
                _ = finish(&mut in_flight) => {
                    in_flight = None;
                    if !self.pending.is_empty() {
                        debug!(
                            pending = self.pending.len(),
                            "Changes arrived during run, re-arming"
                        );
                        self.deadline = Some(Instant::now() + self.window);
                    }
                }
            }
        }

        self.cancel();
        if let Some(run) = in_flight.take() {
            info!("Waiting for the running workflow to finish");
            run.await;
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn finish(run: &mut Option<RunFuture<'_>>) {
    match run {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;
    use tokio::time::sleep;

    /// Records each batch and takes `delay` to "run".
    struct Recorder {
        delay: Duration,
        batches: Mutex<Vec<Vec<PathBuf>>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        finished: AtomicUsize,
        events_seen: AtomicUsize,
    }

    impl Recorder {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                batches: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
                events_seen: AtomicUsize::new(0),
            })
        }

        fn batches(&self) -> Vec<Vec<PathBuf>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChangeHandler for Recorder {
        fn on_event(&self, _event: &FileEvent) {
            self.events_seen.fetch_add(1, Ordering::SeqCst);
        }

        async fn handle(&self, changes: Vec<PathBuf>) {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.batches.lock().unwrap().push(changes);
            sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        tx: mpsc::UnboundedSender<FileEvent>,
        stop: oneshot::Sender<()>,
        task: JoinHandle<()>,
    }

    fn spawn(handler: &Arc<Recorder>) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop, stop_rx) = oneshot::channel::<()>();
        let handler = Arc::clone(handler);
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = stop_rx.await;
            };
            Debouncer::default().run(rx, &*handler, shutdown).await;
        });
        Harness { tx, stop, task }
    }

    fn modified(path: &str) -> FileEvent {
        FileEvent::new(path, ChangeKind::Modified)
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_record_dedupes_and_arms() {
        let mut debouncer = Debouncer::default();
        assert!(!debouncer.is_armed());

        debouncer.record(&modified("a.rs"));
        debouncer.record(&FileEvent::new("a.rs", ChangeKind::Deleted));
        debouncer.record(&FileEvent::new("b.rs", ChangeKind::Added));

        assert!(debouncer.is_armed());
        assert_eq!(debouncer.pending().len(), 2);
        assert!(debouncer.pending().contains(Path::new("a.rs")));
    }

    #[test]
    fn test_fire_drains_sorted() {
        let mut debouncer = Debouncer::default();
        debouncer.record(&modified("z.rs"));
        debouncer.record(&modified("a.rs"));

        assert_eq!(debouncer.fire(), Some(paths(&["a.rs", "z.rs"])));
        assert!(!debouncer.is_armed());
        assert!(debouncer.pending().is_empty());
    }

    #[test]
    fn test_fire_with_nothing_pending_is_noop() {
        let mut debouncer = Debouncer::default();
        assert_eq!(debouncer.fire(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_with_union() {
        let handler = Recorder::new(Duration::ZERO);
        let harness = spawn(&handler);

        for i in 0..300 {
            harness.tx.send(modified(&format!("f{}.rs", i % 7))).unwrap();
        }
        sleep(Duration::from_millis(1500)).await;
        harness.tx.send(modified("late.rs")).unwrap();

        // Window restarted at 1.5s, so nothing has fired by 3.4s.
        sleep(Duration::from_millis(1900)).await;
        assert!(handler.batches().is_empty());

        sleep(Duration::from_millis(200)).await;
        let batches = handler.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 8);
        assert!(batches[0].contains(&PathBuf::from("late.rs")));
        assert_eq!(handler.events_seen.load(Ordering::SeqCst), 301);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(handler.batches().len(), 1);

        harness.stop.send(()).unwrap();
        harness.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_during_run_are_deferred() {
        let handler = Recorder::new(Duration::from_secs(3));
        let harness = spawn(&handler);

        harness.tx.send(modified("a.rs")).unwrap();
        // First run: 2s..5s.
        sleep(Duration::from_millis(2500)).await;
        assert_eq!(handler.batches().len(), 1);
        harness.tx.send(modified("b.rs")).unwrap();

        // The window for b.rs only opens once the first run ends at 5s.
        sleep(Duration::from_millis(3500)).await;
        assert_eq!(handler.batches().len(), 1);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(handler.batches(), vec![paths(&["a.rs"]), paths(&["b.rs"])]);
        assert_eq!(handler.max_active.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(5)).await;
        harness.stop.send(()).unwrap();
        harness.task.await.unwrap();
        assert_eq!(handler.finished.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_run() {
        let handler = Recorder::new(Duration::from_secs(3));
        let harness = spawn(&handler);

        harness.tx.send(modified("a.rs")).unwrap();
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(handler.active.load(Ordering::SeqCst), 1);

        harness.stop.send(()).unwrap();
        harness.task.await.unwrap();
        assert_eq!(handler.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_timer() {
        let handler = Recorder::new(Duration::ZERO);
        let harness = spawn(&handler);

        harness.tx.send(modified("a.rs")).unwrap();
        sleep(Duration::from_millis(500)).await;
        harness.stop.send(()).unwrap();
        harness.task.await.unwrap();

        assert!(handler.batches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_source_ends_loop() {
        let handler = Recorder::new(Duration::ZERO);
        let harness = spawn(&handler);

        drop(harness.tx);
        harness.task.await.unwrap();
        assert!(handler.batches().is_empty());
    }
}
