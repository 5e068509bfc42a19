//! Filesystem watch source.
//!
//! Wraps a notify watcher on the project root and forwards relevant,
//! non-ignored file changes as [`FileEvent`]s over a tokio channel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{Config, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watcher::debouncer::{ChangeKind, FileEvent};
use crate::watcher::ignore::IgnoreMatcher;
use crate::Error;

/// Poll interval for the polling backend.
const POLL_INTERVAL_MS: u64 = 100;

/// Which notify backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchBackend {
    /// inotify / FSEvents / ReadDirectoryChangesW.
    #[default]
    Native,
    /// Stat polling, for network and cloud-synced drives.
    Poll,
}

/// Map a notify event to per-path changes. Metadata and access events are dropped.
pub fn classify(event: &notify::Event) -> Vec<(PathBuf, ChangeKind)> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Added,
        EventKind::Remove(_) => ChangeKind::Deleted,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Deleted,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Added,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // paths are [from, to]
            return event
                .paths
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let kind = if i == 0 {
                        ChangeKind::Deleted
                    } else {
                        ChangeKind::Added
                    };
                    (p.clone(), kind)
                })
                .collect();
        }
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };
    event.paths.iter().map(|p| (p.clone(), kind)).collect()
}

/// Watches the project root recursively.
///
/// Dropping the watcher releases the OS watch.
pub struct FileWatcher {
    watcher: Box<dyn Watcher + Send>,
    root: PathBuf,
}

impl FileWatcher {
    /// Create a watcher and the receiving end of its event channel.
    pub fn new(
        root: &Path,
        ignore: IgnoreMatcher,
        backend: WatchBackend,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FileEvent>), Error> {
        let root = root.canonicalize()?;
        let (tx, rx) = mpsc::unbounded_channel();

        let handler_root = root.clone();
        let handler = move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Remove(RemoveKind::Folder)) {
                    debug!(paths = ?event.paths, "Directory removed");
                    return;
                }
                for (path, kind) in classify(&event) {
                    if kind != ChangeKind::Deleted && path.is_dir() {
                        debug!(path = %path.display(), "Directory event");
                        continue;
                    }
                    let rel = path
                        .strip_prefix(&handler_root)
                        .map(Path::to_path_buf)
                        .unwrap_or(path);
                    if rel.as_os_str().is_empty() || ignore.is_ignored(&rel) {
                        continue;
                    }
                    if tx.send(FileEvent::new(rel, kind)).is_err() {
                        warn!("Receiver dropped, stopping watcher");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Watch error");
            }
        };

        let watcher: Box<dyn Watcher + Send> = match backend {
            WatchBackend::Native => Box::new(RecommendedWatcher::new(handler, Config::default())?),
            WatchBackend::Poll => Box::new(PollWatcher::new(
                handler,
                Config::default().with_poll_interval(Duration::from_millis(POLL_INTERVAL_MS)),
            )?),
        };

        Ok((Self { watcher, root }, rx))
    }

    /// Start watching the root recursively.
    pub fn start(&mut self) -> Result<(), Error> {
        self.watcher.watch(&self.root, RecursiveMode::Recursive)?;
        info!(path = %self.root.display(), "Watching for changes");
        Ok(())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.watcher.unwatch(&self.root) {
            debug!(error = %e, "Unwatch on drop failed");
        }
        info!("File watcher closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind};
    use notify::Event;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn test_classify_basic_kinds() {
        assert_eq!(
            classify(&event(EventKind::Create(CreateKind::File), &["/r/a.rs"])),
            vec![(PathBuf::from("/r/a.rs"), ChangeKind::Added)]
        );
        assert_eq!(
            classify(&event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/r/a.rs"]
            )),
            vec![(PathBuf::from("/r/a.rs"), ChangeKind::Modified)]
        );
        assert_eq!(
            classify(&event(EventKind::Remove(RemoveKind::File), &["/r/a.rs"])),
            vec![(PathBuf::from("/r/a.rs"), ChangeKind::Deleted)]
        );
    }

    #[test]
    fn test_classify_rename_both() {
        let changes = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/r/old.rs", "/r/new.rs"],
        ));
        assert_eq!(
            changes,
            vec![
                (PathBuf::from("/r/old.rs"), ChangeKind::Deleted),
                (PathBuf::from("/r/new.rs"), ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_classify_drops_noise() {
        assert!(classify(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/r/a.rs"]
        ))
        .is_empty());
        assert!(classify(&event(EventKind::Access(AccessKind::Read), &["/r/a.rs"])).is_empty());
    }

    #[tokio::test]
    async fn test_reports_relative_paths_and_skips_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let ignore = IgnoreMatcher::new(["*.log"]).unwrap();
        let (mut watcher, mut rx) =
            FileWatcher::new(dir.path(), ignore, WatchBackend::Poll).unwrap();
        watcher.start().unwrap();

        std::fs::write(dir.path().join("debug.log"), "noise").unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no event within timeout")
            .expect("channel closed");
        assert_eq!(event.path, PathBuf::from("main.rs"));
    }
}
