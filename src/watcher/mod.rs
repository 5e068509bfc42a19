//! Project file watching and the debounced commit workflow.

pub mod debouncer;
pub mod file_watcher;
pub mod ignore;
pub mod pipeline;

pub use debouncer::{
    ChangeHandler, ChangeKind, Debouncer, FileEvent, PendingChanges, DEBOUNCE_WINDOW,
};
pub use file_watcher::{FileWatcher, WatchBackend};
pub use ignore::IgnoreMatcher;
pub use pipeline::{RunOutcome, Step, Workflow};
