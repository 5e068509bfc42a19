//! code_buddy library.
//!
//! Git helpers plus a file watcher that runs checks, writes a commit
//! message and pushes once edits settle.

pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod message;
pub mod prompt;
pub mod ui;
pub mod watcher;

pub use error::Error;
