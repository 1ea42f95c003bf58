//! All state lives in flat files under the application directory:
//!  - `records.log` holds completed timer records, one pipe-delimited line
//!    each, behind a header line naming the fields.
//!  - `active_timer` holds the single in-flight timer, if any.
//!  - `projects/` and `notes/` hold one line-oriented document per entry.
//!
//! Whole-file mutations go through a temporary file and a rename, appends are
//! strictly appends. Advisory locks only bracket a single read or append, so
//! two concurrent invocations race last-writer-wins.

pub mod entities;
pub mod note_store;
pub mod project_store;
pub mod record_store;
pub mod timer_store;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("no timer is running")]
    NotRunning,
    #[error("a timer for {task} is already running")]
    AlreadyRunning { task: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> StoreError {
        StoreError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
