use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use tokio::fs;
use tracing::warn;

use crate::{fs::operations::replace_file, utils::clock::Clock};

use super::{
    entities::{ActiveTimer, TimerRecord},
    record_store::RecordStore,
    StoreError,
};

/// Persistence for the single in-flight timer, plus the start/stop/status
/// operations around it. `stop` is the only way a [TimerRecord] is born.
pub struct TimerStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl TimerStore {
    pub fn new(path: PathBuf, clock: Arc<dyn Clock>) -> TimerStore {
        TimerStore { path, clock }
    }

    pub async fn load(&self) -> Result<Option<ActiveTimer>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let line = content.lines().next().unwrap_or("");
        match ActiveTimer::parse_line(line) {
            Some(timer) => Ok(Some(timer)),
            None => {
                // Might happen after a shutdown cutting off the write
                warn!("Ignoring corrupted timer file {:?}", self.path);
                Ok(None)
            }
        }
    }

    /// Starts a timer from a `category:task` spec. An already-running timer
    /// is only replaced when `overwrite` is set; the caller decides whether
    /// to ask the user first.
    pub async fn start(&self, task_spec: &str, overwrite: bool) -> Result<ActiveTimer, StoreError> {
        let (category, task) = ActiveTimer::split_spec(task_spec);
        validate_category(category)?;
        validate_task(task)?;

        if !overwrite {
            if let Some(running) = self.load().await? {
                return Err(StoreError::AlreadyRunning {
                    task: running.label(),
                });
            }
        }

        let timer = ActiveTimer {
            start: self.clock.now(),
            category: category.to_string(),
            task: task.to_string(),
        };
        replace_file(&self.path, &format!("{}\n", timer.to_line())).await?;
        Ok(timer)
    }

    /// Stops the running timer: appends the completed record and removes the
    /// timer file. Returns the appended record.
    pub async fn stop(&self, records: &impl RecordStore) -> Result<TimerRecord, StoreError> {
        let timer = self.load().await?.ok_or(StoreError::NotRunning)?;
        let end = self.clock.now();
        let record = TimerRecord {
            seconds: timer.elapsed_seconds(end),
            start: timer.start,
            end,
            category: timer.category,
            task: timer.task,
        };
        records.append(&record).await?;

        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(record)
    }

    /// Elapsed seconds of the running timer without mutating anything.
    pub async fn status(&self) -> Result<(ActiveTimer, i64), StoreError> {
        let timer = self.load().await?.ok_or(StoreError::NotRunning)?;
        let elapsed = timer.elapsed_seconds(self.clock.now());
        Ok((timer, elapsed))
    }
}

fn validate_category(category: &str) -> Result<(), StoreError> {
    if category.contains('|') {
        return Err(StoreError::validation("category", "may not contain '|'"));
    }
    if category.contains(char::is_whitespace) {
        return Err(StoreError::validation(
            "category",
            "may not contain whitespace",
        ));
    }
    Ok(())
}

fn validate_task(task: &str) -> Result<(), StoreError> {
    if task.is_empty() {
        return Err(StoreError::validation("task", "may not be empty"));
    }
    if task.contains('|') || task.contains('\n') {
        return Err(StoreError::validation(
            "task",
            "may not contain '|' or newlines",
        ));
    }
    Ok(())
}
