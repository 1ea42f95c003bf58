use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::PathBuf,
    sync::Arc,
};

use chrono::{DateTime, Local, NaiveDate};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::{
    fs::operations::{backup_copy, replace_file},
    utils::clock::Clock,
};

use super::{
    entities::{TimerRecord, RECORD_HEADER},
    StoreError,
};

/// Interface for abstracting storage of completed timer records.
pub trait RecordStore {
    /// Appends one record. Prior lines are never rewritten.
    fn append(&self, record: &TimerRecord) -> impl Future<Output = Result<(), StoreError>>;

    /// Re-reads the store and returns records whose start is at or after
    /// `since`, in file order. Lines that don't parse as records are skipped.
    fn scan(
        &self,
        since: DateTime<Local>,
    ) -> impl Future<Output = Result<Vec<TimerRecord>, StoreError>> + Send;

    /// Drops records started before `cutoff`, keeping a backup copy of the
    /// pre-prune store.
    fn prune(&self, cutoff: NaiveDate) -> impl Future<Output = Result<PruneOutcome, StoreError>>;
}

impl<T: Deref> RecordStore for T
where
    T::Target: RecordStore,
{
    fn append(&self, record: &TimerRecord) -> impl Future<Output = Result<(), StoreError>> {
        self.deref().append(record)
    }

    fn scan(
        &self,
        since: DateTime<Local>,
    ) -> impl Future<Output = Result<Vec<TimerRecord>, StoreError>> + Send {
        self.deref().scan(since)
    }

    fn prune(&self, cutoff: NaiveDate) -> impl Future<Output = Result<PruneOutcome, StoreError>> {
        self.deref().prune(cutoff)
    }
}

#[derive(Debug)]
pub struct PruneOutcome {
    pub kept: usize,
    pub dropped: usize,
    pub backup: Option<PathBuf>,
}

/// The main realization of [RecordStore]: a single append-only file with a
/// header line.
pub struct FsRecordStore {
    path: PathBuf,
    backups_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FsRecordStore {
    pub fn new(
        path: PathBuf,
        backups_dir: PathBuf,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            backups_dir,
            clock,
        })
    }

    async fn append_with_file(file: &mut File, record: &TimerRecord) -> Result<(), StoreError> {
        let end = file.seek(std::io::SeekFrom::End(0)).await?;

        let mut buffer = String::new();
        if end == 0 {
            buffer.push_str(RECORD_HEADER);
            buffer.push('\n');
        }
        buffer.push_str(&record.to_line());
        buffer.push('\n');

        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn scan_inner(&self, since: DateTime<Local>) -> Result<Vec<TimerRecord>, std::io::Error> {
        debug!("Scanning {:?}", self.path);
        let file = File::open(&self.path).await?;
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut records = vec![];
        while let Ok(Some(line)) = lines.next_line().await {
            match TimerRecord::parse_line(&line) {
                Some(record) if record.start >= since => records.push(record),
                Some(_) => {}
                None => {
                    // the header never parses; anything else is noise left by
                    // an interrupted write
                    if line != RECORD_HEADER && !line.trim().is_empty() {
                        warn!("Skipping malformed record line {line:?} in {:?}", self.path);
                    }
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(records)
    }
}

impl RecordStore for FsRecordStore {
    async fn append(&self, record: &TimerRecord) -> Result<(), StoreError> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        // Semi-safe acquire-release for the file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, record).await;
        file.unlock_async().await?;
        result
    }

    async fn scan(&self, since: DateTime<Local>) -> Result<Vec<TimerRecord>, StoreError> {
        match self.scan_inner(since).await {
            Ok(records) => Ok(records),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }

    async fn prune(&self, cutoff: NaiveDate) -> Result<PruneOutcome, StoreError> {
        let backup = match tokio::fs::metadata(&self.path).await {
            Ok(_) => Some(backup_copy(&self.path, &self.backups_dir, self.clock.now()).await?),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let all = self.scan(crate::utils::time::epoch_start()).await?;
        let kept: Vec<&TimerRecord> = all
            .iter()
            .filter(|record| record.start.date_naive() >= cutoff)
            .collect();

        let mut content = String::from(RECORD_HEADER);
        content.push('\n');
        for record in &kept {
            content.push_str(&record.to_line());
            content.push('\n');
        }
        replace_file(&self.path, &content).await?;

        Ok(PruneOutcome {
            kept: kept.len(),
            dropped: all.len() - kept.len(),
            backup,
        })
    }
}
