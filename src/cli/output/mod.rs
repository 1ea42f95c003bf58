pub mod summary;

use std::future;

use anyhow::Result;
use chrono::{DateTime, Local};
use futures::{stream, Stream, StreamExt};

use crate::storage::{entities::TimerRecord, record_store::RecordStore};

pub struct ExtractConfig {
    pub since: DateTime<Local>,
}

/// Lifts a store scan into a stream of [TimerRecord]. Each call re-reads the
/// store, so the sequence is restartable.
pub fn records_since(
    storage: impl RecordStore,
    config: ExtractConfig,
) -> impl Stream<Item = Result<TimerRecord>> {
    stream::once(async move { storage.scan(config.since).await })
        .flat_map(|result| match result {
            Ok(records) => stream::iter(records).map(Ok).boxed_local(),
            Err(e) => stream::once(future::ready(Err(e.into()))).boxed_local(),
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{Duration, TimeZone};
    use futures::TryStreamExt;
    use tempfile::tempdir;

    use crate::{
        storage::record_store::FsRecordStore,
        utils::{clock::SystemClock, time::epoch_start},
    };

    use super::*;

    #[tokio::test]
    async fn test_records_since_restarts_from_storage() -> Result<()> {
        let dir = tempdir()?;
        let store = FsRecordStore::new(
            dir.path().join("records.log"),
            dir.path().join("backups"),
            Arc::new(SystemClock),
        )?;

        let start = Local.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let record = TimerRecord {
            start,
            end: start + Duration::seconds(60),
            category: "work".into(),
            task: "a".into(),
            seconds: 60,
        };
        store.append(&record).await?;

        let collected: Vec<TimerRecord> =
            records_since(&store, ExtractConfig {
                since: epoch_start(),
            })
            .try_collect()
            .await?;
        assert_eq!(collected, vec![record.clone()]);

        // a second extraction sees appends made in between
        store.append(&record).await?;
        let collected: Vec<TimerRecord> =
            records_since(&store, ExtractConfig {
                since: epoch_start(),
            })
            .try_collect()
            .await?;
        assert_eq!(collected.len(), 2);
        Ok(())
    }
}
