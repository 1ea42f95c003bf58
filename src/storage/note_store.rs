use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use tokio::fs;
use tracing::warn;

use crate::{
    fs::operations::{backup_copy, replace_file},
    utils::clock::Clock,
};

use super::{entities::NoteDocument, StoreError};

/// One plain-text document per note under `notes/`, keyed by name.
pub struct NoteStore {
    dir: PathBuf,
    backups_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl NoteStore {
    pub fn new(
        dir: PathBuf,
        backups_dir: PathBuf,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            backups_dir,
            clock,
        })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Path of an existing note, for handing to an external editor.
    pub async fn path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        let path = self.path_for(name);
        match fs::metadata(&path).await {
            Ok(_) => Ok(path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("note {name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn add(&self, name: &str, body: &str) -> Result<NoteDocument, StoreError> {
        validate_name(name)?;
        if fs::metadata(self.path_for(name)).await.is_ok() {
            return Err(StoreError::AlreadyExists(format!("note {name}")));
        }
        let note = NoteDocument::new(name, self.clock.now(), body);
        replace_file(&self.path_for(name), &note.render()).await?;
        Ok(note)
    }

    pub async fn load(&self, name: &str) -> Result<NoteDocument, StoreError> {
        validate_name(name)?;
        let content = match fs::read_to_string(self.path_for(name)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("note {name}")))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(NoteDocument::parse(name, &content))
    }

    /// Replaces the note's tag set. Tags are trimmed, deduplicated
    /// case-insensitively and kept in the order given.
    pub async fn tag(&self, name: &str, tags: &[String]) -> Result<NoteDocument, StoreError> {
        let mut note = self.load(name).await?;
        let mut cleaned: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.trim();
            if tag.is_empty() || tag.contains(',') {
                return Err(StoreError::validation(
                    "tag",
                    format!("{tag:?} may not be empty or contain ','"),
                ));
            }
            if !cleaned.iter().any(|seen| seen.eq_ignore_ascii_case(tag)) {
                cleaned.push(tag.to_string());
            }
        }
        note.tags = cleaned;
        replace_file(&self.path_for(name), &note.render()).await?;
        Ok(note)
    }

    pub async fn delete(&self, name: &str) -> Result<Option<PathBuf>, StoreError> {
        let path = self.path(name).await?;
        let backup = match backup_copy(&path, &self.backups_dir, self.clock.now()).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to back up note {name} before deletion: {e}");
                None
            }
        };
        fs::remove_file(&path).await?;
        Ok(backup)
    }

    pub async fn list(&self) -> Result<Vec<NoteDocument>, StoreError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut notes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".tmp") {
                continue;
            }
            match self.load(&name).await {
                Ok(note) => notes.push(note),
                Err(e) => warn!("Skipping unreadable note {name}: {e}"),
            }
        }
        notes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(notes)
    }

    pub async fn by_tag(&self, tag: &str) -> Result<Vec<NoteDocument>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|note| note.has_tag(tag))
            .collect())
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::validation("name", "may not be empty"));
    }
    if name.starts_with('.') {
        return Err(StoreError::validation("name", "may not start with '.'"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(StoreError::validation(
            "name",
            "may only contain letters, digits, '.', '_' and '-'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Local, TimeZone};
    use tempfile::tempdir;

    use crate::utils::clock::MockClock;

    use super::*;

    fn test_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn store_at(dir: &std::path::Path) -> NoteStore {
        let mut clock = MockClock::new();
        clock.expect_now().return_const(test_now());
        NoteStore::new(dir.join("notes"), dir.join("backups"), Arc::new(clock)).unwrap()
    }

    #[tokio::test]
    async fn test_add_load_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = store_at(dir.path());

        store.add("meeting", "agenda\n- item").await?;
        let note = store.load("meeting").await?;
        assert_eq!(note.name, "meeting");
        assert_eq!(note.created, Some(test_now()));
        assert_eq!(note.body, "agenda\n- item");

        assert!(matches!(
            store.add("meeting", "again").await,
            Err(StoreError::AlreadyExists(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_tag_replaces_and_dedups() -> Result<()> {
        let dir = tempdir()?;
        let store = store_at(dir.path());

        store.add("meeting", "body").await?;
        store
            .tag("meeting", &["work".into(), "Work ".into(), "q1".into()])
            .await?;
        let note = store.load("meeting").await?;
        assert_eq!(note.tags, vec!["work", "q1"]);
        assert_eq!(note.body, "body");

        store.tag("meeting", &["other".into()]).await?;
        assert_eq!(store.load("meeting").await?.tags, vec!["other"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_by_tag_is_case_insensitive() -> Result<()> {
        let dir = tempdir()?;
        let store = store_at(dir.path());

        store.add("a", "").await?;
        store.add("b", "").await?;
        store.tag("a", &["Work".into()]).await?;

        let found = store.by_tag("work").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a");
        assert!(store.by_tag("play").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_keeps_backup() -> Result<()> {
        let dir = tempdir()?;
        let store = store_at(dir.path());

        store.add("meeting", "body").await?;
        let content = fs::read_to_string(dir.path().join("notes/meeting")).await?;

        let backup = store.delete("meeting").await?.expect("backup path");
        assert_eq!(fs::read_to_string(&backup).await?, content);
        assert!(matches!(
            store.load("meeting").await,
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }
}
