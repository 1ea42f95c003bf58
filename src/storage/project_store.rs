use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use tokio::fs;
use tracing::warn;

use crate::{
    fs::operations::{backup_copy, replace_file},
    utils::{clock::Clock, time::parse_due_date},
};

use super::{
    entities::{Priority, ProjectDocument, ProjectTask},
    StoreError,
};

/// One document per project under `projects/`, keyed by name. Every
/// mutation is a full rewrite through a temporary file.
pub struct ProjectStore {
    dir: PathBuf,
    backups_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl ProjectStore {
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

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        match fs::metadata(self.path_for(name)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &ProjectDocument) -> Result<(), StoreError> {
        replace_file(&self.path_for(document.name()), &document.render()).await?;
        Ok(())
    }

    pub async fn create(
        &self,
        name: &str,
        due: Option<&str>,
    ) -> Result<ProjectDocument, StoreError> {
        validate_name(name)?;
        if self.exists(name).await? {
            return Err(StoreError::AlreadyExists(format!("project {name}")));
        }
        let now = self.clock.now();
        let due = due
            .map(|input| {
                parse_due_date(input, now)
                    .map_err(|e| StoreError::validation("due date", e.to_string()))
            })
            .transpose()?;

        let document = ProjectDocument::new(name, now, due);
        self.save(&document).await?;
        Ok(document)
    }

    pub async fn load(&self, name: &str) -> Result<ProjectDocument, StoreError> {
        validate_name(name)?;
        let content = match fs::read_to_string(self.path_for(name)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("project {name}")))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ProjectDocument::parse(name, &content))
    }

    pub async fn add_task(
        &self,
        name: &str,
        description: &str,
        priority: Priority,
    ) -> Result<ProjectTask, StoreError> {
        validate_description(description)?;
        let mut document = self.load(name).await?;
        let task = document.add_task(description, priority);
        self.save(&document).await?;
        Ok(task)
    }

    /// Marks the task with the given id as done. Marking an already-done
    /// task changes nothing and succeeds.
    pub async fn mark_done(&self, name: &str, id: u32) -> Result<ProjectTask, StoreError> {
        let mut document = self.load(name).await?;
        let task = document
            .task_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("task {id} in project {name}")))?;
        if task.done {
            return Ok(task.clone());
        }
        task.done = true;
        let task = task.clone();
        self.save(&document).await?;
        Ok(task)
    }

    /// Removes the project, keeping a timestamped backup copy. A failed
    /// backup is reported but does not keep the project alive.
    pub async fn delete(&self, name: &str) -> Result<Option<PathBuf>, StoreError> {
        validate_name(name)?;
        if !self.exists(name).await? {
            return Err(StoreError::NotFound(format!("project {name}")));
        }
        let backup = match backup_copy(
            &self.path_for(name),
            &self.backups_dir,
            self.clock.now(),
        )
        .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to back up project {name} before deletion: {e}");
                None
            }
        };
        fs::remove_file(self.path_for(name)).await?;
        Ok(backup)
    }

    pub async fn rename(&self, old: &str, new: &str) -> Result<(), StoreError> {
        validate_name(new)?;
        if self.exists(new).await? {
            return Err(StoreError::AlreadyExists(format!("project {new}")));
        }
        let mut document = self.load(old).await?;
        document.set_name(new);
        self.save(&document).await?;
        fs::remove_file(self.path_for(old)).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<ProjectDocument>, StoreError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".tmp") {
                continue;
            }
            match self.load(&name).await {
                Ok(document) => documents.push(document),
                Err(e) => warn!("Skipping unreadable project {name}: {e}"),
            }
        }
        documents.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(documents)
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

fn validate_description(description: &str) -> Result<(), StoreError> {
    if description.trim().is_empty() {
        return Err(StoreError::validation("description", "may not be empty"));
    }
    if description.contains('\n') {
        return Err(StoreError::validation(
            "description",
            "may not contain newlines",
        ));
    }
    Ok(())
}
