use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::Result;

/// Concrete locations of every store under one application directory.
/// Commands receive this instead of reaching for globals, so tests can point
/// the whole toolkit at a temporary directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub records_file: PathBuf,
    pub timer_file: PathBuf,
    pub projects_dir: PathBuf,
    pub notes_dir: PathBuf,
    pub backups_dir: PathBuf,
}

impl AppPaths {
    pub fn new(root: &Path) -> AppPaths {
        AppPaths {
            records_file: root.join("records.log"),
            timer_file: root.join("active_timer"),
            projects_dir: root.join("projects"),
            notes_dir: root.join("notes"),
            backups_dir: root.join("backups"),
        }
    }
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        if let Ok(dir) = env::var("PUNCHCARD_DIR") {
            PathBuf::from(dir)
        } else {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("punchcard");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
