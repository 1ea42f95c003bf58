use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use tokio::{fs, io::AsyncWriteExt};

/// Replaces `target` by writing into a sibling temporary file and renaming it
/// over the target. Readers either see the old contents or the new ones,
/// never a half-written file.
pub async fn replace_file(target: &Path, contents: &str) -> Result<(), std::io::Error> {
    let mut tmp = target.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(contents.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, target).await?;
    Ok(())
}

/// Copies `source` into `backup_dir` under a timestamped name and returns the
/// backup path. The copy is taken before the destructive operation it guards.
pub async fn backup_copy(
    source: &Path,
    backup_dir: &Path,
    stamp: DateTime<Local>,
) -> Result<PathBuf, io::Error> {
    let name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("can't back up {source:?}: no file name"),
        )
    })?;
    fs::create_dir_all(backup_dir).await?;

    let mut backup_name = name.to_owned();
    backup_name.push(format!(".{}", stamp.format("%Y%m%d_%H%M%S")));
    let backup = backup_dir.join(backup_name);

    fs::copy(source, &backup).await?;
    Ok(backup)
}
