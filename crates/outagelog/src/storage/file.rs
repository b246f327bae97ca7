use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{Error, Result};

/// Slot store keeping each slot in `<directory>/<key>.json`.
///
/// Writes go to a temporary sibling file that is flushed to disk and then
/// renamed over the slot, so a crash mid-write leaves the previous
/// document intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Use `directory` for slot files. It is created on first write.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(Error::ConfigValidation {
                message: format!("slot key '{key}' cannot be used as a file name"),
            });
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: self.directory.clone(),
                source,
            })?;

        let tmp = path.with_extension("json.tmp");
        let written = async {
            write_synced(&tmp, value).await?;
            fs::rename(&tmp, &path).await
        }
        .await;
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "Temporary slot file left behind");
                }
            }
            return Err(e.into());
        }
        debug!(path = %path.display(), bytes = value.len(), "Slot file written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Slot file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_synced(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(value.as_bytes()).await?;
    file.sync_all().await
}
