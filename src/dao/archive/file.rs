use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::info;

use crate::dao::archive::{ArchiveDocument, MatchArchive};
use crate::dao::models::{ChatId, MatchRecord, NewMatchRecord};
use crate::dao::storage::{StorageError, StorageResult};

/// Archive backend persisting the document as one JSON file.
///
/// Every mutating call runs read → modify → write under a single mutex; the
/// write goes to a sibling temp file first and is renamed into place, so a
/// failed write leaves the previous document intact.
#[derive(Clone)]
pub struct FileArchive {
    inner: Arc<FileArchiveInner>,
}

struct FileArchiveInner {
    path: PathBuf,
    gate: Mutex<()>,
}

impl FileArchive {
    /// Open (or initialise) the archive file at `path`, validating that any
    /// existing document decodes.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|source| {
                StorageError::unavailable(
                    format!("creating archive directory `{}`", parent.display()),
                    source,
                )
            })?;
        }

        let archive = Self {
            inner: Arc::new(FileArchiveInner {
                path,
                gate: Mutex::new(()),
            }),
        };

        let document = archive.inner.load().await?;
        info!(
            path = %archive.inner.path.display(),
            chats = document.matches.len(),
            "opened match archive"
        );
        Ok(archive)
    }
}

impl FileArchiveInner {
    async fn load(&self) -> StorageResult<ArchiveDocument> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ArchiveDocument::default());
            }
            Err(source) => {
                return Err(StorageError::unavailable(
                    format!("reading archive `{}`", self.path.display()),
                    source,
                ));
            }
        };

        serde_json::from_str(&contents).map_err(|source| {
            StorageError::corrupt(format!("decoding archive `{}`", self.path.display()), source)
        })
    }

    async fn store(&self, document: &ArchiveDocument) -> StorageResult<()> {
        let payload = serde_json::to_vec_pretty(document).map_err(|source| {
            StorageError::corrupt(format!("encoding archive `{}`", self.path.display()), source)
        })?;

        let temp_path = temp_sibling(&self.path);
        fs::write(&temp_path, payload).await.map_err(|source| {
            StorageError::unavailable(
                format!("writing archive temp file `{}`", temp_path.display()),
                source,
            )
        })?;

        fs::rename(&temp_path, &self.path).await.map_err(|source| {
            StorageError::unavailable(
                format!("replacing archive `{}`", self.path.display()),
                source,
            )
        })
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl MatchArchive for FileArchive {
    fn append(&self, record: NewMatchRecord) -> BoxFuture<'static, StorageResult<MatchRecord>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _gate = inner.gate.lock().await;
            let mut document = inner.load().await?;
            let stored = document.append(record);
            inner.store(&document).await?;
            Ok(stored)
        })
    }

    fn remove_most_recent_for_chat(
        &self,
        chat_id: ChatId,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _gate = inner.gate.lock().await;
            let mut document = inner.load().await?;
            let Some(removed) = document.remove_most_recent_for_chat(chat_id) else {
                return Ok(None);
            };
            inner.store(&document).await?;
            Ok(Some(removed))
        })
    }

    fn all(&self) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _gate = inner.gate.lock().await;
            let document = inner.load().await?;
            Ok(document.all())
        })
    }
}
