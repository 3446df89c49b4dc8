use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::dao::archive::{ArchiveDocument, MatchArchive};
use crate::dao::models::{ChatId, MatchRecord, NewMatchRecord};
use crate::dao::storage::StorageResult;

/// Archive backend keeping the whole document in process memory.
///
/// Used by tests and as a fallback when no durable path is configured; data
/// does not survive a restart.
#[derive(Clone, Default)]
pub struct MemoryArchive {
    document: Arc<Mutex<ArchiveDocument>>,
}

impl MemoryArchive {
    /// Create an empty in-memory archive.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchArchive for MemoryArchive {
    fn append(&self, record: NewMatchRecord) -> BoxFuture<'static, StorageResult<MatchRecord>> {
        let document = self.document.clone();
        Box::pin(async move {
            let mut guard = document.lock().await;
            Ok(guard.append(record))
        })
    }

    fn remove_most_recent_for_chat(
        &self,
        chat_id: ChatId,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>> {
        let document = self.document.clone();
        Box::pin(async move {
            let mut guard = document.lock().await;
            Ok(guard.remove_most_recent_for_chat(chat_id))
        })
    }

    fn all(&self) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>> {
        let document = self.document.clone();
        Box::pin(async move {
            let guard = document.lock().await;
            Ok(guard.all())
        })
    }
}
