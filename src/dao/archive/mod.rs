//! Match archive persistence: the append-oriented store of finalized matches.

/// JSON-file backend.
#[cfg(feature = "file-store")]
pub mod file;
/// In-memory backend for tests and unconfigured runs.
pub mod memory;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dao::models::{ChatId, MatchRecord, NewMatchRecord};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for finalized match records.
///
/// Implementations must execute each mutating call as a single critical
/// section: the read, the modification, and the write-back may not interleave
/// with another call's phases, or one update is lost.
pub trait MatchArchive: Send + Sync {
    /// Append a finalized match to the chat's history and the global history,
    /// returning the stored record with its assigned sequence number.
    fn append(&self, record: NewMatchRecord) -> BoxFuture<'static, StorageResult<MatchRecord>>;

    /// Remove and return the most recently appended record belonging to the
    /// chat, or `None` when the chat has no recorded matches.
    fn remove_most_recent_for_chat(
        &self,
        chat_id: ChatId,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>>;

    /// Read-only snapshot of every record in the archive, ordered by sequence
    /// number.
    fn all(&self) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>>;
}

/// On-disk / in-memory shape of the whole archive: per-chat ordered histories
/// plus the sequence counter. Both backends operate on this document so the
/// append and undo semantics cannot drift between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveDocument {
    /// Next sequence number to hand out.
    pub next_seq: u64,
    /// Histories keyed by chat id (decimal string), each in append order.
    pub matches: IndexMap<String, Vec<MatchRecord>>,
}

impl ArchiveDocument {
    /// Append a record to the owning chat's history, assigning the next
    /// sequence number.
    pub fn append(&mut self, record: NewMatchRecord) -> MatchRecord {
        let seq = self.next_seq;
        self.next_seq += 1;

        let stored = MatchRecord { seq, inner: record };
        self.matches
            .entry(stored.inner.chat_id.to_string())
            .or_default()
            .push(stored.clone());
        stored
    }

    /// Remove the chat's record with the highest sequence number, if any.
    pub fn remove_most_recent_for_chat(&mut self, chat_id: ChatId) -> Option<MatchRecord> {
        let key = chat_id.to_string();
        let history = self.matches.get_mut(&key)?;

        let index = history
            .iter()
            .enumerate()
            .max_by_key(|(_, record)| record.seq)
            .map(|(index, _)| index)?;
        let removed = history.remove(index);

        if history.is_empty() {
            self.matches.shift_remove(&key);
        }

        Some(removed)
    }

    /// Flattened snapshot of every history, ordered by sequence number.
    pub fn all(&self) -> Vec<MatchRecord> {
        let mut records = self
            .matches
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by_key(|record| record.seq);
        records
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn record(chat: i64, sport: &str) -> NewMatchRecord {
        NewMatchRecord {
            chat_id: ChatId(chat),
            sport: sport.into(),
            team1: "Reds".into(),
            team2: "Blues".into(),
            score1: 2,
            score2: 1,
            scorers_team1: vec!["A".into(), "B".into()],
            scorers_team2: vec!["C".into()],
            recorded_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn append_assigns_increasing_sequence_numbers() {
        let mut doc = ArchiveDocument::default();
        let first = doc.append(record(1, "Soccer"));
        let second = doc.append(record(2, "Soccer"));
        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);
        assert_eq!(doc.next_seq, 2);
    }

    #[test]
    fn undo_is_exact_inverse_of_append() {
        let mut doc = ArchiveDocument::default();
        doc.append(record(1, "Soccer"));
        let before = doc.clone();

        let appended = doc.append(record(1, "Hockey"));
        let removed = doc.remove_most_recent_for_chat(ChatId(1)).unwrap();

        assert_eq!(removed, appended);
        assert_eq!(doc.all(), before.all());
    }

    #[test]
    fn undo_only_touches_the_requesting_chat() {
        let mut doc = ArchiveDocument::default();
        doc.append(record(1, "Soccer"));
        let other = doc.append(record(2, "Soccer"));

        assert!(doc.remove_most_recent_for_chat(ChatId(1)).is_some());
        assert!(doc.remove_most_recent_for_chat(ChatId(1)).is_none());
        assert_eq!(doc.all(), vec![other]);
    }

    #[test]
    fn snapshot_is_ordered_by_sequence_across_chats() {
        let mut doc = ArchiveDocument::default();
        doc.append(record(5, "Soccer"));
        doc.append(record(1, "Soccer"));
        doc.append(record(5, "Hockey"));

        let seqs = doc.all().iter().map(|r| r.seq).collect::<Vec<_>>();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
