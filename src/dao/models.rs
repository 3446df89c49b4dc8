use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Scorer slot value stored for a goal nobody claimed ("skip").
///
/// Placeholder entries count toward the slot total of a match record but are
/// excluded from every tally the aggregation layer produces.
pub const PLACEHOLDER_SCORER: &str = "-";

/// Opaque key identifying one chat conversation.
///
/// The transport hands us whatever numeric identity it uses for a chat; the
/// core only ever compares and hashes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A finalized match as handed to the archive, before a sequence number is
/// assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatchRecord {
    /// Chat that registered the match.
    pub chat_id: ChatId,
    /// Sport the match belongs to.
    pub sport: String,
    /// Home side team name.
    pub team1: String,
    /// Away side team name.
    pub team2: String,
    /// Final goal count for the home side.
    pub score1: u32,
    /// Final goal count for the away side.
    pub score2: u32,
    /// Scorer names for the home side, insertion order significant.
    /// Either empty or exactly `score1` long.
    pub scorers_team1: Vec<String>,
    /// Scorer names for the away side, same length rule as `scorers_team1`.
    pub scorers_team2: Vec<String>,
    /// Wall-clock instant the match was confirmed.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// One persisted match. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Archive-assigned sequence number, strictly increasing across the whole
    /// archive. Orders records where wall clocks cannot be trusted to.
    pub seq: u64,
    /// The match data as submitted.
    #[serde(flatten)]
    pub inner: NewMatchRecord,
}

impl MatchRecord {
    /// `true` when the record belongs to the given sport.
    pub fn is_for_sport(&self, sport: &str) -> bool {
        self.inner.sport == sport
    }
}
