//! Per-chat conversation session: transient, in-memory only.

use thiserror::Error;

use crate::dao::models::ChatId;
use crate::state::score::ScoreField;

/// Discrete step of the registration conversation a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No flow in progress.
    Start,
    /// Waiting for a sport selection.
    Sport,
    /// Waiting for the home team.
    Team1,
    /// Waiting for the away team.
    Team2,
    /// Entering the home side's score.
    Score1,
    /// Entering the away side's score.
    Score2,
    /// Collecting scorer names.
    Scorers,
    /// Waiting for the final confirm.
    Confirmation,
}

/// Which side of the match a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// team1 / score1.
    Home,
    /// team2 / score2.
    Away,
}

impl Side {
    /// The opposite side.
    pub fn other(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// Internal-logic error: a session field required by the current stage is not
/// set. Continuing would produce an inconsistent record, so the dispatch
/// boundary clears the session when it sees this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session contract violated in stage {stage:?}: {detail}")]
pub struct ContractViolation {
    /// Stage the session claimed to be in.
    pub stage: Stage,
    /// Which field was missing or inconsistent.
    pub detail: &'static str,
}

/// Mutable conversation state for one chat. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Chat this session belongs to.
    pub chat_id: ChatId,
    /// Current conversation stage.
    pub stage: Stage,
    /// Selected sport, set once leaving [`Stage::Sport`].
    pub sport: Option<String>,
    /// Home team, set once leaving [`Stage::Team1`].
    pub team1: Option<String>,
    /// Away team, set once leaving [`Stage::Team2`]; always differs from
    /// `team1`.
    pub team2: Option<String>,
    /// Home score entry.
    pub score1: ScoreField,
    /// Away score entry.
    pub score2: ScoreField,
    /// Side currently receiving scorer input during [`Stage::Scorers`].
    pub scoring_team: Option<Side>,
    /// Scorer names for the home side, in entry order.
    pub scorers_team1: Vec<String>,
    /// Scorer names for the away side, in entry order.
    pub scorers_team2: Vec<String>,
}

impl Session {
    /// Fresh idle session for a chat.
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            stage: Stage::Start,
            sport: None,
            team1: None,
            team2: None,
            score1: ScoreField::Unset,
            score2: ScoreField::Unset,
            scoring_team: None,
            scorers_team1: Vec::new(),
            scorers_team2: Vec::new(),
        }
    }

    /// Fresh session already waiting for a sport selection, as produced by the
    /// start command.
    pub fn fresh_flow(chat_id: ChatId) -> Self {
        Self {
            stage: Stage::Sport,
            ..Self::new(chat_id)
        }
    }

    /// Team name for a side, or a contract violation when it is not set yet.
    pub fn team_name(&self, side: Side) -> Result<&str, ContractViolation> {
        let team = match side {
            Side::Home => self.team1.as_deref(),
            Side::Away => self.team2.as_deref(),
        };
        team.ok_or(ContractViolation {
            stage: self.stage,
            detail: "team not selected",
        })
    }

    /// Committed score for a side, or a contract violation when it has not
    /// been committed.
    pub fn committed_score(&self, side: Side) -> Result<u32, ContractViolation> {
        let field = match side {
            Side::Home => &self.score1,
            Side::Away => &self.score2,
        };
        field.committed().ok_or(ContractViolation {
            stage: self.stage,
            detail: "score not committed",
        })
    }

    /// Mutable score field for a side.
    pub fn score_field_mut(&mut self, side: Side) -> &mut ScoreField {
        match side {
            Side::Home => &mut self.score1,
            Side::Away => &mut self.score2,
        }
    }

    /// Scorer list for a side.
    pub fn scorers(&self, side: Side) -> &Vec<String> {
        match side {
            Side::Home => &self.scorers_team1,
            Side::Away => &self.scorers_team2,
        }
    }

    /// Mutable scorer list for a side.
    pub fn scorers_mut(&mut self, side: Side) -> &mut Vec<String> {
        match side {
            Side::Home => &mut self.scorers_team1,
            Side::Away => &mut self.scorers_team2,
        }
    }

    /// Assemble the finalized match data. Only possible once every required
    /// field is set and committed; anything else is a contract violation.
    pub fn draft(&self) -> Result<MatchDraft, ContractViolation> {
        let missing = |detail| ContractViolation {
            stage: self.stage,
            detail,
        };

        Ok(MatchDraft {
            sport: self.sport.clone().ok_or(missing("sport not selected"))?,
            team1: self.team1.clone().ok_or(missing("home team not selected"))?,
            team2: self.team2.clone().ok_or(missing("away team not selected"))?,
            score1: self
                .score1
                .committed()
                .ok_or(missing("home score not committed"))?,
            score2: self
                .score2
                .committed()
                .ok_or(missing("away score not committed"))?,
            scorers_team1: self.scorers_team1.clone(),
            scorers_team2: self.scorers_team2.clone(),
        })
    }
}

/// Fully assembled match data awaiting confirmation. Scorer lists are either
/// empty or exactly as long as the matching score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDraft {
    /// Sport the match belongs to.
    pub sport: String,
    /// Home team name.
    pub team1: String,
    /// Away team name.
    pub team2: String,
    /// Home goals.
    pub score1: u32,
    /// Away goals.
    pub score2: u32,
    /// Home scorer names, in entry order.
    pub scorers_team1: Vec<String>,
    /// Away scorer names, in entry order.
    pub scorers_team2: Vec<String>,
}
