use crate::dao::models::{ChatId, MatchRecord};
use crate::dto::event::token;
use crate::roster::Team;
use crate::services::stats::{StandingsRow, TopScorers};
use crate::state::session::{MatchDraft, Stage};

/// One button: a human-facing label and the opaque token sent back when it is
/// pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Display label. The presentation layer may localise it.
    pub label: String,
    /// Token delivered as an [`super::event::EventKind::Selection`].
    pub token: String,
}

impl Key {
    fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Button grid attached to a prompt, rendered row by row.
pub type Keyboard = Vec<Vec<Key>>;

/// Which derived report a sport menu leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    /// League table.
    Standings,
    /// Top scorer list.
    TopScorers,
}

/// Message for the user, identified by name and structured parameters only.
///
/// The core never assembles human-readable copy; the presentation layer owns
/// the wording for every variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMessage {
    /// Overview of available commands.
    Help,
    /// Ask which sport the match belongs to.
    ChooseSport,
    /// The chosen sport has no registered teams; flow was aborted.
    NoTeamsForSport {
        /// Sport that came up empty.
        sport: String,
    },
    /// Ask for the home team.
    ChooseFirstTeam {
        /// Sport being registered.
        sport: String,
    },
    /// Only one team exists for the sport; flow was aborted.
    NoOpponentForTeam {
        /// Sport being registered.
        sport: String,
        /// The single registered team.
        team: String,
    },
    /// Ask for the away team.
    ChooseSecondTeam {
        /// Sport being registered.
        sport: String,
        /// Already-selected home team, excluded from the options.
        team1: String,
    },
    /// Show the score keypad for one side.
    EnterScore {
        /// Team whose score is being entered.
        team: String,
        /// Digits entered so far, if any.
        entered: Option<u32>,
    },
    /// Ask who scored one particular goal.
    ChooseScorer {
        /// Team currently receiving scorer input.
        team: String,
        /// 1-based index of the goal being attributed.
        slot: u32,
        /// Total goals the team scored.
        total: u32,
    },
    /// A scorer arrived for a team whose collection is already complete.
    ScorersAlreadyComplete {
        /// Team the late entry referred to.
        team: String,
    },
    /// Present the assembled match for confirmation.
    ConfirmMatch {
        /// Everything about to be persisted.
        draft: MatchDraft,
    },
    /// The match was persisted.
    MatchSaved {
        /// The stored record, including its archive sequence number.
        record: MatchRecord,
    },
    /// League table for a sport.
    Standings {
        /// Sport the table covers.
        sport: String,
        /// Rows in final ranking order.
        rows: Vec<StandingsRow>,
    },
    /// Top scorer report for a sport.
    TopScorerReport {
        /// Sport the report covers.
        sport: String,
        /// Tally outcome, including the disabled/empty distinctions.
        scorers: TopScorers,
    },
    /// Ask which sport a derived report should cover.
    ChooseStatsSport {
        /// Report the chosen sport will feed.
        kind: StatsKind,
    },
    /// No sport has any registered team; nothing to report on.
    NoSportsRegistered,
    /// The chat's most recent match was removed.
    UndoneMatch {
        /// The removed record.
        record: MatchRecord,
    },
    /// Undo was requested but the chat has no recorded matches.
    NothingToUndo,
    /// The flow was cancelled and the session cleared.
    Cancelled,
    /// The event does not belong to the current stage; nothing changed.
    UnexpectedInput {
        /// Stage the session was in when the event arrived.
        stage: Stage,
    },
    /// Internal state was inconsistent; the session was cleared.
    RestartRequired,
    /// The archive could not be read or written; the session was cleared.
    StorageFailure,
}

/// A complete outbound prompt: recipient, message and button grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    /// Chat the prompt goes to.
    pub chat_id: ChatId,
    /// What to say.
    pub message: ViewMessage,
    /// Buttons to offer, possibly empty.
    pub keyboard: Keyboard,
}

impl ViewRequest {
    /// Prompt without buttons.
    pub fn plain(chat_id: ChatId, message: ViewMessage) -> Self {
        Self {
            chat_id,
            message,
            keyboard: Vec::new(),
        }
    }

    /// Prompt with a button grid.
    pub fn with_keyboard(
        chat_id: ChatId,
        message: ViewMessage,
        keyboard: Keyboard,
    ) -> Self {
        Self {
            chat_id,
            message,
            keyboard,
        }
    }
}

/// One sport per row, tokens built from the given prefix so the same menu
/// serves registration (`sport:`) and the report menus (`table:`, `top:`).
pub fn sport_keyboard<'a>(sports: impl IntoIterator<Item = &'a str>, prefix: &str) -> Keyboard {
    sports
        .into_iter()
        .map(|sport| vec![Key::new(sport, format!("{prefix}{sport}"))])
        .collect()
}

/// One team per row, excluding `exclude` (the already-picked side).
pub fn team_keyboard(teams: &[&Team], exclude: Option<&str>) -> Keyboard {
    teams
        .iter()
        .filter(|team| Some(team.name.as_str()) != exclude)
        .map(|team| vec![Key::new(&team.name, format!("{}{}", token::TEAM, team.name))])
        .collect()
}

/// Phone-style score keypad: digits 1-9, then delete / 0 / commit.
pub fn digit_keyboard() -> Keyboard {
    let digit = |d: u8| Key::new(d.to_string(), format!("{}{d}", token::DIGIT));
    vec![
        vec![digit(1), digit(2), digit(3)],
        vec![digit(4), digit(5), digit(6)],
        vec![digit(7), digit(8), digit(9)],
        vec![
            Key::new("⌫", token::DELETE),
            digit(0),
            Key::new("OK", token::COMMIT),
        ],
    ]
}

/// One player per row plus a skip row. Empty rosters still get the skip row so
/// the flow can always complete.
pub fn scorer_keyboard(players: &[String]) -> Keyboard {
    let mut rows: Keyboard = players
        .iter()
        .map(|player| vec![Key::new(player, format!("{}{}", token::SCORER, player))])
        .collect();
    rows.push(vec![Key::new("Skip", token::SKIP)]);
    rows
}

/// Confirm / cancel pair for the final stage.
pub fn confirm_keyboard() -> Keyboard {
    vec![vec![
        Key::new("Confirm", token::CONFIRM),
        Key::new("Cancel", token::CANCEL),
    ]]
}
