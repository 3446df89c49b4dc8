use crate::dao::models::ChatId;

/// Raw inbound event as delivered by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Chat the event originates from.
    pub chat_id: ChatId,
    /// What the user did.
    pub kind: EventKind,
}

/// The three shapes of user input the transport can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A named command, already stripped of any leading slash.
    Command(String),
    /// An opaque token attached to a pressed button.
    Selection(String),
    /// Free-form typed text.
    Text(String),
}

/// Tokens used on selection buttons. The decoder and the keyboard builders
/// share these so the grammar cannot drift.
pub mod token {
    /// Prefix for sport selection tokens.
    pub const SPORT: &str = "sport:";
    /// Prefix for team selection tokens.
    pub const TEAM: &str = "team:";
    /// Prefix for score keypad digit tokens.
    pub const DIGIT: &str = "digit:";
    /// Prefix for scorer selection tokens.
    pub const SCORER: &str = "scorer:";
    /// Prefix for standings sport-menu tokens.
    pub const STANDINGS: &str = "table:";
    /// Prefix for top-scorer sport-menu tokens.
    pub const TOP_SCORERS: &str = "top:";
    /// Keypad backspace.
    pub const DELETE: &str = "del";
    /// Keypad commit.
    pub const COMMIT: &str = "ok";
    /// Skip the current scorer slot.
    pub const SKIP: &str = "skip";
    /// Confirm the assembled match.
    pub const CONFIRM: &str = "confirm";
    /// Abort the flow.
    pub const CANCEL: &str = "cancel";
}

/// Inbound event after the one decoding step at the dispatch boundary.
///
/// The state machine matches on these tagged variants only; no token string
/// ever reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Start a fresh match registration (`/match`).
    NewMatch,
    /// Abort whatever is in progress.
    Cancel,
    /// Show the command overview.
    Help,
    /// Remove the chat's most recent match (`/undo`).
    Undo,
    /// Ask for standings; a sport still has to be chosen.
    StandingsMenu,
    /// Ask for top scorers; a sport still has to be chosen.
    TopScorersMenu,
    /// Standings for a specific sport.
    StandingsFor(String),
    /// Top scorers for a specific sport.
    TopScorersFor(String),
    /// A sport was selected during registration.
    Sport(String),
    /// A team was selected during registration.
    Team(String),
    /// A keypad digit was pressed.
    Digit(u8),
    /// Keypad backspace.
    Delete,
    /// Keypad commit.
    Commit,
    /// A scorer was selected for the current goal slot.
    Scorer(String),
    /// The current goal slot was skipped.
    Skip,
    /// The assembled match was confirmed.
    Confirm,
    /// Typed text; the machine interprets it per stage.
    FreeText(String),
    /// Anything the decoder does not recognise.
    Unknown,
}

impl FlowEvent {
    /// Decode a raw event kind into a tagged flow event. This is the only
    /// place token strings are interpreted.
    pub fn decode(kind: &EventKind) -> Self {
        match kind {
            EventKind::Command(name) => Self::decode_command(name),
            EventKind::Selection(sel) => Self::decode_selection(sel),
            EventKind::Text(text) => FlowEvent::FreeText(text.clone()),
        }
    }

    fn decode_command(name: &str) -> Self {
        match name.trim_start_matches('/') {
            "match" | "newmatch" => FlowEvent::NewMatch,
            "table" | "standings" => FlowEvent::StandingsMenu,
            "scorers" | "topscorers" => FlowEvent::TopScorersMenu,
            "undo" => FlowEvent::Undo,
            "cancel" => FlowEvent::Cancel,
            "help" | "start" => FlowEvent::Help,
            _ => FlowEvent::Unknown,
        }
    }

    fn decode_selection(sel: &str) -> Self {
        match sel {
            token::DELETE => return FlowEvent::Delete,
            token::COMMIT => return FlowEvent::Commit,
            token::SKIP => return FlowEvent::Skip,
            token::CONFIRM => return FlowEvent::Confirm,
            token::CANCEL => return FlowEvent::Cancel,
            _ => {}
        }

        if let Some(sport) = sel.strip_prefix(token::SPORT) {
            return FlowEvent::Sport(sport.into());
        }
        if let Some(team) = sel.strip_prefix(token::TEAM) {
            return FlowEvent::Team(team.into());
        }
        if let Some(digit) = sel.strip_prefix(token::DIGIT) {
            return match digit.parse::<u8>() {
                Ok(d) if d <= 9 => FlowEvent::Digit(d),
                _ => FlowEvent::Unknown,
            };
        }
        if let Some(name) = sel.strip_prefix(token::SCORER) {
            return FlowEvent::Scorer(name.into());
        }
        if let Some(sport) = sel.strip_prefix(token::STANDINGS) {
            return FlowEvent::StandingsFor(sport.into());
        }
        if let Some(sport) = sel.strip_prefix(token::TOP_SCORERS) {
            return FlowEvent::TopScorersFor(sport.into());
        }

        FlowEvent::Unknown
    }
}
