//! Conversation state machine driving the match-registration flow.
//!
//! [`step`] consumes one decoded [`FlowEvent`] against a session and returns
//! the prompts to send plus an optional side effect. It performs no I/O; the
//! dispatch service owns archive writes and session clearing.

use crate::dto::event::{token, FlowEvent};
use crate::dto::view::{
    confirm_keyboard, digit_keyboard, scorer_keyboard, sport_keyboard, team_keyboard, ViewMessage,
    ViewRequest,
};
use crate::roster::Roster;
use crate::state::scorers::{self, ScorerOutcome};
use crate::state::session::{ContractViolation, MatchDraft, Session, Side, Stage};

/// Side effect the dispatch service must perform after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist the confirmed match and report standings back.
    Finalize(MatchDraft),
}

/// Result of applying one event to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Prompts to send, in order.
    pub replies: Vec<ViewRequest>,
    /// Side effect to perform, if any.
    pub effect: Option<Effect>,
    /// Whether the session should be removed from the store.
    pub clear_session: bool,
}

impl StepOutcome {
    fn reply(request: ViewRequest) -> Self {
        Self {
            replies: vec![request],
            effect: None,
            clear_session: false,
        }
    }

    fn cleared(request: ViewRequest) -> Self {
        Self {
            replies: vec![request],
            effect: None,
            clear_session: true,
        }
    }
}

/// Apply one event to the session, per the stage transition table.
///
/// A contract violation means the session's fields do not satisfy what its
/// stage requires; the caller must clear the session and tell the user to
/// restart.
pub fn step(
    session: &mut Session,
    roster: &Roster,
    event: FlowEvent,
) -> Result<StepOutcome, ContractViolation> {
    // Flow-global intents first: they are legal from every stage.
    match event {
        FlowEvent::NewMatch => return Ok(start_flow(session, roster)),
        FlowEvent::Cancel => {
            return Ok(StepOutcome::cleared(ViewRequest::plain(
                session.chat_id,
                ViewMessage::Cancelled,
            )));
        }
        _ => {}
    }

    match (session.stage, event) {
        (Stage::Sport, FlowEvent::Sport(sport)) => select_sport(session, roster, sport),
        (Stage::Team1, FlowEvent::Team(team)) => select_first_team(session, roster, team),
        (Stage::Team2, FlowEvent::Team(team)) => select_second_team(session, roster, team),
        (Stage::Score1, FlowEvent::Digit(d)) => score_digit(session, Side::Home, Some(d)),
        (Stage::Score1, FlowEvent::Delete) => score_digit(session, Side::Home, None),
        (Stage::Score1, FlowEvent::Commit) => commit_home_score(session),
        (Stage::Score2, FlowEvent::Digit(d)) => score_digit(session, Side::Away, Some(d)),
        (Stage::Score2, FlowEvent::Delete) => score_digit(session, Side::Away, None),
        (Stage::Score2, FlowEvent::Commit) => commit_away_score(session, roster),
        (Stage::Scorers, FlowEvent::Scorer(name)) => scorer_entry(session, roster, Some(name)),
        (Stage::Scorers, FlowEvent::FreeText(name)) => scorer_entry(session, roster, Some(name)),
        (Stage::Scorers, FlowEvent::Skip) => scorer_entry(session, roster, None),
        (Stage::Confirmation, FlowEvent::Confirm) => confirm(session),
        (Stage::Start, _) => Ok(StepOutcome::reply(ViewRequest::plain(
            session.chat_id,
            ViewMessage::Help,
        ))),
        // An event shaped for a different stage never mutates the session;
        // stale buttons from an edited-away keyboard land here.
        (stage, _) => Ok(StepOutcome::reply(ViewRequest::plain(
            session.chat_id,
            ViewMessage::UnexpectedInput { stage },
        ))),
    }
}

fn start_flow(session: &mut Session, roster: &Roster) -> StepOutcome {
    let sports = roster.sports();
    if sports.is_empty() {
        return StepOutcome::cleared(ViewRequest::plain(
            session.chat_id,
            ViewMessage::NoSportsRegistered,
        ));
    }

    *session = Session::fresh_flow(session.chat_id);
    StepOutcome::reply(ViewRequest::with_keyboard(
        session.chat_id,
        ViewMessage::ChooseSport,
        sport_keyboard(sports, token::SPORT),
    ))
}

fn select_sport(
    session: &mut Session,
    roster: &Roster,
    sport: String,
) -> Result<StepOutcome, ContractViolation> {
    let teams = roster.teams_for_sport(&sport);
    if teams.is_empty() {
        // Roster gap: nothing to pick, abort to a clean start.
        return Ok(StepOutcome::cleared(ViewRequest::plain(
            session.chat_id,
            ViewMessage::NoTeamsForSport { sport },
        )));
    }

    let keyboard = team_keyboard(&teams, None);
    session.sport = Some(sport.clone());
    session.stage = Stage::Team1;
    Ok(StepOutcome::reply(ViewRequest::with_keyboard(
        session.chat_id,
        ViewMessage::ChooseFirstTeam { sport },
        keyboard,
    )))
}

fn select_first_team(
    session: &mut Session,
    roster: &Roster,
    team: String,
) -> Result<StepOutcome, ContractViolation> {
    let sport = session.sport.clone().ok_or(ContractViolation {
        stage: session.stage,
        detail: "sport not selected",
    })?;

    if !team_belongs_to_sport(roster, &team, &sport) {
        return Ok(unexpected(session));
    }

    let opponents = roster
        .teams_for_sport(&sport)
        .into_iter()
        .filter(|candidate| candidate.name != team)
        .collect::<Vec<_>>();
    if opponents.is_empty() {
        // Only one team registered for this sport; no match can be recorded.
        return Ok(StepOutcome::cleared(ViewRequest::plain(
            session.chat_id,
            ViewMessage::NoOpponentForTeam { sport, team },
        )));
    }

    let keyboard = team_keyboard(&opponents, None);
    session.team1 = Some(team.clone());
    session.stage = Stage::Team2;
    Ok(StepOutcome::reply(ViewRequest::with_keyboard(
        session.chat_id,
        ViewMessage::ChooseSecondTeam { sport, team1: team },
        keyboard,
    )))
}

fn select_second_team(
    session: &mut Session,
    roster: &Roster,
    team: String,
) -> Result<StepOutcome, ContractViolation> {
    let sport = session.sport.clone().ok_or(ContractViolation {
        stage: session.stage,
        detail: "sport not selected",
    })?;
    let team1 = session.team_name(Side::Home)?.to_owned();

    if team == team1 || !team_belongs_to_sport(roster, &team, &sport) {
        return Ok(unexpected(session));
    }

    session.team2 = Some(team);
    session.scoring_team = Some(Side::Home);
    session.stage = Stage::Score1;
    Ok(StepOutcome::reply(score_prompt(session, Side::Home)?))
}

fn score_digit(
    session: &mut Session,
    side: Side,
    digit: Option<u8>,
) -> Result<StepOutcome, ContractViolation> {
    let field = session.score_field_mut(side);
    match digit {
        Some(d) => field.push_digit(d),
        None => field.delete_digit(),
    }
    Ok(StepOutcome::reply(score_prompt(session, side)?))
}

fn commit_home_score(session: &mut Session) -> Result<StepOutcome, ContractViolation> {
    session.score_field_mut(Side::Home).commit();
    session.stage = Stage::Score2;
    Ok(StepOutcome::reply(score_prompt(session, Side::Away)?))
}

fn commit_away_score(
    session: &mut Session,
    roster: &Roster,
) -> Result<StepOutcome, ContractViolation> {
    session.score_field_mut(Side::Away).commit();

    match scorers::next_scoring_side(session, roster, None)? {
        Some(side) => {
            session.scoring_team = Some(side);
            session.stage = Stage::Scorers;
            Ok(StepOutcome::reply(scorer_prompt(session, roster)?))
        }
        None => {
            // No side attributes goals (or both scores are zero): skip the
            // scorers stage entirely.
            session.scoring_team = None;
            session.stage = Stage::Confirmation;
            Ok(StepOutcome::reply(confirm_prompt(session)?))
        }
    }
}

fn scorer_entry(
    session: &mut Session,
    roster: &Roster,
    name: Option<String>,
) -> Result<StepOutcome, ContractViolation> {
    let outcome = scorers::record_entry(session, roster, name)?;

    let mut replies = Vec::new();
    let done = match outcome {
        ScorerOutcome::Continue => false,
        ScorerOutcome::Done => true,
        ScorerOutcome::LateDuplicate { team, done } => {
            replies.push(ViewRequest::plain(
                session.chat_id,
                ViewMessage::ScorersAlreadyComplete { team },
            ));
            done
        }
    };

    if done {
        replies.push(confirm_prompt(session)?);
    } else {
        replies.push(scorer_prompt(session, roster)?);
    }

    Ok(StepOutcome {
        replies,
        effect: None,
        clear_session: false,
    })
}

fn confirm(session: &mut Session) -> Result<StepOutcome, ContractViolation> {
    let draft = session.draft()?;
    Ok(StepOutcome {
        replies: Vec::new(),
        effect: Some(Effect::Finalize(draft)),
        clear_session: false,
    })
}

fn unexpected(session: &Session) -> StepOutcome {
    StepOutcome::reply(ViewRequest::plain(
        session.chat_id,
        ViewMessage::UnexpectedInput {
            stage: session.stage,
        },
    ))
}

fn team_belongs_to_sport(roster: &Roster, team: &str, sport: &str) -> bool {
    roster
        .team(team)
        .map(|entry| entry.sport == sport)
        .unwrap_or(false)
}

fn score_prompt(session: &Session, side: Side) -> Result<ViewRequest, ContractViolation> {
    let team = session.team_name(side)?.to_owned();
    let entered = match side {
        Side::Home => session.score1.entered(),
        Side::Away => session.score2.entered(),
    };
    Ok(ViewRequest::with_keyboard(
        session.chat_id,
        ViewMessage::EnterScore { team, entered },
        digit_keyboard(),
    ))
}

fn scorer_prompt(session: &Session, roster: &Roster) -> Result<ViewRequest, ContractViolation> {
    let side = session.scoring_team.ok_or(ContractViolation {
        stage: session.stage,
        detail: "no scoring team designated",
    })?;
    let team = session.team_name(side)?.to_owned();
    let total = session.committed_score(side)?;
    let slot = session.scorers(side).len() as u32 + 1;

    let players = roster
        .team(&team)
        .map(|entry| entry.players.clone())
        .unwrap_or_default();

    Ok(ViewRequest::with_keyboard(
        session.chat_id,
        ViewMessage::ChooseScorer { team, slot, total },
        scorer_keyboard(&players),
    ))
}

fn confirm_prompt(session: &Session) -> Result<ViewRequest, ContractViolation> {
    Ok(ViewRequest::with_keyboard(
        session.chat_id,
        ViewMessage::ConfirmMatch {
            draft: session.draft()?,
        },
        confirm_keyboard(),
    ))
}
