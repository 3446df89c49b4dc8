//! Matchbook binary entrypoint: a line-oriented console front end around the
//! conversation core. It decodes typed input into core events and renders
//! view requests as text, standing in for a real chat transport.

use std::sync::Arc;

use anyhow::Context;
use time::format_description::well_known::Rfc3339;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchbook::config::AppConfig;
use matchbook::dao::archive::file::FileArchive;
use matchbook::dao::models::{ChatId, MatchRecord};
use matchbook::dto::event::{EventKind, InboundEvent};
use matchbook::dto::view::{Key, StatsKind, ViewMessage, ViewRequest};
use matchbook::roster::Roster;
use matchbook::services::flow;
use matchbook::services::stats::{StandingsRow, TopScorers};
use matchbook::state::AppState;

/// The console acts as a single chat.
const CONSOLE_CHAT: ChatId = ChatId(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let roster = Roster::load(config.roster_path());
    let archive = FileArchive::open(config.archive_path())
        .await
        .context("opening match archive")?;

    let state = AppState::new(roster, Arc::new(archive));
    info!("matchbook console ready; type /help for commands, quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Buttons offered by the most recent prompt, selectable by number.
    let mut options: Vec<Key> = Vec::new();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = shutdown_signal() => break,
        };
        let Some(line) = line else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        let kind = decode_input(input, &options);
        let replies = flow::handle_event(
            &state,
            InboundEvent {
                chat_id: CONSOLE_CHAT,
                kind,
            },
        )
        .await;

        options.clear();
        for reply in &replies {
            println!("{}", render(reply));
            for key in reply.keyboard.iter().flatten() {
                options.push(key.clone());
                println!("  [{}] {}", options.len(), key.label);
            }
        }
    }

    info!("shutting down");
    Ok(())
}

/// Map a typed line to an event: `/name` is a command, a number picks a button
/// from the last prompt, anything else is free text.
fn decode_input(input: &str, options: &[Key]) -> EventKind {
    if let Some(command) = input.strip_prefix('/') {
        return EventKind::Command(command.to_owned());
    }

    if let Ok(number) = input.parse::<usize>()
        && number >= 1
        && let Some(key) = options.get(number - 1)
    {
        return EventKind::Selection(key.token.clone());
    }

    EventKind::Text(input.to_owned())
}

/// English rendering of a view request. All copy lives here, outside the core.
fn render(view: &ViewRequest) -> String {
    match &view.message {
        ViewMessage::Help => "Commands: /match record a match, /table standings, \
                              /scorers top scorers, /undo remove your last match, \
                              /cancel abort"
            .into(),
        ViewMessage::ChooseSport => "Which sport?".into(),
        ViewMessage::NoTeamsForSport { sport } => {
            format!("No teams are registered for {sport}. Nothing to record.")
        }
        ViewMessage::ChooseFirstTeam { sport } => format!("{sport}: pick the home team."),
        ViewMessage::NoOpponentForTeam { sport, team } => {
            format!("{team} is the only {sport} team; no opponent available.")
        }
        ViewMessage::ChooseSecondTeam { team1, .. } => {
            format!("Who did {team1} play against?")
        }
        ViewMessage::EnterScore { team, entered } => match entered {
            Some(value) => format!("Score for {team}: {value} (OK to confirm)"),
            None => format!("Enter the score for {team}."),
        },
        ViewMessage::ChooseScorer { team, slot, total } => {
            format!("Who scored goal {slot} of {total} for {team}?")
        }
        ViewMessage::ScorersAlreadyComplete { team } => {
            format!("All goals for {team} are already assigned.")
        }
        ViewMessage::ConfirmMatch { draft } => format!(
            "Save this match? {} {} - {} {}{}",
            draft.team1,
            draft.score1,
            draft.score2,
            draft.team2,
            render_scorer_summary(&draft.scorers_team1, &draft.scorers_team2),
        ),
        ViewMessage::MatchSaved { record } => {
            format!("Saved: {}.", render_record(record))
        }
        ViewMessage::Standings { sport, rows } => render_standings(sport, rows),
        ViewMessage::TopScorerReport { sport, scorers } => render_top_scorers(sport, scorers),
        ViewMessage::ChooseStatsSport { kind } => match kind {
            StatsKind::Standings => "Standings for which sport?".into(),
            StatsKind::TopScorers => "Top scorers for which sport?".into(),
        },
        ViewMessage::NoSportsRegistered => "No sports are registered yet.".into(),
        ViewMessage::UndoneMatch { record } => {
            format!("Removed your last match: {}.", render_record(record))
        }
        ViewMessage::NothingToUndo => "You have no recorded matches to undo.".into(),
        ViewMessage::Cancelled => "Cancelled. Nothing was saved.".into(),
        ViewMessage::UnexpectedInput { stage } => {
            format!("That input does not belong to the current step ({stage:?}).")
        }
        ViewMessage::RestartRequired => {
            "Something went wrong with this registration; please start over with /match.".into()
        }
        ViewMessage::StorageFailure => {
            "The match could not be saved right now; please try again later.".into()
        }
    }
}

fn render_record(record: &MatchRecord) -> String {
    let inner = &record.inner;
    let when = inner
        .recorded_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown time".into());
    format!(
        "{} {} - {} {} ({}, {when})",
        inner.team1, inner.score1, inner.score2, inner.team2, inner.sport
    )
}

fn render_scorer_summary(scorers1: &[String], scorers2: &[String]) -> String {
    if scorers1.is_empty() && scorers2.is_empty() {
        return String::new();
    }
    format!(
        " (scorers: {} / {})",
        if scorers1.is_empty() {
            "-".to_owned()
        } else {
            scorers1.join(", ")
        },
        if scorers2.is_empty() {
            "-".to_owned()
        } else {
            scorers2.join(", ")
        },
    )
}

fn render_standings(sport: &str, rows: &[StandingsRow]) -> String {
    if rows.is_empty() {
        return format!("No matches recorded for {sport} yet.");
    }
    let mut out = format!("{sport} standings:\n");
    out.push_str("     Team                 P   GF  GA   GD  Pts\n");
    for (rank, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<20} {:>2} {:>4} {:>3} {:>4} {:>4}\n",
            rank + 1,
            row.team,
            row.games_played,
            row.goals_for,
            row.goals_against,
            row.goal_difference,
            row.points,
        ));
    }
    out.pop();
    out
}

fn render_top_scorers(sport: &str, scorers: &TopScorers) -> String {
    match scorers {
        TopScorers::Disabled => {
            format!("Scorer tracking is disabled for every {sport} team.")
        }
        TopScorers::NoneRecorded => {
            format!("No scorers have been recorded for {sport} yet.")
        }
        TopScorers::Table(rows) => {
            let mut out = format!("{sport} top scorers:\n");
            for (rank, row) in rows.iter().enumerate() {
                out.push_str(&format!("{:>3}. {} ({})\n", rank + 1, row.name, row.goals));
            }
            out.pop();
            out
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the console down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
