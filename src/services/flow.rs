//! Event dispatch boundary: decodes inbound events, serializes per-chat
//! processing, drives the state machine, and applies archive effects.

use time::OffsetDateTime;
use tracing::{error, info};

use crate::dao::models::{ChatId, NewMatchRecord};
use crate::dto::event::{token, FlowEvent, InboundEvent};
use crate::dto::view::{sport_keyboard, StatsKind, ViewMessage, ViewRequest};
use crate::error::ServiceError;
use crate::services::stats;
use crate::state::machine::{self, Effect};
use crate::state::session::MatchDraft;
use crate::state::SharedState;

/// Process one inbound event and return the prompts to send back.
///
/// This is the propagation boundary of the error taxonomy: any failure below
/// is logged, the chat's session is cleared so the user can restart cleanly,
/// and a generic failure prompt is returned.
pub async fn handle_event(state: &SharedState, event: InboundEvent) -> Vec<ViewRequest> {
    let chat_id = event.chat_id;
    match dispatch(state, event).await {
        Ok(replies) => replies,
        Err(err) => {
            error!(%chat_id, error = %err, "event processing failed; clearing session");
            state.clear_session(chat_id);
            let message = match err {
                ServiceError::Unavailable(_) => ViewMessage::StorageFailure,
                ServiceError::InvalidState(_) => ViewMessage::RestartRequired,
            };
            vec![ViewRequest::plain(chat_id, message)]
        }
    }
}

async fn dispatch(
    state: &SharedState,
    event: InboundEvent,
) -> Result<Vec<ViewRequest>, ServiceError> {
    let chat_id = event.chat_id;
    let flow_event = FlowEvent::decode(&event.kind);

    // One event at a time per chat; distinct chats proceed concurrently.
    let gate = state.chat_gate(chat_id);
    let _guard = gate.lock().await;

    match flow_event {
        FlowEvent::Help => Ok(vec![ViewRequest::plain(chat_id, ViewMessage::Help)]),
        FlowEvent::Undo => undo(state, chat_id).await,
        FlowEvent::StandingsMenu => stats_menu(state, chat_id, StatsKind::Standings).await,
        FlowEvent::TopScorersMenu => stats_menu(state, chat_id, StatsKind::TopScorers).await,
        FlowEvent::StandingsFor(sport) => standings_report(state, chat_id, sport).await,
        FlowEvent::TopScorersFor(sport) => top_scorer_report(state, chat_id, sport).await,
        other => run_machine(state, chat_id, other).await,
    }
}

async fn run_machine(
    state: &SharedState,
    chat_id: ChatId,
    event: FlowEvent,
) -> Result<Vec<ViewRequest>, ServiceError> {
    let outcome = state.with_session(chat_id, |session| {
        machine::step(session, state.roster(), event)
    })?;

    if outcome.clear_session {
        state.clear_session(chat_id);
    }

    let mut replies = outcome.replies;
    if let Some(Effect::Finalize(draft)) = outcome.effect {
        replies.extend(finalize(state, chat_id, draft).await?);
    }
    Ok(replies)
}

/// Persist a confirmed match, then read standings back for the sport. The
/// session is cleared only after the append succeeds; on failure the boundary
/// clears it anyway, so the user is never stuck mid-flow.
async fn finalize(
    state: &SharedState,
    chat_id: ChatId,
    draft: MatchDraft,
) -> Result<Vec<ViewRequest>, ServiceError> {
    let MatchDraft {
        sport,
        team1,
        team2,
        score1,
        score2,
        scorers_team1,
        scorers_team2,
    } = draft;

    let record = state
        .archive()
        .append(NewMatchRecord {
            chat_id,
            sport: sport.clone(),
            team1,
            team2,
            score1,
            score2,
            scorers_team1,
            scorers_team2,
            recorded_at: OffsetDateTime::now_utc(),
        })
        .await?;

    state.clear_session(chat_id);
    info!(%chat_id, sport = %sport, seq = record.seq, "match recorded");

    let records = state.archive().all().await?;
    let rows = stats::standings(&records, Some(&sport));

    Ok(vec![
        ViewRequest::plain(chat_id, ViewMessage::MatchSaved { record }),
        ViewRequest::plain(chat_id, ViewMessage::Standings { sport, rows }),
    ])
}

async fn undo(state: &SharedState, chat_id: ChatId) -> Result<Vec<ViewRequest>, ServiceError> {
    let removed = state.archive().remove_most_recent_for_chat(chat_id).await?;
    let message = match removed {
        Some(record) => {
            info!(%chat_id, seq = record.seq, "match removed by undo");
            ViewMessage::UndoneMatch { record }
        }
        None => ViewMessage::NothingToUndo,
    };
    Ok(vec![ViewRequest::plain(chat_id, message)])
}

/// Entry point for the report commands: answer directly when only one sport
/// exists, otherwise offer a sport menu.
async fn stats_menu(
    state: &SharedState,
    chat_id: ChatId,
    kind: StatsKind,
) -> Result<Vec<ViewRequest>, ServiceError> {
    let sports = state
        .roster()
        .sports()
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();

    match sports.as_slice() {
        [] => Ok(vec![ViewRequest::plain(
            chat_id,
            ViewMessage::NoSportsRegistered,
        )]),
        [only] => match kind {
            StatsKind::Standings => standings_report(state, chat_id, only.clone()).await,
            StatsKind::TopScorers => top_scorer_report(state, chat_id, only.clone()).await,
        },
        _ => {
            let prefix = match kind {
                StatsKind::Standings => token::STANDINGS,
                StatsKind::TopScorers => token::TOP_SCORERS,
            };
            Ok(vec![ViewRequest::with_keyboard(
                chat_id,
                ViewMessage::ChooseStatsSport { kind },
                sport_keyboard(sports.iter().map(String::as_str), prefix),
            )])
        }
    }
}

async fn standings_report(
    state: &SharedState,
    chat_id: ChatId,
    sport: String,
) -> Result<Vec<ViewRequest>, ServiceError> {
    let records = state.archive().all().await?;
    let rows = stats::standings(&records, Some(&sport));
    Ok(vec![ViewRequest::plain(
        chat_id,
        ViewMessage::Standings { sport, rows },
    )])
}

async fn top_scorer_report(
    state: &SharedState,
    chat_id: ChatId,
    sport: String,
) -> Result<Vec<ViewRequest>, ServiceError> {
    let records = state.archive().all().await?;
    let scorers = stats::top_scorers(&records, state.roster(), &sport);
    Ok(vec![ViewRequest::plain(
        chat_id,
        ViewMessage::TopScorerReport { sport, scorers },
    )])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;

    use crate::dao::archive::memory::MemoryArchive;
    use crate::dao::archive::MatchArchive;
    use crate::dao::models::MatchRecord;
    use crate::dao::storage::{StorageError, StorageResult};
    use crate::dto::event::EventKind;
    use crate::roster::Team;
    use crate::roster::Roster;
    use crate::state::AppState;

    use super::*;

    fn roster() -> Roster {
        Roster::from_teams(vec![
            Team {
                name: "Reds".into(),
                sport: "Soccer".into(),
                players: vec!["A".into(), "B".into()],
                scorers_enabled: true,
            },
            Team {
                name: "Blues".into(),
                sport: "Soccer".into(),
                players: vec!["C".into()],
                scorers_enabled: true,
            },
        ])
    }

    fn state() -> SharedState {
        AppState::new(roster(), Arc::new(MemoryArchive::new()))
    }

    async fn send(state: &SharedState, chat: i64, kind: EventKind) -> Vec<ViewRequest> {
        handle_event(
            state,
            InboundEvent {
                chat_id: ChatId(chat),
                kind,
            },
        )
        .await
    }

    async fn select(state: &SharedState, chat: i64, sel: &str) -> Vec<ViewRequest> {
        send(state, chat, EventKind::Selection(sel.into())).await
    }

    async fn register_reds_vs_blues(state: &SharedState, chat: i64) -> Vec<ViewRequest> {
        send(state, chat, EventKind::Command("match".into())).await;
        select(state, chat, "sport:Soccer").await;
        select(state, chat, "team:Reds").await;
        select(state, chat, "team:Blues").await;
        select(state, chat, "digit:2").await;
        select(state, chat, "ok").await;
        select(state, chat, "digit:1").await;
        select(state, chat, "ok").await;
        select(state, chat, "scorer:A").await;
        select(state, chat, "scorer:B").await;
        select(state, chat, "scorer:C").await;
        select(state, chat, "confirm").await
    }

    #[tokio::test]
    async fn full_flow_persists_the_record_and_reports_standings() {
        let state = state();
        let replies = register_reds_vs_blues(&state, 1).await;

        let ViewMessage::MatchSaved { record } = &replies[0].message else {
            panic!("expected match-saved reply, got {:?}", replies[0].message);
        };
        assert_eq!(record.inner.sport, "Soccer");
        assert_eq!(record.inner.score1, 2);
        assert_eq!(record.inner.score2, 1);
        assert_eq!(record.inner.scorers_team1, vec!["A", "B"]);
        assert_eq!(record.inner.scorers_team2, vec!["C"]);

        let ViewMessage::Standings { rows, .. } = &replies[1].message else {
            panic!("expected standings reply, got {:?}", replies[1].message);
        };
        assert_eq!(rows[0].team, "Reds");
        assert_eq!(rows[0].points, 3);
        assert_eq!(rows[0].goal_difference, 1);
        assert_eq!(rows[1].team, "Blues");
        assert_eq!(rows[1].points, 0);

        // The session is gone; the flow can only restart explicitly.
        assert!(state.session_snapshot(ChatId(1)).is_none());
        assert_eq!(state.archive().all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn undo_removes_the_most_recent_match() {
        let state = state();
        register_reds_vs_blues(&state, 1).await;

        let replies = send(&state, 1, EventKind::Command("undo".into())).await;
        assert!(matches!(
            replies[0].message,
            ViewMessage::UndoneMatch { .. }
        ));
        assert!(state.archive().all().await.unwrap().is_empty());

        let replies = send(&state, 1, EventKind::Command("undo".into())).await;
        assert!(matches!(replies[0].message, ViewMessage::NothingToUndo));
    }

    #[tokio::test]
    async fn single_sport_report_skips_the_menu() {
        let state = state();
        register_reds_vs_blues(&state, 1).await;

        let replies = send(&state, 1, EventKind::Command("table".into())).await;
        assert!(matches!(replies[0].message, ViewMessage::Standings { .. }));

        let replies = send(&state, 1, EventKind::Command("scorers".into())).await;
        let ViewMessage::TopScorerReport { scorers, .. } = &replies[0].message else {
            panic!("expected top scorer reply");
        };
        let stats::TopScorers::Table(rows) = scorers else {
            panic!("expected a tally table");
        };
        assert_eq!(rows[0].goals, 1);
    }

    #[tokio::test]
    async fn chats_do_not_share_sessions_or_histories() {
        let state = state();
        register_reds_vs_blues(&state, 1).await;

        send(&state, 2, EventKind::Command("match".into())).await;
        select(&state, 2, "sport:Soccer").await;
        // Chat 2 is mid-flow; chat 1 can still undo its own record.
        let replies = send(&state, 1, EventKind::Command("undo".into())).await;
        assert!(matches!(
            replies[0].message,
            ViewMessage::UndoneMatch { .. }
        ));

        let replies = send(&state, 2, EventKind::Command("undo".into())).await;
        assert!(matches!(replies[0].message, ViewMessage::NothingToUndo));
    }

    /// Archive stub whose writes always fail, for the persistence-failure
    /// taxonomy.
    struct BrokenArchive;

    fn broken() -> StorageError {
        StorageError::unavailable(
            "disk on fire".into(),
            std::io::Error::other("disk on fire"),
        )
    }

    impl MatchArchive for BrokenArchive {
        fn append(&self, _: NewMatchRecord) -> BoxFuture<'static, StorageResult<MatchRecord>> {
            Box::pin(async { Err(broken()) })
        }

        fn remove_most_recent_for_chat(
            &self,
            _: ChatId,
        ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>> {
            Box::pin(async { Err(broken()) })
        }

        fn all(&self) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>> {
            Box::pin(async { Err(broken()) })
        }
    }

    #[tokio::test]
    async fn persistence_failure_reports_and_clears_the_session() {
        let state = AppState::new(roster(), Arc::new(BrokenArchive));
        let replies = register_reds_vs_blues(&state, 1).await;

        assert!(matches!(replies[0].message, ViewMessage::StorageFailure));
        assert!(state.session_snapshot(ChatId(1)).is_none());
    }

    #[tokio::test]
    async fn stale_selection_mid_flow_is_rejected_without_corruption() {
        let state = state();
        send(&state, 1, EventKind::Command("match".into())).await;
        select(&state, 1, "sport:Soccer").await;
        select(&state, 1, "team:Reds").await;
        let before = state.session_snapshot(ChatId(1)).unwrap();

        // A stale sport button from the edited-away first keyboard.
        let replies = select(&state, 1, "sport:Soccer").await;
        assert!(matches!(
            replies[0].message,
            ViewMessage::UnexpectedInput { .. }
        ));
        assert_eq!(state.session_snapshot(ChatId(1)).unwrap(), before);
    }
}
