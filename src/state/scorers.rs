//! Scorer assignment: collect exactly one name (or skip) per goal for each
//! side that attributes goals.

use crate::dao::models::PLACEHOLDER_SCORER;
use crate::roster::Roster;
use crate::state::session::{ContractViolation, Session, Side, Stage};

/// Result of feeding one scorer entry to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScorerOutcome {
    /// Entry recorded; more slots remain for the side now designated by
    /// `scoring_team` (possibly the other side).
    Continue,
    /// Every required slot is filled; the session moved to confirmation.
    Done,
    /// The entry arrived for a side whose collection was already complete.
    /// The completion transition was re-run, so the session has still
    /// advanced; the caller should notify the user before prompting again.
    LateDuplicate {
        /// Team the late entry referred to.
        team: String,
        /// Whether the re-run completion reached confirmation.
        done: bool,
    },
}

/// The next side that still needs scorer input, searched home-first starting
/// after `after`. A side takes part only when its team attributes goals and
/// its score is positive.
pub fn next_scoring_side(
    session: &Session,
    roster: &Roster,
    after: Option<Side>,
) -> Result<Option<Side>, ContractViolation> {
    let candidates: &[Side] = match after {
        None => &[Side::Home, Side::Away],
        Some(Side::Home) => &[Side::Away],
        Some(Side::Away) => &[],
    };

    for &side in candidates {
        let team = session.team_name(side)?;
        let score = session.committed_score(side)?;
        if roster.scorers_enabled(team) && score > 0 {
            return Ok(Some(side));
        }
    }
    Ok(None)
}

/// Record one scorer entry for the current scoring side. `None` records the
/// placeholder for a skipped goal. Completing a side hands over to the next
/// eligible side or moves the session to confirmation.
pub fn record_entry(
    session: &mut Session,
    roster: &Roster,
    name: Option<String>,
) -> Result<ScorerOutcome, ContractViolation> {
    let side = session.scoring_team.ok_or(ContractViolation {
        stage: session.stage,
        detail: "no scoring team designated",
    })?;
    let target = session.committed_score(side)? as usize;

    if session.scorers(side).len() >= target {
        // Completion already ran for this side; answer with a notice but
        // still re-run the transition so a stale tap cannot wedge the flow.
        let team = session.team_name(side)?.to_owned();
        let done = complete_side(session, roster, side)?;
        return Ok(ScorerOutcome::LateDuplicate { team, done });
    }

    session
        .scorers_mut(side)
        .push(name.unwrap_or_else(|| PLACEHOLDER_SCORER.to_owned()));

    if session.scorers(side).len() < target {
        return Ok(ScorerOutcome::Continue);
    }

    if complete_side(session, roster, side)? {
        Ok(ScorerOutcome::Done)
    } else {
        Ok(ScorerOutcome::Continue)
    }
}

/// Completion transition for one side. Returns `true` when the session moved
/// to confirmation.
fn complete_side(
    session: &mut Session,
    roster: &Roster,
    side: Side,
) -> Result<bool, ContractViolation> {
    match next_scoring_side(session, roster, Some(side))? {
        Some(next) => {
            session.scoring_team = Some(next);
            Ok(false)
        }
        None => {
            session.scoring_team = None;
            session.stage = Stage::Confirmation;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dao::models::ChatId;
    use crate::roster::Team;
    use crate::state::score::ScoreField;

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
            Team {
                name: "Greens".into(),
                sport: "Soccer".into(),
                players: vec![],
                scorers_enabled: false,
            },
        ])
    }

    fn session(team1: &str, team2: &str, score1: u32, score2: u32) -> Session {
        let mut session = Session::fresh_flow(ChatId(1));
        session.sport = Some("Soccer".into());
        session.team1 = Some(team1.into());
        session.team2 = Some(team2.into());
        session.score1 = ScoreField::Committed(score1);
        session.score2 = ScoreField::Committed(score2);
        session.stage = Stage::Scorers;
        session.scoring_team = Some(Side::Home);
        session
    }

    #[test]
    fn collects_home_then_away_then_confirms() {
        let roster = roster();
        let mut session = session("Reds", "Blues", 2, 1);

        assert_eq!(
            record_entry(&mut session, &roster, Some("A".into())).unwrap(),
            ScorerOutcome::Continue
        );
        assert_eq!(
            record_entry(&mut session, &roster, Some("B".into())).unwrap(),
            ScorerOutcome::Continue
        );
        assert_eq!(session.scoring_team, Some(Side::Away));

        assert_eq!(
            record_entry(&mut session, &roster, Some("C".into())).unwrap(),
            ScorerOutcome::Done
        );
        assert_eq!(session.stage, Stage::Confirmation);
        assert_eq!(session.scorers_team1, vec!["A", "B"]);
        assert_eq!(session.scorers_team2, vec!["C"]);
    }

    #[test]
    fn zero_score_side_is_skipped() {
        let roster = roster();
        let mut session = session("Reds", "Blues", 1, 0);

        assert_eq!(
            record_entry(&mut session, &roster, Some("A".into())).unwrap(),
            ScorerOutcome::Done
        );
        assert_eq!(session.stage, Stage::Confirmation);
        assert!(session.scorers_team2.is_empty());
    }

    #[test]
    fn disabled_side_is_skipped() {
        let roster = roster();
        let mut session = session("Reds", "Greens", 1, 3);

        assert_eq!(
            record_entry(&mut session, &roster, Some("A".into())).unwrap(),
            ScorerOutcome::Done
        );
        assert!(session.scorers_team2.is_empty());
    }

    #[test]
    fn skip_records_the_placeholder_and_still_completes() {
        let roster = roster();
        let mut session = session("Reds", "Blues", 2, 0);

        record_entry(&mut session, &roster, None).unwrap();
        assert_eq!(
            record_entry(&mut session, &roster, None).unwrap(),
            ScorerOutcome::Done
        );
        assert_eq!(
            session.scorers_team1,
            vec![PLACEHOLDER_SCORER, PLACEHOLDER_SCORER]
        );
    }

    #[test]
    fn late_duplicate_reruns_the_completion_transition() {
        let roster = roster();
        let mut session = session("Reds", "Blues", 1, 0);
        record_entry(&mut session, &roster, Some("A".into())).unwrap();
        assert_eq!(session.stage, Stage::Confirmation);

        // Simulate a stale tap arriving while the side is already full.
        session.stage = Stage::Scorers;
        session.scoring_team = Some(Side::Home);
        let outcome = record_entry(&mut session, &roster, Some("B".into())).unwrap();

        assert_eq!(
            outcome,
            ScorerOutcome::LateDuplicate {
                team: "Reds".into(),
                done: true,
            }
        );
        assert_eq!(session.stage, Stage::Confirmation);
        assert_eq!(session.scorers_team1, vec!["A"]);
    }

    #[test]
    fn missing_scoring_team_is_a_contract_violation() {
        let roster = roster();
        let mut session = session("Reds", "Blues", 1, 0);
        session.scoring_team = None;
        assert!(record_entry(&mut session, &roster, None).is_err());
    }
}
