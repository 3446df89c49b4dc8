//! Aggregation over the match archive: league standings and top scorers.
//! Everything here is derived on demand and never stored.

use std::collections::HashMap;

use crate::dao::models::{MatchRecord, PLACEHOLDER_SCORER};
use crate::roster::Roster;

/// Points for a win / a draw.
const WIN_POINTS: u32 = 3;
const DRAW_POINTS: u32 = 1;
/// How many names a top-scorer table shows.
const TOP_SCORERS_LIMIT: usize = 5;

/// One line of a league table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsRow {
    /// Team name.
    pub team: String,
    /// Matches the team appeared in.
    pub games_played: u32,
    /// Goals scored.
    pub goals_for: u32,
    /// Goals conceded.
    pub goals_against: u32,
    /// `goals_for - goals_against`.
    pub goal_difference: i64,
    /// League points: 3 per win, 1 per draw.
    pub points: u32,
}

/// Outcome of a top-scorer query. The empty cases are deliberately distinct:
/// a sport without attribution reports differently from one where nobody has
/// been named yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopScorers {
    /// No team of the sport attributes goals to scorers.
    Disabled,
    /// Attribution is on but no scorer name was ever recorded.
    NoneRecorded,
    /// The top names, goal count descending then name ascending.
    Table(Vec<TallyRow>),
}

/// One tally entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRow {
    /// Scorer name as recorded.
    pub name: String,
    /// Attributed goal count.
    pub goals: u32,
}

/// Compute the league table over the given records, optionally restricted to
/// one sport. Ordering is a total order: points, then goal difference, then
/// goals for (all descending), then team name ascending.
pub fn standings(records: &[MatchRecord], sport: Option<&str>) -> Vec<StandingsRow> {
    let mut table: HashMap<&str, StandingsRow> = HashMap::new();

    for record in records {
        if let Some(sport) = sport
            && !record.is_for_sport(sport)
        {
            continue;
        }

        let inner = &record.inner;
        tally_side(&mut table, &inner.team1, inner.score1, inner.score2);
        tally_side(&mut table, &inner.team2, inner.score2, inner.score1);
    }

    let mut rows = table.into_values().collect::<Vec<_>>();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_difference.cmp(&a.goal_difference))
            .then(b.goals_for.cmp(&a.goals_for))
            .then(a.team.cmp(&b.team))
    });
    rows
}

fn tally_side<'a>(
    table: &mut HashMap<&'a str, StandingsRow>,
    team: &'a str,
    scored: u32,
    conceded: u32,
) {
    let row = table.entry(team).or_insert_with(|| StandingsRow {
        team: team.to_owned(),
        games_played: 0,
        goals_for: 0,
        goals_against: 0,
        goal_difference: 0,
        points: 0,
    });

    row.games_played += 1;
    row.goals_for += scored;
    row.goals_against += conceded;
    row.goal_difference = i64::from(row.goals_for) - i64::from(row.goals_against);
    row.points += if scored > conceded {
        WIN_POINTS
    } else if scored == conceded {
        DRAW_POINTS
    } else {
        0
    };
}

/// Tally goals per scorer name for one sport across both sides of every
/// match, excluding placeholder and blank entries.
pub fn top_scorers(records: &[MatchRecord], roster: &Roster, sport: &str) -> TopScorers {
    if !roster.scorers_enabled_for_sport(sport) {
        return TopScorers::Disabled;
    }

    let mut tally: HashMap<&str, u32> = HashMap::new();
    for record in records {
        if !record.is_for_sport(sport) {
            continue;
        }
        for name in record
            .inner
            .scorers_team1
            .iter()
            .chain(record.inner.scorers_team2.iter())
        {
            if name == PLACEHOLDER_SCORER || name.trim().is_empty() {
                continue;
            }
            *tally.entry(name).or_default() += 1;
        }
    }

    if tally.is_empty() {
        return TopScorers::NoneRecorded;
    }

    let mut rows = tally
        .into_iter()
        .map(|(name, goals)| TallyRow {
            name: name.to_owned(),
            goals,
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.goals.cmp(&a.goals).then(a.name.cmp(&b.name)));
    rows.truncate(TOP_SCORERS_LIMIT);
    TopScorers::Table(rows)
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::dao::models::{ChatId, NewMatchRecord};
    use crate::roster::Team;

    use super::*;

    fn record(
        sport: &str,
        team1: &str,
        team2: &str,
        score1: u32,
        score2: u32,
        scorers1: &[&str],
        scorers2: &[&str],
    ) -> MatchRecord {
        MatchRecord {
            seq: 0,
            inner: NewMatchRecord {
                chat_id: ChatId(1),
                sport: sport.into(),
                team1: team1.into(),
                team2: team2.into(),
                score1,
                score2,
                scorers_team1: scorers1.iter().map(|s| (*s).into()).collect(),
                scorers_team2: scorers2.iter().map(|s| (*s).into()).collect(),
                recorded_at: OffsetDateTime::UNIX_EPOCH,
            },
        }
    }

    fn roster(scorers_enabled: bool) -> Roster {
        Roster::from_teams(vec![
            Team {
                name: "Reds".into(),
                sport: "Soccer".into(),
                players: vec![],
                scorers_enabled,
            },
            Team {
                name: "Blues".into(),
                sport: "Soccer".into(),
                players: vec![],
                scorers_enabled: false,
            },
        ])
    }

    #[test]
    fn win_draw_loss_points_are_awarded_per_side() {
        let records = vec![
            record("Soccer", "Reds", "Blues", 2, 1, &[], &[]),
            record("Soccer", "Blues", "Greens", 0, 0, &[], &[]),
        ];

        let rows = standings(&records, Some("Soccer"));
        let by_name = |name: &str| rows.iter().find(|r| r.team == name).unwrap();

        assert_eq!(by_name("Reds").points, 3);
        assert_eq!(by_name("Reds").goal_difference, 1);
        assert_eq!(by_name("Blues").points, 1);
        assert_eq!(by_name("Blues").games_played, 2);
        assert_eq!(by_name("Greens").points, 1);
    }

    #[test]
    fn identical_records_tie_break_on_team_name() {
        // Two pairs with identical points, goal difference and goals for.
        let records = vec![
            record("Soccer", "Zebras", "Apes", 1, 1, &[], &[]),
            record("Soccer", "Moles", "Bats", 1, 1, &[], &[]),
        ];

        let rows = standings(&records, None);
        let names = rows.iter().map(|r| r.team.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Apes", "Bats", "Moles", "Zebras"]);
    }

    #[test]
    fn standings_filter_by_sport() {
        let records = vec![
            record("Soccer", "Reds", "Blues", 1, 0, &[], &[]),
            record("Hockey", "Sharks", "Bears", 5, 0, &[], &[]),
        ];

        let rows = standings(&records, Some("Hockey"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].team, "Sharks");
    }

    #[test]
    fn placeholder_scorers_contribute_nothing() {
        let records = vec![record("Soccer", "Reds", "Blues", 2, 0, &["-", "-"], &[])];
        assert_eq!(
            top_scorers(&records, &roster(true), "Soccer"),
            TopScorers::NoneRecorded
        );
    }

    #[test]
    fn disabled_sport_reports_disabled_not_empty() {
        assert_eq!(
            top_scorers(&[], &roster(false), "Soccer"),
            TopScorers::Disabled
        );
    }

    #[test]
    fn tally_ranks_by_count_then_name_and_caps_at_five() {
        let records = vec![
            record(
                "Soccer",
                "Reds",
                "Blues",
                5,
                2,
                &["A", "A", "B", "C", "D"],
                &["E", "F"],
            ),
            record("Soccer", "Reds", "Blues", 1, 0, &["B"], &[]),
        ];

        let TopScorers::Table(rows) = top_scorers(&records, &roster(true), "Soccer") else {
            panic!("expected a table");
        };

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].name, "A");
        assert_eq!(rows[0].goals, 2);
        assert_eq!(rows[1].name, "B");
        assert_eq!(rows[1].goals, 2);
        assert_eq!(rows[2].name, "C");
    }
}
