//! Read-only roster: which sports, teams and players exist, and whether a team
//! records who scored.

use std::{io::ErrorKind, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

/// One roster entry describing a registered team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Unique team name.
    pub name: String,
    /// Sport the team competes in.
    pub sport: String,
    /// Known players, in roster order. May be empty.
    pub players: Vec<String>,
    /// Whether goals by this team are attributed to individual scorers.
    pub scorers_enabled: bool,
}

/// The full set of teams known to the system, loaded once at startup.
///
/// Insertion order is preserved so sport and team keyboards render in the
/// order the roster file lists them.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    teams: IndexMap<String, Team>,
}

impl Roster {
    /// Load the roster from a JSON file, falling back to a built-in demo
    /// roster when the file is absent.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Vec<RawTeam>>(&contents) {
                Ok(raw) => {
                    let roster = Self::from_entries(raw);
                    info!(
                        path = %path.display(),
                        teams = roster.teams.len(),
                        "loaded roster"
                    );
                    roster
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse roster; falling back to built-in demo roster"
                    );
                    Self::from_entries(demo_entries())
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "roster file not found; using built-in demo roster"
                );
                Self::from_entries(demo_entries())
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read roster; falling back to built-in demo roster"
                );
                Self::from_entries(demo_entries())
            }
        }
    }

    /// Build a roster from raw entries, skipping malformed ones and duplicate
    /// names (first occurrence wins).
    pub fn from_entries(entries: Vec<RawTeam>) -> Self {
        let mut teams = IndexMap::new();

        for entry in entries {
            let (Some(name), Some(sport)) = (entry.name, entry.sport) else {
                warn!("skipping roster entry without a name or sport");
                continue;
            };
            if name.trim().is_empty() || sport.trim().is_empty() {
                warn!("skipping roster entry with a blank name or sport");
                continue;
            }
            if teams.contains_key(&name) {
                warn!(team = %name, "skipping duplicate roster entry");
                continue;
            }

            teams.insert(
                name.clone(),
                Team {
                    name,
                    sport,
                    players: entry.players,
                    scorers_enabled: entry.scorers_enabled,
                },
            );
        }

        Self { teams }
    }

    /// Build a roster directly from validated teams. Test helper.
    pub fn from_teams(teams: Vec<Team>) -> Self {
        Self {
            teams: teams
                .into_iter()
                .map(|team| (team.name.clone(), team))
                .collect(),
        }
    }

    /// Distinct sports in roster order.
    pub fn sports(&self) -> Vec<&str> {
        let mut sports = Vec::new();
        for team in self.teams.values() {
            if !sports.contains(&team.sport.as_str()) {
                sports.push(team.sport.as_str());
            }
        }
        sports
    }

    /// `true` when the sport is present in the roster.
    pub fn has_sport(&self, sport: &str) -> bool {
        self.teams.values().any(|team| team.sport == sport)
    }

    /// Teams registered for a sport, in roster order.
    pub fn teams_for_sport(&self, sport: &str) -> Vec<&Team> {
        self.teams
            .values()
            .filter(|team| team.sport == sport)
            .collect()
    }

    /// Look up a team by name.
    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.get(name)
    }

    /// Whether the named team attributes goals to scorers. Unknown teams
    /// report `false`.
    pub fn scorers_enabled(&self, name: &str) -> bool {
        self.team(name).map(|t| t.scorers_enabled).unwrap_or(false)
    }

    /// Whether any team of the sport attributes goals to scorers.
    pub fn scorers_enabled_for_sport(&self, sport: &str) -> bool {
        self.teams_for_sport(sport)
            .iter()
            .any(|team| team.scorers_enabled)
    }
}

/// Roster entry as it appears in the JSON file, before validation.
#[derive(Debug, Deserialize)]
pub struct RawTeam {
    /// Team name; entries without one are skipped.
    pub name: Option<String>,
    /// Sport identifier; entries without one are skipped.
    pub sport: Option<String>,
    /// Player names, defaults to empty.
    #[serde(default)]
    pub players: Vec<String>,
    /// Scorer attribution flag, defaults to off.
    #[serde(default)]
    pub scorers_enabled: bool,
}

/// Built-in roster shipped with the binary so the flow can be exercised
/// without any configuration.
fn demo_entries() -> Vec<RawTeam> {
    let entry = |name: &str, sport: &str, players: &[&str], scorers_enabled: bool| RawTeam {
        name: Some(name.into()),
        sport: Some(sport.into()),
        players: players.iter().map(|p| (*p).into()).collect(),
        scorers_enabled,
    };

    vec![
        entry("Reds", "Soccer", &["Anna", "Ben", "Carl"], true),
        entry("Blues", "Soccer", &["Dora", "Emil"], true),
        entry("Greens", "Soccer", &[], false),
        entry("Sharks", "Hockey", &["Finn", "Gus"], true),
        entry("Bears", "Hockey", &["Hugo"], true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_team_names_keep_the_first_occurrence() {
        let roster = Roster::from_entries(vec![
            RawTeam {
                name: Some("Reds".into()),
                sport: Some("Soccer".into()),
                players: vec!["A".into()],
                scorers_enabled: true,
            },
            RawTeam {
                name: Some("Reds".into()),
                sport: Some("Hockey".into()),
                players: vec![],
                scorers_enabled: false,
            },
        ]);

        let team = roster.team("Reds").unwrap();
        assert_eq!(team.sport, "Soccer");
        assert!(team.scorers_enabled);
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let roster = Roster::from_entries(vec![
            RawTeam {
                name: None,
                sport: Some("Soccer".into()),
                players: vec![],
                scorers_enabled: false,
            },
            RawTeam {
                name: Some("Blues".into()),
                sport: None,
                players: vec![],
                scorers_enabled: false,
            },
            RawTeam {
                name: Some("Greens".into()),
                sport: Some("Soccer".into()),
                players: vec![],
                scorers_enabled: false,
            },
        ]);

        assert!(roster.team("Blues").is_none());
        assert!(roster.team("Greens").is_some());
        assert_eq!(roster.sports(), vec!["Soccer"]);
    }

    #[test]
    fn sports_are_listed_once_in_roster_order() {
        let roster = Roster::load(Path::new("does-not-exist.json"));
        assert_eq!(roster.sports(), vec!["Soccer", "Hockey"]);
    }
}
