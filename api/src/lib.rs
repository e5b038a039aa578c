pub mod client;
pub mod espn;

use serde::{Deserialize, Serialize};
use standings_engine::{MatchupRecord, SeasonId, TeamId};
use std::collections::BTreeMap;

pub type LeagueId = i64;

// ---------------------------------------------------------------------------
// Domain types, independent of the ESPN wire format
// ---------------------------------------------------------------------------

/// Everything the loader needs for one league season.
#[derive(Debug, Clone, Default)]
pub struct LeagueSeason {
    pub league_id: LeagueId,
    pub season_id: SeasonId,
    pub settings: LeagueSettings,
    pub teams: Vec<TeamInfo>,
    pub matchups: Vec<MatchupRecord>,
}

impl LeagueSeason {
    pub fn team(&self, team_id: TeamId) -> Option<&TeamInfo> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    /// Manager name for display, falling back to the team name, then the id.
    pub fn display_name(&self, team_id: TeamId) -> String {
        self.team(team_id)
            .map(TeamInfo::display_name)
            .unwrap_or_else(|| format!("Team {team_id}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettings {
    pub season_id: SeasonId,
    pub playoff_seeding_rule: String,
    pub playoff_seeding_rule_by: i64,
    pub playoff_team_count: u32,
    pub first_scoring_period: u32,
    pub final_scoring_period: u32,
    pub matchup_period_count: u32,
    pub scoring_type: String,
    pub matchup_tie_rule: String,
    pub playoff_matchup_tie_rule: String,
    pub home_team_bonus: f64,
    pub divisions: Vec<Division>,
    /// Matchup period → the scoring periods (weeks) it spans.
    pub matchup_periods: BTreeMap<u32, Vec<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPeriod {
    pub scoring_period: u32,
    pub matchup_period: u32,
    pub regular_season: bool,
}

impl LeagueSettings {
    /// One row per scoring period, ascending. Matchup periods past
    /// `matchup_period_count` are playoffs.
    pub fn scoring_period_lookup(&self) -> Vec<ScoringPeriod> {
        let mut lookup: Vec<ScoringPeriod> = self
            .matchup_periods
            .iter()
            .flat_map(|(&matchup_period, scoring)| {
                scoring.iter().map(move |&scoring_period| ScoringPeriod {
                    scoring_period,
                    matchup_period,
                    regular_season: matchup_period <= self.matchup_period_count,
                })
            })
            .collect();
        lookup.sort_by_key(|p| p.scoring_period);
        lookup
    }

    /// First scoring period that belongs to a playoff matchup period.
    pub fn playoff_week_start(&self) -> Option<u32> {
        self.scoring_period_lookup()
            .into_iter()
            .find(|p| !p.regular_season)
            .map(|p| p.scoring_period)
    }

    /// The week a matchup period is reported under: its first scoring period.
    pub fn week_for_matchup_period(&self, matchup_period: u32) -> Option<u32> {
        self.matchup_periods
            .get(&matchup_period)
            .and_then(|weeks| weeks.iter().min().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub division_id: u32,
    pub name: String,
    pub size: u32,
}

/// A team joined with its first owner's member record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub team_id: TeamId,
    pub team_name: String,
    pub manager_id: Option<String>,
    pub manager_name: Option<String>,
    pub espn_name: Option<String>,
}

impl TeamInfo {
    pub fn display_name(&self) -> String {
        self.manager_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.team_name.clone())
    }
}
