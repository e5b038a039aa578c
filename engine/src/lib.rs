pub mod all_play;
pub mod cumulative;
pub mod error;
pub mod metric;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod ranking;
pub mod survivor;

pub use error::{Result, StandingsError};
pub use metric::{Metric, MetricSource};
pub use pipeline::{StandingsPipeline, StandingsRow, StandingsTable};
pub use ranking::{RankRange, RankTier, RankingSchedule, SortKey};
pub use survivor::SurvivorState;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

pub type TeamId = i32;
pub type SeasonId = u16;

/// Opponent id used for the single row a team gets on a bye week.
pub const BYE_OPPONENT: TeamId = -1;

/// Conventional first playoff week when neither config nor league settings say otherwise.
pub const DEFAULT_PLAYOFF_WEEK_START: u32 = 14;

// ---------------------------------------------------------------------------
// Points: fixed-precision score, stored as hundredths
// ---------------------------------------------------------------------------

/// A fantasy score with two decimal places of precision.
///
/// Equality and ordering are exact, which the tie handling in the outcome
/// and all-play stages depends on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Points(i64);

impl Points {
    pub const ZERO: Points = Points(0);

    pub fn from_hundredths(hundredths: i64) -> Self {
        Points(hundredths)
    }

    /// Round an upstream float (e.g. ESPN `totalPoints`) to the nearest hundredth.
    pub fn from_f64(value: f64) -> Self {
        Points((value * 100.0).round() as i64)
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points(self.0 + rhs.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        self.0 += rhs.0;
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Points>>(iter: I) -> Points {
        iter.fold(Points::ZERO, Add::add)
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

// ---------------------------------------------------------------------------
// Raw input: one scheduled matchup as reported upstream
// ---------------------------------------------------------------------------

/// One home/away pairing for a week. A side with neither team nor score is a bye.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchupRecord {
    pub week_number: u32,
    pub matchup_period: u32,
    pub team_id_home: Option<TeamId>,
    pub score_home: Option<Points>,
    pub team_id_away: Option<TeamId>,
    pub score_away: Option<Points>,
}

impl MatchupRecord {
    pub fn played(week_number: u32, home: (TeamId, Points), away: (TeamId, Points)) -> Self {
        Self {
            week_number,
            matchup_period: week_number,
            team_id_home: Some(home.0),
            score_home: Some(home.1),
            team_id_away: Some(away.0),
            score_away: Some(away.1),
        }
    }

    pub fn bye(week_number: u32, team_id: TeamId, score: Points) -> Self {
        Self {
            week_number,
            matchup_period: week_number,
            team_id_home: Some(team_id),
            score_home: Some(score),
            team_id_away: None,
            score_away: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Team-week table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeOrAway {
    Home,
    Away,
}

impl HomeOrAway {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeOrAway::Home => "home",
            HomeOrAway::Away => "away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekType {
    Regular,
    Playoffs,
}

impl WeekType {
    /// Weeks strictly before `playoff_week_start` are regular season.
    pub fn for_week(week_number: u32, playoff_week_start: u32) -> Self {
        if week_number < playoff_week_start {
            WeekType::Regular
        } else {
            WeekType::Playoffs
        }
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, WeekType::Regular)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekType::Regular => "regular",
            WeekType::Playoffs => "playoffs",
        }
    }
}

/// One team's view of one week.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamWeekRow {
    pub season_id: SeasonId,
    pub week_number: u32,
    pub matchup_period: u32,
    pub team_id: TeamId,
    pub opponent_id: TeamId,
    pub score: Points,
    pub opponent_score: Points,
    pub home_or_away: HomeOrAway,
    pub week_type: WeekType,
}

impl TeamWeekRow {
    pub fn is_bye(&self) -> bool {
        self.opponent_id == BYE_OPPONENT
    }
}

/// How a week without an opponent counts toward a team's record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByePolicy {
    /// Classify against a zero-score ghost opponent, so any positive score is a win.
    #[default]
    CountAsWin,
    /// Record the bye separately and leave win/loss/tie at zero.
    Exclude,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_round_upstream_floats_to_hundredths() {
        assert_eq!(Points::from_f64(112.34).hundredths(), 11234);
        assert_eq!(Points::from_f64(99.999).hundredths(), 10000);
        assert_eq!(Points::from_f64(0.1 + 0.2), Points::from_hundredths(30));
    }

    #[test]
    fn points_display_keeps_two_decimals() {
        assert_eq!(Points::from_hundredths(10105).to_string(), "101.05");
        assert_eq!(Points::from_hundredths(-250).to_string(), "-2.50");
        assert_eq!(Points::ZERO.to_string(), "0.00");
    }

    #[test]
    fn week_type_boundary_is_exclusive() {
        assert_eq!(WeekType::for_week(13, 14), WeekType::Regular);
        assert_eq!(WeekType::for_week(14, 14), WeekType::Playoffs);
    }
}
