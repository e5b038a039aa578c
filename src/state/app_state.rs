use crate::app::MenuItem;
use crate::loader::LoadedSeason;
use crate::week::current_week;
use chrono::NaiveDate;
use standings_engine::{
    Metric, MetricSource, SeasonId, StandingsError, StandingsRow, StandingsTable, SurvivorState,
};
use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// Standings table columns
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Column {
    Rank,
    Team,
    Record,
    AllPlay,
    Score,
    Opponent,
    CumScore,
    CumScoreOpp,
    PerWeek,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Rank,
        Column::Team,
        Column::Record,
        Column::AllPlay,
        Column::Score,
        Column::Opponent,
        Column::CumScore,
        Column::CumScoreOpp,
        Column::PerWeek,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Rank => "Rank",
            Column::Team => "Team",
            Column::Record => "Record",
            Column::AllPlay => "All-play",
            Column::Score => "Score",
            Column::Opponent => "Opp",
            Column::CumScore => "PF",
            Column::CumScoreOpp => "PA",
            Column::PerWeek => "PF/wk",
        }
    }

    /// Numeric sort key; `None` for columns sorted by other means.
    fn metric(&self) -> Option<Metric> {
        match self {
            Column::Rank | Column::Team => None,
            Column::Record => Some(Metric::CumTotalWins),
            Column::AllPlay => Some(Metric::CumAllPlayWins),
            Column::Score => Some(Metric::Score),
            Column::Opponent => Some(Metric::ScoreOpp),
            Column::CumScore => Some(Metric::CumScore),
            Column::CumScoreOpp => Some(Metric::CumScoreOpp),
            Column::PerWeek => Some(Metric::CumScorePerWeek),
        }
    }

    /// Best first: rank and names ascend, everything else descends.
    pub fn default_ascending(&self) -> bool {
        matches!(self, Column::Rank | Column::Team)
    }

    fn next(&self) -> Column {
        let idx = Column::ALL.iter().position(|c| c == self).unwrap_or(0);
        Column::ALL[(idx + 1) % Column::ALL.len()]
    }
}

// ---------------------------------------------------------------------------
// Season + week selection
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct StandingsState {
    pub seasons: Vec<SeasonId>,
    pub season_index: usize,
    pub loaded: Option<LoadedSeason>,
    pub week: u32,
    pub sort_column: Column,
    pub sort_ascending: bool,
}

impl Default for StandingsState {
    fn default() -> Self {
        Self {
            seasons: Vec::new(),
            season_index: 0,
            loaded: None,
            week: 0,
            sort_column: Column::Rank,
            sort_ascending: true,
        }
    }
}

impl StandingsState {
    pub fn new(seasons: Vec<SeasonId>) -> Self {
        // open on the latest season
        let season_index = seasons.len().saturating_sub(1);
        Self { seasons, season_index, ..Self::default() }
    }

    pub fn season(&self) -> Option<SeasonId> {
        self.seasons.get(self.season_index).copied()
    }

    pub fn table(&self) -> Option<&StandingsTable> {
        self.loaded.as_ref().map(|l| &l.table)
    }

    /// Show a freshly loaded season at its current week.
    pub fn load(&mut self, loaded: LoadedSeason, first_week: Option<NaiveDate>, today: NaiveDate) {
        let last = loaded.table.last_ranked_week().unwrap_or(0);
        self.week = current_week(first_week, today, last);
        if let Some(idx) = self.seasons.iter().position(|&s| s == loaded.table.season_id) {
            self.season_index = idx;
        }
        self.loaded = Some(loaded);
    }

    /// Advance to the next configured season, wrapping. Returns it for loading.
    pub fn next_season(&mut self) -> Option<SeasonId> {
        if self.seasons.is_empty() {
            return None;
        }
        self.season_index = (self.season_index + 1) % self.seasons.len();
        self.loaded = None;
        self.week = 0;
        self.season()
    }

    pub fn next_week(&mut self) {
        if let Some(&w) = self.weeks().iter().find(|&&w| w > self.week) {
            self.week = w;
        }
    }

    pub fn prev_week(&mut self) {
        if let Some(&w) = self.weeks().iter().rev().find(|&&w| w < self.week) {
            self.week = w;
        }
    }

    fn weeks(&self) -> Vec<u32> {
        self.table().map(StandingsTable::weeks).unwrap_or_default()
    }

    pub fn cycle_sort(&mut self) {
        self.sort_column = self.sort_column.next();
        self.sort_ascending = self.sort_column.default_ascending();
    }

    pub fn reverse_sort(&mut self) {
        self.sort_ascending = !self.sort_ascending;
    }

    pub fn display_name(&self, team_id: i32) -> String {
        self.loaded
            .as_ref()
            .map(|l| l.league.display_name(team_id))
            .unwrap_or_else(|| format!("Team {team_id}"))
    }

    /// The selected week's rows ordered by the active sort column.
    pub fn sorted_rows(&self) -> Vec<&StandingsRow> {
        let Some(table) = self.table() else {
            return Vec::new();
        };
        let mut rows = table.week(self.week);
        let column = self.sort_column;
        rows.sort_by(|a, b| {
            let ord = match column.metric() {
                Some(metric) => a.metric(metric).total_cmp(&b.metric(metric)),
                None if column == Column::Team => {
                    self.display_name(a.week.team_id).cmp(&self.display_name(b.week.team_id))
                }
                None => compare_rank(a.standings, b.standings),
            };
            if self.sort_ascending { ord } else { ord.reverse() }
        });
        rows
    }

    /// Survivor state through the selected week. Playoff weeks show the
    /// regular-season result, and a finished contest shows its final state.
    pub fn survivor(&self) -> Option<Result<SurvivorState, StandingsError>> {
        let table = self.table()?;
        let regular: Vec<u32> =
            table.ranked_weeks().into_iter().filter(|&w| w <= self.week).collect();
        let mut target = regular.last().copied().unwrap_or(0);
        loop {
            match table.survivor(target) {
                Err(StandingsError::ContestEnded { week }) => {
                    target = regular.iter().rev().find(|&&w| w < week).copied().unwrap_or(0);
                }
                result => return Some(result),
            }
        }
    }
}

/// Ranked rows before unranked, then by rank.
fn compare_rank(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub standings: StandingsState,
}

impl AppState {
    pub fn new(seasons: Vec<SeasonId>) -> Self {
        Self { standings: StandingsState::new(seasons), ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::loader::compute;
    use espn_ffl_api::{LeagueSeason, LeagueSettings, TeamInfo};
    use standings_engine::{MatchupRecord, Points};
    use std::collections::BTreeMap;

    fn pts(v: i64) -> Points {
        Points::from_hundredths(v * 100)
    }

    /// Three teams over three regular weeks plus one playoff week.
    fn loaded() -> LoadedSeason {
        let week = |w: u32, scores: [i64; 4]| {
            vec![
                MatchupRecord::played(w, (1, pts(scores[0])), (2, pts(scores[1]))),
                MatchupRecord::played(w, (3, pts(scores[2])), (4, pts(scores[3]))),
            ]
        };
        let mut matchups = Vec::new();
        matchups.extend(week(1, [50, 60, 70, 80]));
        matchups.extend(week(2, [90, 100, 110, 40]));
        matchups.extend(week(3, [120, 30, 95, 100]));
        matchups.extend(week(4, [10, 20, 30, 40]));
        let league = LeagueSeason {
            league_id: 1,
            season_id: 2021,
            settings: LeagueSettings {
                season_id: 2021,
                matchup_period_count: 3,
                matchup_periods: (1..=4).map(|p| (p, vec![p])).collect::<BTreeMap<_, _>>(),
                ..Default::default()
            },
            teams: vec![TeamInfo {
                team_id: 1,
                team_name: "Zebras".into(),
                ..Default::default()
            }],
            matchups,
        };
        compute(&Config::default(), league).unwrap()
    }

    fn state() -> StandingsState {
        let mut state = StandingsState::new(vec![2020, 2021]);
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        state.load(loaded(), None, today);
        state
    }

    #[test]
    fn opens_on_last_ranked_week() {
        let state = state();
        assert_eq!(state.season(), Some(2021));
        assert_eq!(state.week, 3);
    }

    #[test]
    fn week_navigation_stays_in_bounds() {
        let mut state = state();
        state.next_week();
        assert_eq!(state.week, 4);
        state.next_week();
        assert_eq!(state.week, 4);
        for _ in 0..5 {
            state.prev_week();
        }
        assert_eq!(state.week, 1);
    }

    #[test]
    fn rank_sort_is_a_permutation_in_order() {
        let state = state();
        let ranks: Vec<Option<u32>> = state.sorted_rows().iter().map(|r| r.standings).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn score_sort_descends_then_reverses() {
        let mut state = state();
        state.sort_column = Column::Score;
        state.sort_ascending = Column::Score.default_ascending();
        let scores: Vec<i64> =
            state.sorted_rows().iter().map(|r| r.week.score.hundredths() / 100).collect();
        assert_eq!(scores, vec![120, 100, 95, 30]);

        state.reverse_sort();
        let scores: Vec<i64> =
            state.sorted_rows().iter().map(|r| r.week.score.hundredths() / 100).collect();
        assert_eq!(scores, vec![30, 95, 100, 120]);
    }

    #[test]
    fn cycling_sort_wraps_and_resets_direction() {
        let mut state = state();
        state.reverse_sort();
        state.cycle_sort();
        assert_eq!(state.sort_column, Column::Team);
        assert!(state.sort_ascending);
        for _ in 0..Column::ALL.len() - 1 {
            state.cycle_sort();
        }
        assert_eq!(state.sort_column, Column::Rank);
    }

    #[test]
    fn team_sort_uses_display_names() {
        let mut state = state();
        state.sort_column = Column::Team;
        let names: Vec<String> =
            state.sorted_rows().iter().map(|r| state.display_name(r.week.team_id)).collect();
        assert_eq!(names, vec!["Team 2", "Team 3", "Team 4", "Zebras"]);
    }

    #[test]
    fn survivor_in_playoffs_reports_regular_season_result() {
        let mut state = state();
        state.next_week();
        assert_eq!(state.week, 4);
        // w1 lowest 50 (1), w2 lowest alive 40 (4), w3 lowest alive 30 (2)
        let survivor = state.survivor().unwrap().unwrap();
        assert_eq!(survivor.eliminated(), &[1, 4, 2]);
        assert_eq!(survivor.alive().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn next_season_wraps_and_clears() {
        let mut state = state();
        assert_eq!(state.next_season(), Some(2020));
        assert!(state.loaded.is_none());
        assert_eq!(state.next_season(), Some(2021));
    }
}
