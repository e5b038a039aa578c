//! Survivor contest: the lowest scorer still alive is knocked out each week.

use crate::metric::{Metric, MetricSource};
use crate::{Result, StandingsError, TeamId};
use log::debug;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurvivorState {
    alive: BTreeSet<TeamId>,
    eliminated: Vec<TeamId>,
    weeks_processed: u32,
}

impl SurvivorState {
    pub fn new(teams: impl IntoIterator<Item = TeamId>) -> Self {
        Self {
            alive: teams.into_iter().collect(),
            eliminated: Vec::new(),
            weeks_processed: 0,
        }
    }

    /// Still-alive teams, ascending by id.
    pub fn alive(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.alive.iter().copied()
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Eliminated teams in the order they went out, one per processed week.
    pub fn eliminated(&self) -> &[TeamId] {
        &self.eliminated
    }

    pub fn latest_loser(&self) -> Option<TeamId> {
        self.eliminated.last().copied()
    }

    pub fn weeks_processed(&self) -> u32 {
        self.weeks_processed
    }

    /// Eliminate the alive team with the lowest score this week, breaking ties
    /// on lowest cumulative score, then on table order.
    pub fn advance<T: MetricSource>(&mut self, week: u32, week_rows: &[&T]) -> Result<TeamId> {
        if self.alive.len() <= 1 {
            return Err(StandingsError::ContestEnded { week });
        }

        let mut candidates: Vec<&T> = week_rows
            .iter()
            .copied()
            .filter(|r| self.alive.contains(&r.team_id()))
            .collect();
        candidates.sort_by(|a, b| {
            a.metric(Metric::Score)
                .total_cmp(&b.metric(Metric::Score))
                .then_with(|| a.metric(Metric::CumScore).total_cmp(&b.metric(Metric::CumScore)))
        });

        let loser = candidates
            .first()
            .map(|r| r.team_id())
            .ok_or(StandingsError::NoDataForWeek { week })?;

        self.alive.remove(&loser);
        self.eliminated.push(loser);
        self.weeks_processed = week;
        debug!("survivor week {week}: team {loser} out, {} left", self.alive.len());
        Ok(loser)
    }
}

/// Replay the contest over every week present in `rows` up to `target_week`.
///
/// Every team with a row anywhere in `rows` starts alive. `target_week == 0`
/// returns that initial state.
pub fn run_survivor<T: MetricSource>(rows: &[T], target_week: u32) -> Result<SurvivorState> {
    let mut state = SurvivorState::new(rows.iter().map(|r| r.team_id()));
    if target_week == 0 {
        return Ok(state);
    }

    let last_week = rows.iter().map(|r| r.week_number()).max().unwrap_or(0);
    if target_week > last_week {
        return Err(StandingsError::WeekOutOfRange { week: target_week, last_week });
    }

    // multi-week matchup periods leave gaps in the week numbers
    let weeks: BTreeSet<u32> =
        rows.iter().map(|r| r.week_number()).filter(|&w| w <= target_week).collect();
    for week in weeks {
        let week_rows: Vec<&T> = rows.iter().filter(|r| r.week_number() == week).collect();
        state.advance(week, &week_rows)?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        team: TeamId,
        week: u32,
        score: f64,
        cum_score: f64,
    }

    impl MetricSource for Row {
        fn team_id(&self) -> TeamId {
            self.team
        }

        fn week_number(&self) -> u32 {
            self.week
        }

        fn metric(&self, metric: Metric) -> f64 {
            match metric {
                Metric::Score => self.score,
                Metric::CumScore => self.cum_score,
                _ => 0.0,
            }
        }
    }

    const A: TeamId = 1;
    const B: TeamId = 2;
    const C: TeamId = 3;

    /// Week 1 {A:50, B:60, C:70}, week 2 {A:90, B:80, C:65}.
    fn season() -> Vec<Row> {
        let mut rows = Vec::new();
        let mut cum = [0.0; 4];
        for (week, scores) in [(1, [50.0, 60.0, 70.0]), (2, [90.0, 80.0, 65.0])] {
            for (team, score) in [A, B, C].into_iter().zip(scores) {
                cum[team as usize] += score;
                rows.push(Row { team, week, score, cum_score: cum[team as usize] });
            }
        }
        rows
    }

    #[test]
    fn lowest_living_score_goes_out_each_week() {
        let state = run_survivor(&season(), 2).unwrap();
        assert_eq!(state.alive().collect::<Vec<_>>(), vec![B]);
        assert_eq!(state.eliminated(), &[A, C]);
        assert_eq!(state.latest_loser(), Some(C));
        assert_eq!(state.weeks_processed(), 2);
    }

    #[test]
    fn eliminated_team_cannot_lose_again() {
        // A posts the low score in week 2 too but is ignored
        let mut rows = season();
        rows.iter_mut().filter(|r| r.week == 2 && r.team == A).for_each(|r| r.score = 1.0);
        let state = run_survivor(&rows, 2).unwrap();
        assert_eq!(state.eliminated(), &[A, C]);
    }

    #[test]
    fn week_zero_is_everyone_alive() {
        let state = run_survivor(&season(), 0).unwrap();
        assert_eq!(state.alive_count(), 3);
        assert!(state.eliminated().is_empty());
        assert_eq!(state.latest_loser(), None);
    }

    #[test]
    fn cumulative_score_breaks_a_tie() {
        let rows = vec![
            Row { team: A, week: 1, score: 50.0, cum_score: 150.0 },
            Row { team: B, week: 1, score: 50.0, cum_score: 120.0 },
            Row { team: C, week: 1, score: 70.0, cum_score: 170.0 },
        ];
        let state = run_survivor(&rows, 1).unwrap();
        assert_eq!(state.latest_loser(), Some(B));
    }

    #[test]
    fn target_past_the_data_is_out_of_range() {
        let err = run_survivor(&season(), 3).unwrap_err();
        assert_eq!(err, StandingsError::WeekOutOfRange { week: 3, last_week: 2 });
    }

    #[test]
    fn contest_ends_with_one_team_left() {
        let mut rows = season();
        rows.extend([A, B, C].map(|team| Row { team, week: 3, score: 10.0, cum_score: 0.0 }));
        let err = run_survivor(&rows, 3).unwrap_err();
        assert_eq!(err, StandingsError::ContestEnded { week: 3 });
    }

    #[test]
    fn missing_week_numbers_are_skipped() {
        let rows: Vec<Row> = season()
            .into_iter()
            .map(|r| Row { week: if r.week == 2 { 3 } else { r.week }, ..r })
            .collect();
        let state = run_survivor(&rows, 3).unwrap();
        assert_eq!(state.eliminated(), &[A, C]);
        assert_eq!(state.weeks_processed(), 3);
    }

    #[test]
    fn week_without_living_rows_is_reported() {
        let mut rows = season();
        rows.push(Row { team: A, week: 3, score: 10.0, cum_score: 0.0 });
        rows.push(Row { team: 4, week: 1, score: 100.0, cum_score: 100.0 });
        // 4 teams: A out week 1, C out week 2, only eliminated A plays week 3
        let err = run_survivor(&rows, 3).unwrap_err();
        assert_eq!(err, StandingsError::NoDataForWeek { week: 3 });
    }
}
