//! End-to-end computation of one season's standings table.

use crate::all_play::{self, AllPlayFields};
use crate::cumulative::{self, CumulativeFields, CumulativeRow};
use crate::metric::{self, Metric, MetricSource};
use crate::normalize::normalize;
use crate::outcome::{self, OutcomeFields};
use crate::ranking::{RankingSchedule, standings_for_week};
use crate::survivor::{SurvivorState, run_survivor};
use crate::{
    ByePolicy, DEFAULT_PLAYOFF_WEEK_START, MatchupRecord, Result, SeasonId, StandingsError, TeamId,
    TeamWeekRow,
};
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};

/// A fully computed team-week row. `standings` is `None` for playoff weeks.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsRow {
    pub week: TeamWeekRow,
    pub outcome: OutcomeFields,
    pub all_play: AllPlayFields,
    pub cumulative: CumulativeFields,
    pub standings: Option<u32>,
}

impl StandingsRow {
    pub fn record(&self) -> String {
        self.cumulative.record()
    }

    pub fn all_play_record(&self) -> String {
        self.cumulative.all_play_record()
    }
}

impl MetricSource for StandingsRow {
    fn team_id(&self) -> TeamId {
        self.week.team_id
    }

    fn week_number(&self) -> u32 {
        self.week.week_number
    }

    fn metric(&self, metric: Metric) -> f64 {
        metric::value(&self.week, &self.outcome, &self.all_play, &self.cumulative, metric)
    }
}

/// Rank every regular-season week. Without a schedule each week is ranked by record.
pub fn rank_history(
    rows: &[CumulativeRow],
    schedule: Option<&RankingSchedule>,
) -> Result<Vec<StandingsRow>> {
    let regular_weeks: BTreeSet<u32> = rows
        .iter()
        .filter(|r| r.week.week_type.is_regular())
        .map(|r| r.week.week_number)
        .collect();

    let mut ranks: HashMap<(u32, TeamId), u32> = HashMap::new();
    for &week in &regular_weeks {
        let teams = rows.iter().filter(|r| r.week.week_number == week).count() as u32;
        let week_ranks = match schedule {
            Some(schedule) => standings_for_week(rows, week, schedule)?,
            None => standings_for_week(rows, week, &RankingSchedule::by_record(teams)?)?,
        };
        ranks.extend(week_ranks.into_iter().map(|(team, rank)| ((week, team), rank)));
    }

    Ok(rows
        .iter()
        .map(|r| StandingsRow {
            week: r.week.clone(),
            outcome: r.outcome,
            all_play: r.all_play,
            cumulative: r.cumulative,
            standings: ranks.get(&(r.week.week_number, r.week.team_id)).copied(),
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct StandingsPipeline {
    pub playoff_week_start: u32,
    pub bye_policy: ByePolicy,
    pub schedule: Option<RankingSchedule>,
}

impl Default for StandingsPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYOFF_WEEK_START)
    }
}

impl StandingsPipeline {
    pub fn new(playoff_week_start: u32) -> Self {
        Self {
            playoff_week_start,
            bye_policy: ByePolicy::default(),
            schedule: None,
        }
    }

    pub fn with_bye_policy(mut self, bye_policy: ByePolicy) -> Self {
        self.bye_policy = bye_policy;
        self
    }

    pub fn with_schedule(mut self, schedule: RankingSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn run(&self, season_id: SeasonId, records: &[MatchupRecord]) -> Result<StandingsTable> {
        if records.is_empty() {
            return Err(StandingsError::NoData { season: season_id });
        }

        let rows = normalize(season_id, records, self.playoff_week_start)?;
        let classified = outcome::classify(&rows, self.bye_policy);
        let with_all_play = all_play::add_all_play(&classified);
        let cumulative = cumulative::accumulate(&with_all_play);
        debug!("season {season_id}: {} cumulative rows", cumulative.len());

        let rows = rank_history(&cumulative, self.schedule.as_ref())?;
        let table = StandingsTable { season_id, rows };
        info!(
            "computed standings for season {season_id}: {} weeks, {} ranked",
            table.weeks().len(),
            table.ranked_weeks().len()
        );
        Ok(table)
    }
}

/// One season's long team × week table, ordered by (week, team).
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsTable {
    pub season_id: SeasonId,
    pub rows: Vec<StandingsRow>,
}

impl StandingsTable {
    pub fn weeks(&self) -> Vec<u32> {
        let weeks: BTreeSet<u32> = self.rows.iter().map(|r| r.week.week_number).collect();
        weeks.into_iter().collect()
    }

    pub fn ranked_weeks(&self) -> Vec<u32> {
        let weeks: BTreeSet<u32> = self
            .rows
            .iter()
            .filter(|r| r.standings.is_some())
            .map(|r| r.week.week_number)
            .collect();
        weeks.into_iter().collect()
    }

    pub fn last_ranked_week(&self) -> Option<u32> {
        self.ranked_weeks().last().copied()
    }

    pub fn team_ids(&self) -> Vec<TeamId> {
        let teams: BTreeSet<TeamId> = self.rows.iter().map(|r| r.week.team_id).collect();
        teams.into_iter().collect()
    }

    /// A week's rows in rank order; unranked weeks come back in team order.
    pub fn week(&self, week: u32) -> Vec<&StandingsRow> {
        let mut rows: Vec<&StandingsRow> =
            self.rows.iter().filter(|r| r.week.week_number == week).collect();
        rows.sort_by_key(|r| (r.standings.unwrap_or(u32::MAX), r.week.team_id));
        rows
    }

    /// Survivor state through `target_week`, over regular-season weeks only.
    pub fn survivor(&self, target_week: u32) -> Result<SurvivorState> {
        let regular: Vec<&StandingsRow> =
            self.rows.iter().filter(|r| r.week.week_type.is_regular()).collect();
        run_survivor(&regular, target_week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Points, RankRange, RankTier, WeekType};

    fn pts(v: i64) -> Points {
        Points::from_hundredths(v * 100)
    }

    fn two_team_season(weeks: u32) -> Vec<MatchupRecord> {
        (1..=weeks)
            .map(|w| MatchupRecord::played(w, (1, pts(100 + i64::from(w))), (2, pts(100))))
            .collect()
    }

    #[test]
    fn empty_input_is_no_data() {
        let err = StandingsPipeline::default().run(2021, &[]).unwrap_err();
        assert_eq!(err, StandingsError::NoData { season: 2021 });
    }

    #[test]
    fn playoff_weeks_carry_no_rank() {
        let table = StandingsPipeline::new(3).run(2021, &two_team_season(4)).unwrap();

        assert_eq!(table.weeks(), vec![1, 2, 3, 4]);
        assert_eq!(table.ranked_weeks(), vec![1, 2]);
        assert_eq!(table.last_ranked_week(), Some(2));
        for r in &table.rows {
            assert_eq!(r.standings.is_some(), r.week.week_type == WeekType::Regular);
        }
    }

    #[test]
    fn week_view_is_in_rank_order() {
        let table = StandingsPipeline::default().run(2021, &two_team_season(2)).unwrap();
        let week: Vec<_> = table.week(2).iter().map(|r| (r.week.team_id, r.standings)).collect();
        assert_eq!(week, vec![(1, Some(1)), (2, Some(2))]);
        assert_eq!(table.week(2)[0].record(), "2-0-0");
    }

    #[test]
    fn configured_schedule_is_applied() {
        let tier = RankTier::new(
            RankRange::new(1, 2).unwrap(),
            vec![Metric::CumScore],
            vec![true],
        )
        .unwrap();
        let pipeline =
            StandingsPipeline::default().with_schedule(RankingSchedule::new(vec![tier]).unwrap());
        let table = pipeline.run(2021, &two_team_season(1)).unwrap();
        assert_eq!(table.week(1)[0].week.team_id, 2);
    }

    #[test]
    fn schedule_for_the_wrong_league_size_fails_fast() {
        let pipeline = StandingsPipeline::default().with_schedule(RankingSchedule::by_record(10).unwrap());
        let err = pipeline.run(2021, &two_team_season(1)).unwrap_err();
        assert!(matches!(err, StandingsError::Configuration(_)));
    }

    #[test]
    fn survivor_skips_playoff_weeks() {
        let records = vec![
            MatchupRecord::played(1, (1, pts(50)), (2, pts(60))),
            MatchupRecord::played(1, (3, pts(70)), (4, pts(80))),
            MatchupRecord::played(2, (1, pts(90)), (2, pts(10))),
        ];
        let table = StandingsPipeline::new(2).run(2021, &records).unwrap();
        assert!(matches!(
            table.survivor(2),
            Err(StandingsError::WeekOutOfRange { week: 2, last_week: 1 })
        ));
        assert_eq!(table.survivor(1).unwrap().latest_loser(), Some(1));
    }
}
