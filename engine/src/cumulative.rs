//! Running totals per (season, team), ordered by week.

use crate::all_play::{AllPlayFields, AllPlayRow};
use crate::outcome::OutcomeFields;
use crate::{Points, SeasonId, TeamId, TeamWeekRow};
use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CumulativeFields {
    pub cum_score: Points,
    pub cum_score_opp: Points,
    pub cum_wins: u32,
    pub cum_losses: u32,
    pub cum_ties: u32,
    pub cum_byes: u32,
    pub cum_total_wins: f64,
    pub cum_all_play_wins: f64,
    pub cum_all_play_losses: f64,
    pub cum_all_play_wins_int: u32,
    pub cum_all_play_losses_int: u32,
    pub cum_all_play_ties_int: u32,
    pub weeks_played: u32,
}

impl CumulativeFields {
    fn add_week(&mut self, week: &TeamWeekRow, outcome: &OutcomeFields, all_play: &AllPlayFields) {
        self.cum_score += week.score;
        self.cum_score_opp += week.opponent_score;
        self.cum_wins += u32::from(outcome.win_ind);
        self.cum_losses += u32::from(outcome.loss_ind);
        self.cum_ties += u32::from(outcome.tie_ind);
        self.cum_byes += u32::from(outcome.bye_ind);
        self.cum_total_wins += outcome.total_wins;
        self.cum_all_play_wins += all_play.all_play_wins;
        self.cum_all_play_losses += all_play.all_play_losses;
        self.cum_all_play_wins_int += all_play.all_play_wins_int;
        self.cum_all_play_losses_int += all_play.all_play_losses_int;
        self.cum_all_play_ties_int += all_play.all_play_ties_int;
        self.weeks_played += 1;
    }

    /// Head-to-head record as "W-L-T".
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.cum_wins, self.cum_losses, self.cum_ties)
    }

    pub fn all_play_record(&self) -> String {
        format!(
            "{}-{}-{}",
            self.cum_all_play_wins_int, self.cum_all_play_losses_int, self.cum_all_play_ties_int
        )
    }

    pub fn score_per_week(&self) -> f64 {
        self.per_week(self.cum_score.as_f64())
    }

    pub fn score_opp_per_week(&self) -> f64 {
        self.per_week(self.cum_score_opp.as_f64())
    }

    pub fn all_play_wins_per_week(&self) -> f64 {
        self.per_week(self.cum_all_play_wins)
    }

    fn per_week(&self, total: f64) -> f64 {
        if self.weeks_played == 0 {
            0.0
        } else {
            total / f64::from(self.weeks_played)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeRow {
    pub week: TeamWeekRow,
    pub outcome: OutcomeFields,
    pub all_play: AllPlayFields,
    pub cumulative: CumulativeFields,
}

/// Prefix-sum every per-week metric within each (season, team) group.
///
/// Output is ordered by (season, week, team).
pub fn accumulate(rows: &[AllPlayRow]) -> Vec<CumulativeRow> {
    let mut groups: BTreeMap<(SeasonId, TeamId), Vec<&AllPlayRow>> = BTreeMap::new();
    for r in rows {
        groups.entry((r.week.season_id, r.week.team_id)).or_default().push(r);
    }

    let mut out = Vec::with_capacity(rows.len());
    for ((season, team), mut group) in groups {
        group.sort_by_key(|r| r.week.week_number);

        let mut running = CumulativeFields::default();
        for r in group {
            running.add_week(&r.week, &r.outcome, &r.all_play);
            out.push(CumulativeRow {
                week: r.week.clone(),
                outcome: r.outcome,
                all_play: r.all_play,
                cumulative: running,
            });
        }
        debug!("season {season} team {team}: {} after {} weeks", running.record(), running.weeks_played);
    }

    out.sort_by_key(|r| (r.week.season_id, r.week.week_number, r.week.team_id));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ByePolicy, MatchupRecord, all_play, normalize, outcome};

    fn pts(v: i64) -> Points {
        Points::from_hundredths(v * 100)
    }

    fn build(season: SeasonId, records: &[MatchupRecord]) -> Vec<CumulativeRow> {
        let rows = normalize::normalize(season, records, 14).unwrap();
        let classified = outcome::classify(&rows, ByePolicy::CountAsWin);
        accumulate(&all_play::add_all_play(&classified))
    }

    fn team_rows(rows: &[CumulativeRow], team: TeamId) -> Vec<&CumulativeRow> {
        rows.iter().filter(|r| r.week.team_id == team).collect()
    }

    #[test]
    fn running_totals_follow_week_order() {
        let records = vec![
            MatchupRecord::played(2, (1, pts(80)), (2, pts(90))),
            MatchupRecord::played(1, (1, pts(100)), (2, pts(90))),
            MatchupRecord::played(3, (1, pts(70)), (2, pts(70))),
        ];
        let rows = build(2021, &records);
        let one = team_rows(&rows, 1);

        assert_eq!(one.len(), 3);
        assert_eq!(one[0].cumulative.cum_score, pts(100));
        assert_eq!(one[1].cumulative.cum_score, pts(180));
        assert_eq!(one[2].cumulative.cum_score, pts(250));
        assert_eq!(one[2].cumulative.cum_score_opp, pts(250));
        assert_eq!(one[2].cumulative.record(), "1-1-1");
        assert_eq!(one[2].cumulative.cum_total_wins, 1.5);
        assert_eq!(one[2].cumulative.weeks_played, 3);
    }

    #[test]
    fn output_is_ordered_by_week_then_team() {
        let records = vec![
            MatchupRecord::played(1, (3, pts(1)), (1, pts(2))),
            MatchupRecord::played(2, (1, pts(1)), (3, pts(2))),
        ];
        let rows = build(2021, &records);
        let keys: Vec<_> = rows.iter().map(|r| (r.week.week_number, r.week.team_id)).collect();
        assert_eq!(keys, vec![(1, 1), (1, 3), (2, 1), (2, 3)]);
    }

    #[test]
    fn seasons_never_share_a_group() {
        let mut rows = build(2020, &[MatchupRecord::played(1, (1, pts(100)), (2, pts(50)))]);
        rows.extend(build(2021, &[MatchupRecord::played(1, (1, pts(10)), (2, pts(50)))]));

        let later = rows
            .iter()
            .find(|r| r.week.season_id == 2021 && r.week.team_id == 1)
            .unwrap();
        assert_eq!(later.cumulative.cum_score, pts(10));
        assert_eq!(later.cumulative.cum_wins, 0);
        assert_eq!(later.cumulative.weeks_played, 1);
    }

    #[test]
    fn per_week_averages_and_all_play_record() {
        let records = vec![
            MatchupRecord::played(1, (1, pts(100)), (2, pts(90))),
            MatchupRecord::played(1, (3, pts(80)), (4, pts(70))),
            MatchupRecord::played(2, (1, pts(60)), (3, pts(90))),
            MatchupRecord::played(2, (2, pts(50)), (4, pts(40))),
        ];
        let rows = build(2021, &records);
        let last = team_rows(&rows, 1)[1];

        assert_eq!(last.cumulative.score_per_week(), 80.0);
        assert_eq!(last.cumulative.score_opp_per_week(), 90.0);
        // week 1: beat 3 others, week 2: beat teams 2 and 4
        assert_eq!(last.cumulative.all_play_record(), "5-1-0");
        assert_eq!(last.cumulative.all_play_wins_per_week(), 2.5);
    }
}
