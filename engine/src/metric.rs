//! Named, rankable metrics and the trait every stage row exposes them through.

use crate::all_play::AllPlayFields;
use crate::cumulative::{CumulativeFields, CumulativeRow};
use crate::outcome::OutcomeFields;
use crate::{StandingsError, TeamId, TeamWeekRow};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Score,
    ScoreOpp,
    WinInd,
    LossInd,
    TieInd,
    ByeInd,
    TotalWins,
    AllPlayWins,
    AllPlayLosses,
    AllPlayWinsInt,
    AllPlayLossesInt,
    AllPlayTiesInt,
    CumScore,
    CumScoreOpp,
    CumWins,
    CumLosses,
    CumTies,
    CumByes,
    CumTotalWins,
    CumAllPlayWins,
    CumAllPlayLosses,
    CumAllPlayWinsInt,
    CumAllPlayLossesInt,
    CumAllPlayTiesInt,
    CumScorePerWeek,
    CumScoreOppPerWeek,
    CumAllPlayWinsPerWeek,
}

impl Metric {
    pub const ALL: [Metric; 27] = [
        Metric::Score,
        Metric::ScoreOpp,
        Metric::WinInd,
        Metric::LossInd,
        Metric::TieInd,
        Metric::ByeInd,
        Metric::TotalWins,
        Metric::AllPlayWins,
        Metric::AllPlayLosses,
        Metric::AllPlayWinsInt,
        Metric::AllPlayLossesInt,
        Metric::AllPlayTiesInt,
        Metric::CumScore,
        Metric::CumScoreOpp,
        Metric::CumWins,
        Metric::CumLosses,
        Metric::CumTies,
        Metric::CumByes,
        Metric::CumTotalWins,
        Metric::CumAllPlayWins,
        Metric::CumAllPlayLosses,
        Metric::CumAllPlayWinsInt,
        Metric::CumAllPlayLossesInt,
        Metric::CumAllPlayTiesInt,
        Metric::CumScorePerWeek,
        Metric::CumScoreOppPerWeek,
        Metric::CumAllPlayWinsPerWeek,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Score => "score",
            Metric::ScoreOpp => "score_opp",
            Metric::WinInd => "win_ind",
            Metric::LossInd => "loss_ind",
            Metric::TieInd => "tie_ind",
            Metric::ByeInd => "bye_ind",
            Metric::TotalWins => "total_wins",
            Metric::AllPlayWins => "all_play_wins",
            Metric::AllPlayLosses => "all_play_losses",
            Metric::AllPlayWinsInt => "all_play_wins_int",
            Metric::AllPlayLossesInt => "all_play_losses_int",
            Metric::AllPlayTiesInt => "all_play_ties_int",
            Metric::CumScore => "cum_score",
            Metric::CumScoreOpp => "cum_score_opp",
            Metric::CumWins => "cum_wins",
            Metric::CumLosses => "cum_losses",
            Metric::CumTies => "cum_ties",
            Metric::CumByes => "cum_byes",
            Metric::CumTotalWins => "cum_total_wins",
            Metric::CumAllPlayWins => "cum_all_play_wins",
            Metric::CumAllPlayLosses => "cum_all_play_losses",
            Metric::CumAllPlayWinsInt => "cum_all_play_wins_int",
            Metric::CumAllPlayLossesInt => "cum_all_play_losses_int",
            Metric::CumAllPlayTiesInt => "cum_all_play_ties_int",
            Metric::CumScorePerWeek => "cum_score_per_week",
            Metric::CumScoreOppPerWeek => "cum_score_opp_per_week",
            Metric::CumAllPlayWinsPerWeek => "cum_all_play_wins_per_week",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = StandingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| StandingsError::UnknownMetric(s.to_string()))
    }
}

/// Anything carrying one team's figures for one week.
pub trait MetricSource {
    fn team_id(&self) -> TeamId;
    fn week_number(&self) -> u32;
    fn metric(&self, metric: Metric) -> f64;
}

impl<T: MetricSource> MetricSource for &T {
    fn team_id(&self) -> TeamId {
        (**self).team_id()
    }

    fn week_number(&self) -> u32 {
        (**self).week_number()
    }

    fn metric(&self, metric: Metric) -> f64 {
        (**self).metric(metric)
    }
}

/// Look a metric up across the field groups a stage row carries.
pub fn value(
    week: &TeamWeekRow,
    outcome: &OutcomeFields,
    all_play: &AllPlayFields,
    cum: &CumulativeFields,
    metric: Metric,
) -> f64 {
    match metric {
        Metric::Score => week.score.as_f64(),
        Metric::ScoreOpp => week.opponent_score.as_f64(),
        Metric::WinInd => f64::from(outcome.win_ind),
        Metric::LossInd => f64::from(outcome.loss_ind),
        Metric::TieInd => f64::from(outcome.tie_ind),
        Metric::ByeInd => f64::from(outcome.bye_ind),
        Metric::TotalWins => outcome.total_wins,
        Metric::AllPlayWins => all_play.all_play_wins,
        Metric::AllPlayLosses => all_play.all_play_losses,
        Metric::AllPlayWinsInt => f64::from(all_play.all_play_wins_int),
        Metric::AllPlayLossesInt => f64::from(all_play.all_play_losses_int),
        Metric::AllPlayTiesInt => f64::from(all_play.all_play_ties_int),
        Metric::CumScore => cum.cum_score.as_f64(),
        Metric::CumScoreOpp => cum.cum_score_opp.as_f64(),
        Metric::CumWins => f64::from(cum.cum_wins),
        Metric::CumLosses => f64::from(cum.cum_losses),
        Metric::CumTies => f64::from(cum.cum_ties),
        Metric::CumByes => f64::from(cum.cum_byes),
        Metric::CumTotalWins => cum.cum_total_wins,
        Metric::CumAllPlayWins => cum.cum_all_play_wins,
        Metric::CumAllPlayLosses => cum.cum_all_play_losses,
        Metric::CumAllPlayWinsInt => f64::from(cum.cum_all_play_wins_int),
        Metric::CumAllPlayLossesInt => f64::from(cum.cum_all_play_losses_int),
        Metric::CumAllPlayTiesInt => f64::from(cum.cum_all_play_ties_int),
        Metric::CumScorePerWeek => cum.score_per_week(),
        Metric::CumScoreOppPerWeek => cum.score_opp_per_week(),
        Metric::CumAllPlayWinsPerWeek => cum.all_play_wins_per_week(),
    }
}

impl MetricSource for CumulativeRow {
    fn team_id(&self) -> TeamId {
        self.week.team_id
    }

    fn week_number(&self) -> u32 {
        self.week.week_number
    }

    fn metric(&self, metric: Metric) -> f64 {
        value(&self.week, &self.outcome, &self.all_play, &self.cumulative, metric)
    }
}
