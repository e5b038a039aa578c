//! Tiered multi-metric ranking of one week.
//!
//! A [`RankingSchedule`] splits rank positions 1..N into contiguous tiers. Tiers
//! are filled in order, each sorting whatever teams are still unranked by its
//! own keys and taking as many as it has positions.

use crate::metric::{Metric, MetricSource};
use crate::{Result, StandingsError, TeamId};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Inclusive range of rank positions, written `"lower-upper"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankRange {
    pub lower: u32,
    pub upper: u32,
}

impl RankRange {
    pub fn new(lower: u32, upper: u32) -> Result<Self> {
        if lower == 0 || upper < lower {
            return Err(StandingsError::config(format!("invalid rank range {lower}-{upper}")));
        }
        Ok(Self { lower, upper })
    }

    pub fn size(&self) -> usize {
        (self.upper - self.lower + 1) as usize
    }
}

impl FromStr for RankRange {
    type Err = StandingsError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || StandingsError::config(format!("rank range `{s}` is not of the form lower-upper"));
        let (lower, upper) = s.split_once('-').ok_or_else(bad)?;
        let lower = lower.trim().parse().map_err(|_| bad())?;
        let upper = upper.trim().parse().map_err(|_| bad())?;
        RankRange::new(lower, upper)
    }
}

impl fmt::Display for RankRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub metric: Metric,
    pub ascending: bool,
}

impl SortKey {
    pub fn desc(metric: Metric) -> Self {
        Self { metric, ascending: false }
    }

    pub fn asc(metric: Metric) -> Self {
        Self { metric, ascending: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankTier {
    pub range: RankRange,
    pub keys: Vec<SortKey>,
}

impl RankTier {
    /// Pair each metric with its ascending flag. Both lists must be the same
    /// non-zero length.
    pub fn new(range: RankRange, metrics: Vec<Metric>, ascending: Vec<bool>) -> Result<Self> {
        if metrics.is_empty() {
            return Err(StandingsError::config(format!("tier {range} has no sort metrics")));
        }
        if metrics.len() != ascending.len() {
            return Err(StandingsError::config(format!(
                "tier {range} has {} metrics but {} ascending flags",
                metrics.len(),
                ascending.len()
            )));
        }
        let keys = metrics
            .into_iter()
            .zip(ascending)
            .map(|(metric, ascending)| SortKey { metric, ascending })
            .collect();
        Ok(Self { range, keys })
    }

    /// Build a tier from its textual form, e.g. `("1-4", ["cum_total_wins"], [false])`.
    pub fn parse(range: &str, metrics: &[String], ascending: &[bool]) -> Result<Self> {
        let range = range.parse()?;
        let metrics = metrics.iter().map(|m| m.parse()).collect::<Result<Vec<Metric>>>()?;
        RankTier::new(range, metrics, ascending.to_vec())
    }

    fn compare<T: MetricSource>(&self, a: &T, b: &T) -> Ordering {
        for key in &self.keys {
            let ord = a.metric(key.metric).total_cmp(&b.metric(key.metric));
            let ord = if key.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingSchedule {
    tiers: Vec<RankTier>,
}

impl RankingSchedule {
    /// Tiers must run contiguously from rank 1 with no gaps or overlaps.
    pub fn new(tiers: Vec<RankTier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(StandingsError::config("ranking schedule has no tiers"));
        }
        let mut next = 1;
        for tier in &tiers {
            if tier.range.lower != next {
                return Err(StandingsError::config(format!(
                    "tier {} should start at rank {next}",
                    tier.range
                )));
            }
            next = tier.range.upper + 1;
        }
        Ok(Self { tiers })
    }

    /// One tier covering all `teams` positions.
    pub fn uniform(teams: u32, keys: Vec<SortKey>) -> Result<Self> {
        let range = RankRange::new(1, teams)?;
        let (metrics, ascending) = keys.into_iter().map(|k| (k.metric, k.ascending)).unzip();
        RankingSchedule::new(vec![RankTier::new(range, metrics, ascending)?])
    }

    /// Most total wins, then most points.
    pub fn by_record(teams: u32) -> Result<Self> {
        RankingSchedule::uniform(
            teams,
            vec![SortKey::desc(Metric::CumTotalWins), SortKey::desc(Metric::CumScore)],
        )
    }

    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    /// Number of positions the tiers cover.
    pub fn team_count(&self) -> u32 {
        self.tiers.last().map_or(0, |t| t.range.upper)
    }

    pub fn validate_for(&self, teams: usize) -> Result<()> {
        if self.team_count() as usize != teams {
            return Err(StandingsError::config(format!(
                "ranking tiers cover {} positions but the week has {teams} teams",
                self.team_count()
            )));
        }
        Ok(())
    }

    /// Rank one week's rows, given in table order. Returns `(team, rank)` in rank order.
    pub fn rank_week<T: MetricSource>(&self, rows: &[&T]) -> Result<Vec<(TeamId, u32)>> {
        self.validate_for(rows.len())?;

        let mut pool: Vec<&T> = rows.to_vec();
        let mut ranks = Vec::with_capacity(rows.len());
        for tier in &self.tiers {
            pool.sort_by(|a, b| tier.compare(*a, *b));
            let take = tier.range.size().min(pool.len());
            for (offset, row) in pool.drain(..take).enumerate() {
                ranks.push((row.team_id(), tier.range.lower + offset as u32));
            }
        }

        check_permutation(&ranks, rows.len())?;
        Ok(ranks)
    }
}

fn check_permutation(ranks: &[(TeamId, u32)], teams: usize) -> Result<()> {
    let positions: HashSet<u32> = ranks.iter().map(|&(_, r)| r).collect();
    let ids: HashSet<TeamId> = ranks.iter().map(|&(t, _)| t).collect();
    let complete = ranks.len() == teams
        && positions.len() == teams
        && ids.len() == teams
        && (1..=teams as u32).all(|r| positions.contains(&r));
    if complete {
        Ok(())
    } else {
        Err(StandingsError::config(format!(
            "ranking produced {} distinct ranks for {teams} teams",
            positions.len()
        )))
    }
}

/// Rank every team with a row in `week`.
pub fn standings_for_week<T: MetricSource>(
    rows: &[T],
    week: u32,
    schedule: &RankingSchedule,
) -> Result<Vec<(TeamId, u32)>> {
    let week_rows: Vec<&T> = rows.iter().filter(|r| r.week_number() == week).collect();
    if week_rows.is_empty() {
        return Err(StandingsError::NoDataForWeek { week });
    }
    let ranks = schedule.rank_week(&week_rows)?;
    debug!("ranked week {week}: {} teams across {} tiers", ranks.len(), schedule.tiers().len());
    Ok(ranks)
}
