//! All-play records: each team's result had it played every other score that week.

use crate::outcome::{ClassifiedRow, OutcomeFields};
use crate::{Points, SeasonId, TeamWeekRow};
use log::debug;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AllPlayFields {
    /// Strictly lower scores beaten, plus `1/count` when sharing a score with others.
    pub all_play_wins: f64,
    pub all_play_losses: f64,
    pub all_play_wins_int: u32,
    pub all_play_losses_int: u32,
    pub all_play_ties_int: u32,
}

impl AllPlayFields {
    /// Figures for a score held by `count` of the week's `teams`, with `lower`
    /// rows scoring strictly less.
    pub fn from_counts(lower: u32, count: u32, teams: u32) -> Self {
        let opponents = teams - 1;
        let tie_share = if count > 1 { 1.0 / f64::from(count) } else { 0.0 };
        let all_play_wins = f64::from(lower) + tie_share;
        let all_play_ties_int = count - 1;

        Self {
            all_play_wins,
            all_play_losses: f64::from(opponents) - all_play_wins,
            all_play_wins_int: lower,
            all_play_losses_int: opponents - lower - all_play_ties_int,
            all_play_ties_int,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllPlayRow {
    pub week: TeamWeekRow,
    pub outcome: OutcomeFields,
    pub all_play: AllPlayFields,
}

/// Attach all-play figures to every row, computed independently per week.
pub fn add_all_play(rows: &[ClassifiedRow]) -> Vec<AllPlayRow> {
    // (season, week) -> score -> number of rows holding it, ascending by score
    let mut score_counts: BTreeMap<(SeasonId, u32), BTreeMap<Points, u32>> = BTreeMap::new();
    for r in rows {
        *score_counts
            .entry((r.week.season_id, r.week.week_number))
            .or_default()
            .entry(r.week.score)
            .or_default() += 1;
    }

    let mut lookup: HashMap<(SeasonId, u32, Points), AllPlayFields> = HashMap::new();
    for ((season, week), counts) in &score_counts {
        let teams: u32 = counts.values().sum();
        let mut lower = 0;
        for (&score, &count) in counts {
            lookup.insert((*season, *week, score), AllPlayFields::from_counts(lower, count, teams));
            lower += count;
        }
        debug!("all-play week {week}: {teams} teams, {} distinct scores", counts.len());
    }

    rows.iter()
        .map(|r| AllPlayRow {
            week: r.week.clone(),
            outcome: r.outcome,
            all_play: lookup[&(r.week.season_id, r.week.week_number, r.week.score)],
        })
        .collect()
}
