//! Matchup records → symmetric team-week table.

use crate::{
    BYE_OPPONENT, HomeOrAway, MatchupRecord, Points, Result, SeasonId, StandingsError, TeamId,
    TeamWeekRow, WeekType,
};
use log::debug;
use std::collections::HashSet;

/// Expand every matchup into one row per participating team.
///
/// A played matchup yields a home row and an away row that mirror each other.
/// A bye yields a single row against [`BYE_OPPONENT`] with an opponent score of
/// zero. Output is ordered by (week, team).
pub fn normalize(
    season_id: SeasonId,
    records: &[MatchupRecord],
    playoff_week_start: u32,
) -> Result<Vec<TeamWeekRow>> {
    let mut rows = Vec::with_capacity(records.len() * 2);
    let mut seen: HashSet<(u32, TeamId)> = HashSet::new();

    for record in records {
        let week = record.week_number;
        let home = side(week, "home", record.team_id_home, record.score_home)?;
        let away = side(week, "away", record.team_id_away, record.score_away)?;
        let week_type = WeekType::for_week(week, playoff_week_start);

        let row = |team: (TeamId, Points), opponent: Option<(TeamId, Points)>, home_or_away| {
            let (opponent_id, opponent_score) = opponent.unwrap_or((BYE_OPPONENT, Points::ZERO));
            TeamWeekRow {
                season_id,
                week_number: week,
                matchup_period: record.matchup_period,
                team_id: team.0,
                opponent_id,
                score: team.1,
                opponent_score,
                home_or_away,
                week_type,
            }
        };

        let emitted = match (home, away) {
            (Some(h), Some(a)) => {
                if h.0 == a.0 {
                    return Err(StandingsError::malformed(
                        week,
                        format!("team {} is listed on both sides", h.0),
                    ));
                }
                vec![row(h, Some(a), HomeOrAway::Home), row(a, Some(h), HomeOrAway::Away)]
            }
            (Some(h), None) => vec![row(h, None, HomeOrAway::Home)],
            (None, Some(a)) => vec![row(a, None, HomeOrAway::Away)],
            (None, None) => {
                return Err(StandingsError::malformed(week, "matchup has neither a home nor an away team"));
            }
        };

        for r in emitted {
            if !seen.insert((r.week_number, r.team_id)) {
                return Err(StandingsError::malformed(
                    week,
                    format!("team {} appears in more than one matchup", r.team_id),
                ));
            }
            rows.push(r);
        }
    }

    rows.sort_by_key(|r| (r.week_number, r.team_id));
    debug!(
        "normalized {} matchups into {} team-week rows for season {season_id}",
        records.len(),
        rows.len()
    );
    Ok(rows)
}

fn side(
    week: u32,
    label: &str,
    team: Option<TeamId>,
    score: Option<Points>,
) -> Result<Option<(TeamId, Points)>> {
    match (team, score) {
        (Some(team), Some(score)) => Ok(Some((team, score))),
        (None, None) => Ok(None),
        (Some(team), None) => Err(StandingsError::malformed(
            week,
            format!("{label} team {team} has no score"),
        )),
        (None, Some(score)) => Err(StandingsError::malformed(
            week,
            format!("{label} score {score} has no team"),
        )),
    }
}
