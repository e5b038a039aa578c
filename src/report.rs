//! Plain-text and JSON renderings of one week, for `ffl-standings print`.

use crate::loader::LoadedSeason;
use crate::state::app_state::StandingsState;
use anyhow::{Result, bail};
use serde_json::json;
use standings_engine::{SurvivorState, TeamId};
use std::fmt::Write;

/// Standings state positioned on `week`, which must exist in the season.
fn week_state(loaded: LoadedSeason, week: u32) -> Result<StandingsState> {
    let weeks = loaded.table.weeks();
    if !weeks.contains(&week) {
        let last = weeks.last().copied().unwrap_or(0);
        bail!("Week {week} is not in season {} (weeks 1-{last})", loaded.table.season_id);
    }
    let mut state = StandingsState::new(vec![loaded.table.season_id]);
    state.loaded = Some(loaded);
    state.week = week;
    Ok(state)
}

pub fn render_text(loaded: LoadedSeason, week: u32) -> Result<String> {
    let state = week_state(loaded, week)?;
    let mut out = String::new();
    let season = state.season().unwrap_or_default();

    writeln!(out, "Season {season} week {week}")?;
    writeln!(
        out,
        "{:>4}  {:<24} {:>8} {:>9} {:>8} {:>9} {:>9}",
        "Rank", "Team", "Record", "All-play", "Score", "PF", "PA"
    )?;
    for row in state.sorted_rows() {
        let rank = row.standings.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
        writeln!(
            out,
            "{rank:>4}  {:<24} {:>8} {:>9} {:>8} {:>9} {:>9}",
            state.display_name(row.week.team_id),
            row.record(),
            row.all_play_record(),
            row.week.score.to_string(),
            row.cumulative.cum_score.to_string(),
            row.cumulative.cum_score_opp.to_string(),
        )?;
    }

    writeln!(out)?;
    match state.survivor() {
        Some(Ok(survivor)) => write_survivor(&mut out, &state, &survivor)?,
        Some(Err(e)) => writeln!(out, "Survivor: {e}")?,
        None => {}
    }
    Ok(out)
}

fn write_survivor(out: &mut String, state: &StandingsState, survivor: &SurvivorState) -> Result<()> {
    writeln!(
        out,
        "Survivor alive ({}): {}",
        survivor.alive_count(),
        team_names(state, survivor.alive())
    )?;
    writeln!(
        out,
        "Survivor eliminated: {}",
        team_names(state, survivor.eliminated().iter().copied())
    )?;
    Ok(())
}

fn team_names(state: &StandingsState, teams: impl Iterator<Item = TeamId>) -> String {
    teams.map(|t| state.display_name(t)).collect::<Vec<_>>().join(", ")
}

pub fn render_json(loaded: LoadedSeason, week: u32) -> Result<String> {
    let state = week_state(loaded, week)?;
    let rows: Vec<_> = state
        .sorted_rows()
        .into_iter()
        .map(|row| {
            let c = &row.cumulative;
            json!({
                "team_id": row.week.team_id,
                "team": state.display_name(row.week.team_id),
                "standings": row.standings,
                "record": row.record(),
                "all_play_record": row.all_play_record(),
                "score": row.week.score.as_f64(),
                "opponent_id": row.week.opponent_id,
                "opponent_score": row.week.opponent_score.as_f64(),
                "week_type": row.week.week_type.as_str(),
                "cum_score": c.cum_score.as_f64(),
                "cum_score_opp": c.cum_score_opp.as_f64(),
                "cum_total_wins": c.cum_total_wins,
                "cum_all_play_wins": c.cum_all_play_wins,
                "cum_score_per_week": c.score_per_week(),
            })
        })
        .collect();

    let survivor = match state.survivor() {
        Some(Ok(s)) => json!({
            "alive": s.alive().collect::<Vec<_>>(),
            "eliminated": s.eliminated(),
        }),
        Some(Err(e)) => json!({ "error": e.to_string() }),
        None => serde_json::Value::Null,
    };

    let doc = json!({
        "season_id": state.season(),
        "week": week,
        "standings": rows,
        "survivor": survivor,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}
