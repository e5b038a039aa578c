//! SQLite persistence for computed standings.
//!
//! Every table is keyed by league and season plus its own id, and every write
//! is an upsert, so loading the same season twice leaves identical rows.

use anyhow::{Context, Result};
use espn_ffl_api::{Division, LeagueId, LeagueSeason, LeagueSettings, TeamInfo};
use log::{debug, info};
use rusqlite::{Connection, params};
use standings_engine::{SeasonId, StandingsTable};
use std::collections::BTreeMap;
use std::path::Path;

const SCHEMA: &str = include_str!("../sql/schema.sql");

const SCORE_COLUMNS: &[&str] = &[
    "league_id",
    "season_id",
    "week_number",
    "team_id",
    "matchup_period",
    "opponent_id",
    "home_or_away",
    "week_type",
    "score",
    "opponent_score",
    "win_ind",
    "loss_ind",
    "tie_ind",
    "bye_ind",
    "total_wins",
    "all_play_wins",
    "all_play_losses",
    "all_play_wins_int",
    "all_play_losses_int",
    "all_play_ties_int",
    "cum_score",
    "cum_score_opp",
    "cum_wins",
    "cum_losses",
    "cum_ties",
    "cum_byes",
    "cum_total_wins",
    "cum_all_play_wins",
    "cum_all_play_losses",
    "cum_all_play_wins_int",
    "cum_all_play_losses_int",
    "cum_all_play_ties_int",
    "weeks_played",
    "cum_score_per_week",
    "cum_score_opp_per_week",
    "cum_all_play_wins_per_week",
    "record",
    "all_play_record",
    "standings",
];

const TEAM_COLUMNS: &[&str] = &[
    "league_id",
    "season_id",
    "team_id",
    "manager_id",
    "team_name",
    "manager_name",
    "espn_name",
];

const WEEK_COLUMNS: &[&str] =
    &["league_id", "season_id", "week_number", "matchup_period", "regular_season"];

const DIVISION_COLUMNS: &[&str] = &["league_id", "season_id", "division_id", "name", "size"];

const SETTINGS_COLUMNS: &[&str] = &[
    "league_id",
    "season_id",
    "playoff_seeding_rule",
    "playoff_seeding_rule_by",
    "playoff_team_count",
    "first_scoring_period",
    "final_scoring_period",
    "matchup_period_count",
    "playoff_week_start",
    "scoring_type",
    "matchup_tie_rule",
    "playoff_matchup_tie_rule",
    "home_team_bonus",
];

/// `INSERT .. ON CONFLICT(keys) DO UPDATE` over `columns`, whose first `keys`
/// entries form the primary key.
fn upsert_sql(table: &str, columns: &[&str], keys: usize) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    let updates = columns[keys..]
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) ON CONFLICT({}) DO UPDATE SET {updates}",
        columns.join(", "),
        columns[..keys].join(", "),
    )
}

/// Rows written per table by one [`Store::save_season`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub scores: usize,
    pub teams: usize,
    pub weeks: usize,
    pub divisions: usize,
    pub settings: usize,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;
        let store = Self { conn };
        store.migrate()?;
        info!("Opened database {}", path.display());
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA).context("Failed to apply schema")
    }

    /// Persist everything computed for one season.
    pub fn save_season(
        &mut self,
        season: &LeagueSeason,
        table: &StandingsTable,
        playoff_week_start: u32,
    ) -> Result<SaveSummary> {
        let league = season.league_id;
        let tx = self.conn.transaction()?;
        let summary = SaveSummary {
            scores: upsert_scores(&tx, league, table)?,
            teams: upsert_teams(&tx, league, season.season_id, &season.teams)?,
            weeks: upsert_weeks(&tx, league, table)?,
            divisions: upsert_divisions(&tx, league, season.season_id, &season.settings.divisions)?,
            settings: upsert_settings(&tx, league, &season.settings, playoff_week_start)?,
        };
        tx.commit()
            .with_context(|| format!("Failed to commit season {}", season.season_id))?;
        info!(
            "Saved season {}: {} scores, {} teams, {} weeks",
            season.season_id, summary.scores, summary.teams, summary.weeks
        );
        Ok(summary)
    }
}

fn upsert_scores(conn: &Connection, league: LeagueId, table: &StandingsTable) -> Result<usize> {
    let sql = upsert_sql("scores", SCORE_COLUMNS, 4);
    let mut stmt = conn.prepare_cached(&sql)?;
    for row in &table.rows {
        let w = &row.week;
        let o = &row.outcome;
        let a = &row.all_play;
        let c = &row.cumulative;
        stmt.execute(params![
            league,
            w.season_id,
            w.week_number,
            w.team_id,
            w.matchup_period,
            w.opponent_id,
            w.home_or_away.as_str(),
            w.week_type.as_str(),
            w.score.as_f64(),
            w.opponent_score.as_f64(),
            o.win_ind,
            o.loss_ind,
            o.tie_ind,
            o.bye_ind,
            o.total_wins,
            a.all_play_wins,
            a.all_play_losses,
            a.all_play_wins_int,
            a.all_play_losses_int,
            a.all_play_ties_int,
            c.cum_score.as_f64(),
            c.cum_score_opp.as_f64(),
            c.cum_wins,
            c.cum_losses,
            c.cum_ties,
            c.cum_byes,
            c.cum_total_wins,
            c.cum_all_play_wins,
            c.cum_all_play_losses,
            c.cum_all_play_wins_int,
            c.cum_all_play_losses_int,
            c.cum_all_play_ties_int,
            c.weeks_played,
            c.score_per_week(),
            c.score_opp_per_week(),
            c.all_play_wins_per_week(),
            row.record(),
            row.all_play_record(),
            row.standings,
        ])
        .with_context(|| {
            format!("Failed to upsert score for team {} week {}", w.team_id, w.week_number)
        })?;
    }
    debug!("Upserted {} score rows for season {}", table.rows.len(), table.season_id);
    Ok(table.rows.len())
}

fn upsert_teams(
    conn: &Connection,
    league: LeagueId,
    season: SeasonId,
    teams: &[TeamInfo],
) -> Result<usize> {
    let sql = upsert_sql("teams", TEAM_COLUMNS, 3);
    let mut stmt = conn.prepare_cached(&sql)?;
    for t in teams {
        stmt.execute(params![
            league,
            season,
            t.team_id,
            t.manager_id,
            t.team_name,
            t.manager_name,
            t.espn_name,
        ])?;
    }
    Ok(teams.len())
}

/// One row per week present in the table.
fn upsert_weeks(conn: &Connection, league: LeagueId, table: &StandingsTable) -> Result<usize> {
    let weeks: BTreeMap<u32, (u32, bool)> = table
        .rows
        .iter()
        .map(|r| (r.week.week_number, (r.week.matchup_period, r.week.week_type.is_regular())))
        .collect();

    let sql = upsert_sql("weeks", WEEK_COLUMNS, 3);
    let mut stmt = conn.prepare_cached(&sql)?;
    for (week, (matchup_period, regular)) in &weeks {
        stmt.execute(params![league, table.season_id, week, matchup_period, regular])?;
    }
    Ok(weeks.len())
}

fn upsert_divisions(
    conn: &Connection,
    league: LeagueId,
    season: SeasonId,
    divisions: &[Division],
) -> Result<usize> {
    let sql = upsert_sql("divisions", DIVISION_COLUMNS, 3);
    let mut stmt = conn.prepare_cached(&sql)?;
    for d in divisions {
        stmt.execute(params![league, season, d.division_id, d.name, d.size])?;
    }
    Ok(divisions.len())
}

fn upsert_settings(
    conn: &Connection,
    league: LeagueId,
    settings: &LeagueSettings,
    playoff_week_start: u32,
) -> Result<usize> {
    let sql = upsert_sql("settings", SETTINGS_COLUMNS, 2);
    conn.execute(
        &sql,
        params![
            league,
            settings.season_id,
            settings.playoff_seeding_rule,
            settings.playoff_seeding_rule_by,
            settings.playoff_team_count,
            settings.first_scoring_period,
            settings.final_scoring_period,
            settings.matchup_period_count,
            playoff_week_start,
            settings.scoring_type,
            settings.matchup_tie_rule,
            settings.playoff_matchup_tie_rule,
            settings.home_team_bonus,
        ],
    )?;
    Ok(1)
}

#[cfg(test)]
impl Store {
    pub fn open_in_memory() -> Result<Self> {
        let store = Self { conn: Connection::open_in_memory()? };
        store.migrate()?;
        Ok(store)
    }

    /// Stored (team, rank) pairs for one week, in rank order.
    pub fn week_ranks(
        &self,
        league: LeagueId,
        season: SeasonId,
        week: u32,
    ) -> Result<Vec<(i32, Option<u32>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT team_id, standings FROM scores
             WHERE league_id = ? AND season_id = ? AND week_number = ?
             ORDER BY standings, team_id",
        )?;
        let rows = stmt
            .query_map(params![league, season, week], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count(&self, table: &str) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .with_context(|| format!("Failed to count {table}"))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espn_ffl_api::Division;
    use standings_engine::{MatchupRecord, Points, StandingsPipeline};
    use rusqlite::types::Value;
    use tempfile::NamedTempFile;

    fn pts(v: i64) -> Points {
        Points::from_hundredths(v * 100)
    }

    fn season() -> (LeagueSeason, StandingsTable) {
        let matchups = vec![
            MatchupRecord::played(1, (1, pts(100)), (2, pts(90))),
            MatchupRecord::played(1, (3, pts(80)), (4, pts(70))),
            MatchupRecord::played(2, (1, pts(60)), (3, pts(95))),
            MatchupRecord::played(2, (2, pts(88)), (4, pts(99))),
            MatchupRecord::played(3, (1, pts(75)), (4, pts(65))),
            MatchupRecord::played(3, (2, pts(70)), (3, pts(72))),
        ];
        let league = LeagueSeason {
            league_id: 42,
            season_id: 2021,
            settings: LeagueSettings {
                season_id: 2021,
                playoff_seeding_rule: "TOTAL_POINTS_SCORED".into(),
                matchup_period_count: 2,
                divisions: vec![Division { division_id: 0, name: "East".into(), size: 4 }],
                ..Default::default()
            },
            teams: (1..=4)
                .map(|id| TeamInfo {
                    team_id: id,
                    team_name: format!("Team {id}"),
                    manager_name: Some(format!("Manager {id}")),
                    ..Default::default()
                })
                .collect(),
            matchups,
        };
        let table = StandingsPipeline::new(3).run(2021, &league.matchups).unwrap();
        (league, table)
    }

    #[test]
    fn save_writes_every_table() {
        let (league, table) = season();
        let mut store = Store::open_in_memory().unwrap();
        let summary = store.save_season(&league, &table, 3).unwrap();

        assert_eq!(summary, SaveSummary { scores: 12, teams: 4, weeks: 3, divisions: 1, settings: 1 });
        assert_eq!(store.count("scores").unwrap(), 12);
        assert_eq!(store.count("weeks").unwrap(), 3);
    }

    /// Three teams, so someone sits out every week.
    fn season_with_byes() -> (LeagueSeason, StandingsTable) {
        let matchups = vec![
            MatchupRecord::played(1, (1, pts(100)), (2, pts(90))),
            MatchupRecord::bye(1, 3, pts(80)),
            MatchupRecord::played(2, (1, pts(60)), (3, pts(95))),
            MatchupRecord::bye(2, 2, pts(70)),
            MatchupRecord::played(3, (2, pts(75)), (3, pts(65))),
            MatchupRecord::bye(3, 1, pts(85)),
        ];
        let league = LeagueSeason {
            league_id: 42,
            season_id: 2022,
            settings: LeagueSettings {
                season_id: 2022,
                matchup_period_count: 3,
                divisions: vec![Division { division_id: 1, name: "West".into(), size: 3 }],
                ..Default::default()
            },
            teams: (1..=3)
                .map(|id| TeamInfo {
                    team_id: id,
                    team_name: format!("Team {id}"),
                    ..Default::default()
                })
                .collect(),
            matchups,
        };
        let table = StandingsPipeline::new(3).run(2022, &league.matchups).unwrap();
        (league, table)
    }

    /// Every column of every row, in primary-key order.
    fn dump(store: &Store, table: &str) -> Vec<Vec<Value>> {
        let sql = format!("SELECT * FROM {table} ORDER BY 1, 2, 3, 4");
        let mut stmt = store.conn.prepare(&sql).unwrap();
        let columns = stmt.column_count();
        stmt.query_map([], |row| {
            (0..columns).map(|i| row.get::<_, Value>(i)).collect::<rusqlite::Result<Vec<_>>>()
        })
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap()
    }

    const TABLES: [&str; 5] = ["scores", "teams", "weeks", "divisions", "settings"];

    #[test]
    fn saving_twice_is_idempotent() {
        for (league, table) in [season(), season_with_byes()] {
            let mut store = Store::open_in_memory().unwrap();
            store.save_season(&league, &table, 3).unwrap();
            let before: Vec<_> = TABLES.iter().map(|t| dump(&store, t)).collect();

            let recomputed =
                StandingsPipeline::new(3).run(league.season_id, &league.matchups).unwrap();
            store.save_season(&league, &recomputed, 3).unwrap();
            let after: Vec<_> = TABLES.iter().map(|t| dump(&store, t)).collect();

            assert_eq!(before, after);
            assert_eq!(before[0].len(), table.rows.len());
            assert_eq!(before[0][0].len(), SCORE_COLUMNS.len());
        }
    }

    #[test]
    fn failed_save_leaves_nothing_behind() {
        let (league, table) = season();
        let mut store = Store::open_in_memory().unwrap();
        store.conn.execute_batch("DROP TABLE settings").unwrap();

        assert!(store.save_season(&league, &table, 3).is_err());
        assert_eq!(store.count("scores").unwrap(), 0);
        assert_eq!(store.count("teams").unwrap(), 0);
        assert_eq!(store.count("weeks").unwrap(), 0);
    }

    #[test]
    fn playoff_weeks_store_null_rank() {
        let (league, table) = season();
        let mut store = Store::open_in_memory().unwrap();
        store.save_season(&league, &table, 3).unwrap();

        let playoff = store.week_ranks(42, 2021, 3).unwrap();
        assert_eq!(playoff.len(), 4);
        assert!(playoff.iter().all(|(_, rank)| rank.is_none()));

        let mut ranks: Vec<u32> =
            store.week_ranks(42, 2021, 2).unwrap().into_iter().filter_map(|(_, r)| r).collect();
        ranks.sort();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn later_write_wins() {
        let (league, table) = season();
        let mut store = Store::open_in_memory().unwrap();
        upsert_teams(&store.conn, 42, 2021, &league.teams).unwrap();

        let renamed = vec![TeamInfo {
            team_id: 1,
            team_name: "Renamed".into(),
            ..Default::default()
        }];
        upsert_teams(&store.conn, 42, 2021, &renamed).unwrap();
        upsert_scores(&store.conn, 42, &table).unwrap();

        let name: String = store
            .conn
            .query_row("SELECT team_name FROM teams WHERE team_id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Renamed");
        assert_eq!(store.count("teams").unwrap(), 4);
    }

    #[test]
    fn file_database_survives_reopen() {
        let file = NamedTempFile::new().unwrap();
        let (league, table) = season();
        {
            let mut store = Store::open(file.path()).unwrap();
            store.save_season(&league, &table, 3).unwrap();
        }
        let store = Store::open(file.path()).unwrap();
        assert_eq!(store.count("scores").unwrap(), 12);
        assert_eq!(store.count("divisions").unwrap(), 1);
    }

    #[test]
    fn upsert_sql_updates_non_key_columns() {
        let sql = upsert_sql("weeks", WEEK_COLUMNS, 3);
        assert!(sql.contains("ON CONFLICT(league_id, season_id, week_number)"));
        assert!(sql.contains("matchup_period = excluded.matchup_period"));
        assert!(!sql.contains("league_id = excluded.league_id"));
    }
}
