use crate::config::{ApiConfig, Config};
use crate::store::{SaveSummary, Store};
use anyhow::{Context, Result};
use espn_ffl_api::LeagueSeason;
use espn_ffl_api::client::{ApiResult, EspnFflApi};
use log::{info, warn};
use standings_engine::{SeasonId, StandingsTable};
use std::future::Future;
use std::path::PathBuf;

/// A fetched season together with its computed standings.
#[derive(Debug, Clone)]
pub struct LoadedSeason {
    pub league: LeagueSeason,
    pub table: StandingsTable,
    pub playoff_week_start: u32,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or
/// `max_retries` retries are spent. Retry-After wins over the computed delay.
pub async fn with_backoff<T, F, Fut>(api: &ApiConfig, what: &str, mut op: F) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < api.max_retries => {
                let delay = e.retry_after().unwrap_or_else(|| api.backoff(attempt));
                attempt += 1;
                warn!(
                    "{what} failed: {e}; retry {attempt}/{} in {}ms",
                    api.max_retries,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

pub struct Loader {
    config: Config,
    client: EspnFflApi,
}

impl Loader {
    pub fn new(config: Config) -> Self {
        let client = EspnFflApi::new()
            .with_base_url(config.api.base_url.clone())
            .with_timeout(config.api.timeout());
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn load_season(&self, season: SeasonId) -> Result<LoadedSeason> {
        let league_id = self.config.league_id()?;
        info!("Loading league {league_id} season {season}");
        let client = &self.client;
        let league = with_backoff(&self.config.api, &format!("season {season}"), move || {
            client.fetch_league(league_id, season)
        })
        .await
        .with_context(|| format!("Failed to fetch league {league_id} season {season}"))?;

        compute(&self.config, league)
    }

    /// Load every configured season and persist each one as it arrives.
    pub async fn load_all(&self) -> Result<Vec<(SeasonId, SaveSummary)>> {
        let mut saved = Vec::new();
        for season in self.config.current_seasons() {
            let loaded = self.load_season(season).await?;
            match self.config.storage.database.clone() {
                Some(path) => {
                    let summary = persist(path, loaded).await?;
                    saved.push((season, summary));
                }
                None => info!("No database configured; season {season} not persisted"),
            }
        }
        Ok(saved)
    }
}

/// Run the standings pipeline over a fetched season.
pub fn compute(config: &Config, league: LeagueSeason) -> Result<LoadedSeason> {
    let pipeline = config.pipeline(league.settings.playoff_week_start())?;
    let table = pipeline
        .run(league.season_id, &league.matchups)
        .with_context(|| format!("Failed to compute standings for season {}", league.season_id))?;
    Ok(LoadedSeason { playoff_week_start: pipeline.playoff_week_start, league, table })
}

/// Write a season to SQLite off the async runtime.
pub async fn persist(path: PathBuf, loaded: LoadedSeason) -> Result<SaveSummary> {
    tokio::task::spawn_blocking(move || {
        let mut store = Store::open(&path)?;
        store.save_season(&loaded.league, &loaded.table, loaded.playoff_week_start)
    })
    .await
    .context("Storage task panicked")?
}
