use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use espn_ffl_api::LeagueId;
use espn_ffl_api::client::DEFAULT_BASE_URL;
use serde::Deserialize;
use standings_engine::{
    ByePolicy, DEFAULT_PLAYOFF_WEEK_START, RankTier, RankingSchedule, SeasonId, StandingsPipeline,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "ffl.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub league: LeagueConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LeagueConfig {
    /// Required, from the file or `FFL_LEAGUE_ID`.
    pub league_id: Option<LeagueId>,
    /// Empty means the current season only.
    pub seasons: Vec<SeasonId>,
    pub bye_policy: ByePolicy,
    /// Overrides the value derived from league settings.
    pub playoff_week_start: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_s: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_s: 10,
            max_retries: 3,
            retry_base_ms: 500,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }

    /// Delay before retry number `attempt` (0-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_base_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; `None` disables persistence.
    pub database: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DisplayConfig {
    /// First day of week 1, anchoring current-week detection.
    pub first_week_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RankingConfig {
    pub tiers: Vec<TierConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TierConfig {
    pub ranks: String,
    pub metrics: Vec<String>,
    pub ascending: Vec<bool>,
}

impl RankingConfig {
    /// `None` when no tiers are configured, so the pipeline ranks by record.
    pub fn schedule(&self) -> Result<Option<RankingSchedule>> {
        if self.tiers.is_empty() {
            return Ok(None);
        }
        let tiers = self
            .tiers
            .iter()
            .map(|t| {
                RankTier::parse(&t.ranks, &t.metrics, &t.ascending)
                    .with_context(|| format!("Invalid ranking tier `{}`", t.ranks))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(RankingSchedule::new(tiers)?))
    }
}

impl Config {
    /// Load from `path`, then `FFL_CONFIG`, then `./ffl.toml`.
    ///
    /// Only the implicit default path may be missing; built-in defaults are used then.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("FFL_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        Ok(config)
    }

    /// Apply `FFL_LEAGUE_ID`, `FFL_DATABASE` and `FFL_API_BASE` from `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(id) = var("FFL_LEAGUE_ID") {
            let parsed = id
                .trim()
                .parse()
                .with_context(|| format!("FFL_LEAGUE_ID `{id}` is not a league id"))?;
            self.league.league_id = Some(parsed);
        }
        if let Some(db) = var("FFL_DATABASE") {
            self.storage.database = if db.trim().is_empty() { None } else { Some(PathBuf::from(db)) };
        }
        if let Some(base) = var("FFL_API_BASE")
            && !base.trim().is_empty()
        {
            self.api.base_url = base;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.league_id()?;
        if self.api.timeout_s == 0 {
            bail!("[api] timeout_s must be at least 1");
        }
        if let Some(start) = self.league.playoff_week_start
            && start < 2
        {
            bail!("[league] playoff_week_start must leave at least one regular week");
        }
        self.ranking.schedule().context("Invalid [ranking] configuration")?;
        Ok(())
    }

    pub fn league_id(&self) -> Result<LeagueId> {
        self.league
            .league_id
            .context("[league] league_id is required (or set FFL_LEAGUE_ID)")
    }

    /// Configured seasons, or the season in progress as of `today`.
    pub fn seasons(&self, today: NaiveDate) -> Vec<SeasonId> {
        if !self.league.seasons.is_empty() {
            return self.league.seasons.clone();
        }
        // seasons start in September and finish in the following January
        let year = if today.month() >= 8 { today.year() } else { today.year() - 1 };
        vec![year as SeasonId]
    }

    pub fn current_seasons(&self) -> Vec<SeasonId> {
        self.seasons(Local::now().date_naive())
    }

    /// Pipeline for a season: configured playoff start, else the league's own, else week 14.
    pub fn pipeline(&self, league_playoff_start: Option<u32>) -> Result<StandingsPipeline> {
        let start = self
            .league
            .playoff_week_start
            .or(league_playoff_start)
            .unwrap_or(DEFAULT_PLAYOFF_WEEK_START);
        let mut pipeline = StandingsPipeline::new(start).with_bye_policy(self.league.bye_policy);
        if let Some(schedule) = self.ranking.schedule()? {
            pipeline = pipeline.with_schedule(schedule);
        }
        Ok(pipeline)
    }
}
