//! Error types for the standings engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StandingsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StandingsError {
    /// A matchup is missing fields beyond the documented bye-week nulls.
    #[error("malformed matchup in week {week}: {reason}")]
    MalformedRecord { week: u32, reason: String },

    /// Ranking tiers that do not partition 1..N, or other unusable settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown metric `{0}`")]
    UnknownMetric(String),

    #[error("no rows for week {week}")]
    NoDataForWeek { week: u32 },

    #[error("week {week} is past the last week with data ({last_week})")]
    WeekOutOfRange { week: u32, last_week: u32 },

    #[error("survivor contest already ended before week {week}")]
    ContestEnded { week: u32 },

    #[error("no matchup data for season {season}")]
    NoData { season: u16 },
}

impl StandingsError {
    pub fn malformed(week: u32, reason: impl Into<String>) -> Self {
        Self::MalformedRecord { week, reason: reason.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
