use log::LevelFilter;
use std::str::FromStr;

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
}

impl AppSettings {
    /// `FFL_LOG_LEVEL` (error, warn, info, debug, trace) raises or lowers the log pane level.
    pub fn load() -> Self {
        Self::from_level(std::env::var("FFL_LOG_LEVEL").ok().as_deref())
    }

    fn from_level(level: Option<&str>) -> Self {
        let log_level = level.and_then(|l| LevelFilter::from_str(l.trim()).ok());
        Self { full_screen: false, log_level }
    }
}
