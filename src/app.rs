use crate::config::Config;
use crate::loader::LoadedSeason;
use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use chrono::Local;
use log::info;
use standings_engine::SeasonId;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Standings,
    Survivor,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        let settings = AppSettings::load();

        let app = Self { state: AppState::new(config.current_seasons()), settings, config };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_season_loaded(&mut self, loaded: LoadedSeason) {
        self.state.last_error = None;
        info!(
            "Season {} loaded: {} teams, {} weeks",
            loaded.table.season_id,
            loaded.table.team_ids().len(),
            loaded.table.weeks().len()
        );
        self.state.standings.load(
            loaded,
            self.config.display.first_week_date,
            Local::now().date_naive(),
        );
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Season, week and sort selection, delegated to StandingsState
    // -----------------------------------------------------------------------

    pub fn current_season(&self) -> Option<SeasonId> {
        self.state.standings.season()
    }

    /// Move to the next configured season; the caller requests its load.
    pub fn next_season(&mut self) -> Option<SeasonId> {
        self.state.last_error = None;
        self.state.standings.next_season()
    }

    pub fn next_week(&mut self) {
        self.state.standings.next_week();
    }

    pub fn prev_week(&mut self) {
        self.state.standings.prev_week();
    }

    pub fn cycle_sort(&mut self) {
        self.state.standings.cycle_sort();
    }

    pub fn reverse_sort(&mut self) {
        self.state.standings.reverse_sort();
    }
}
