use crate::loader::LoadedSeason;
use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use standings_engine::SeasonId;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadSeason { season: SeasonId },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    SeasonLoaded { loaded: Box<LoadedSeason> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
