use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    let mut load = None;

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        (_, Char('1'), _) => guard.update_tab(MenuItem::Standings),
        (_, Char('2'), _) => guard.update_tab(MenuItem::Survivor),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Week navigation applies to both data tabs
        (MenuItem::Standings | MenuItem::Survivor, Char('l') | KeyCode::Right, _) => {
            guard.next_week()
        }
        (MenuItem::Standings | MenuItem::Survivor, Char('h') | KeyCode::Left, _) => {
            guard.prev_week()
        }

        (MenuItem::Standings, Char('s'), _) => guard.cycle_sort(),
        (MenuItem::Standings, Char('S'), _) => guard.reverse_sort(),

        (_, Char('n'), _) => load = guard.next_season(),
        (_, Char('r'), _) => load = guard.current_season(),

        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }

    if let Some(season) = load {
        drop(guard);
        let _ = network_requests.send(NetworkRequest::LoadSeason { season }).await;
    }
}
