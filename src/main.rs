mod app;
mod config;
mod draw;
mod keys;
mod loader;
mod report;
mod state;
mod store;
mod ui;
mod week;

use crate::app::App;
use crate::config::Config;
use crate::loader::Loader;
use crate::state::app_settings::AppSettings;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use anyhow::{Context, bail};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use standings_engine::SeasonId;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[derive(Debug, PartialEq)]
enum Command {
    Tui,
    Load,
    Print { season: SeasonId, week: u32, json: bool },
}

#[derive(Debug, PartialEq)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(cli) = handle_cli_args(std::env::args().skip(1))? else {
        return Ok(());
    };
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Tui => run_tui(config).await,
        Command::Load => {
            init_headless_logger();
            let saved = Loader::new(config).load_all().await?;
            for (season, summary) in saved {
                println!(
                    "season {season}: {} scores, {} teams, {} weeks, {} divisions",
                    summary.scores, summary.teams, summary.weeks, summary.divisions
                );
            }
            Ok(())
        }
        Command::Print { season, week, json } => {
            init_headless_logger();
            let loaded = Loader::new(config).load_season(season).await?;
            let out = if json {
                report::render_json(loaded, week)?
            } else {
                report::render_text(loaded, week)?
            };
            print!("{out}");
            Ok(())
        }
    }
}

/// Parse arguments; `None` when help or version was printed.
fn handle_cli_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Cli>> {
    let mut config = None;
    let mut positional = Vec::new();
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", usage_text());
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("ffl-standings {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            "-c" | "--config" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--json" => json = true,
            a if a.starts_with('-') => bail!("Unknown argument: {a}\n\n{}", usage_text()),
            _ => positional.push(arg),
        }
    }

    let command = match positional.as_slice() {
        [] => Command::Tui,
        [cmd] if cmd == "load" => Command::Load,
        [cmd, season, week] if cmd == "print" => Command::Print {
            season: season.parse().with_context(|| format!("Invalid season `{season}`"))?,
            week: week.parse().with_context(|| format!("Invalid week `{week}`"))?,
            json,
        },
        _ => bail!("Unknown command: {}\n\n{}", positional.join(" "), usage_text()),
    };
    if json && !matches!(command, Command::Print { .. }) {
        bail!("--json only applies to print");
    }
    Ok(Some(Cli { config, command }))
}

fn usage_text() -> &'static str {
    "ffl-standings - fantasy football league standings

Usage:
  ffl-standings [--config <path>]                       open the standings viewer
  ffl-standings [--config <path>] load                  fetch, compute and store every configured season
  ffl-standings [--config <path>] print <season> <week> [--json]
  ffl-standings --help
  ffl-standings --version

Environment:
  FFL_CONFIG       Config file (default ./ffl.toml)
  FFL_LEAGUE_ID    League id override
  FFL_DATABASE     SQLite path override (empty disables storage)
  FFL_API_BASE     API base URL override
  FFL_LOG_LEVEL    Log level (error, warn, info, debug, trace)
  RUST_LOG         Log filter for load and print"
}

fn init_headless_logger() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = AppSettings::load().log_level {
        builder.filter_level(level);
    }
    builder.init();
}

async fn run_tui(config: Config) -> anyhow::Result<()> {
    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Info)?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let loader = Loader::new(config.clone());
    let app = Arc::new(Mutex::new(App::new(config)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(loader, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Trigger season load on startup
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();

    Ok(())
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw = handle_network_response(response, &app, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => break,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let season = app.lock().await.current_season();
            match season {
                Some(season) => {
                    let _ = network_requests.send(NetworkRequest::LoadSeason { season }).await;
                }
                None => error!("No seasons configured"),
            }
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::SeasonLoaded { loaded } => {
            let mut guard = app.lock().await;
            guard.on_season_loaded(*loaded);
        }
        NetworkResponse::Error { message } => {
            error!("Load failed: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        // crossterm's read blocks; keep it off the async workers
        let event = match tokio::task::spawn_blocking(crossterm_event::read).await {
            Ok(Ok(event)) => event,
            Ok(Err(_)) => continue,
            Err(_) => break,
        };
        let ui_event = match event {
            Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
            Event::Resize(_, _) => Some(UiEvent::Resize),
            _ => None,
        };

        if let Some(ui_event) = ui_event
            && ui_events.send(ui_event).await.is_err()
        {
            break;
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

/// Restore the terminal. Best effort: also runs from the panic hook.
pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
