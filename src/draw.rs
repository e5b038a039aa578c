use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::state::app_state::{Column, StandingsState};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use standings_engine::{StandingsError, StandingsRow};

static TABS: &[&str; 2] = &["Standings", "Survivor"];

const HELP_TEXT: &str = "\
1 standings    2 survivor    ? help (Esc to close)

h / ←    previous week
l / →    next week
n        next season
r        reload season
s        cycle sort column
S        reverse sort direction
f        full screen
\"        toggle logs
q        quit";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Survivor => draw_survivor(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("Failed to draw: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Standings => 0,
        MenuItem::Survivor => 1,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// " 2021 · Week 5 " with a playoff marker, or the season alone before load.
fn week_title(standings: &StandingsState, what: &str) -> String {
    let season = standings.season().map(|s| s.to_string()).unwrap_or_else(|| "-".into());
    let Some(table) = standings.table() else {
        return format!(" {what} {season} ");
    };
    let playoff = table
        .week(standings.week)
        .first()
        .is_some_and(|r| !r.week.week_type.is_regular());
    let suffix = if playoff { " (playoffs)" } else { "" };
    format!(" {what} {season} · Week {}{suffix} ", standings.week)
}

/// Message shown in place of data that is missing or failed to load.
fn draw_status(f: &mut Frame, area: Rect, app: &App, what: &str) {
    let msg = if let Some(err) = app.state.last_error.as_deref() {
        format!("{what} load failed:\n{err}")
    } else {
        "Loading season...".to_string()
    };
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let standings = &app.state.standings;
    let block = default_border(Color::White).title(week_title(standings, "Standings"));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if standings.table().is_none() {
        draw_status(f, inner, app, "Standings");
        return;
    }

    let [legend, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    let direction = if standings.sort_ascending { "▲" } else { "▼" };
    f.render_widget(
        Paragraph::new(format!(
            "sort: {} {direction}   h/l=week  s=sort  S=reverse  n=season  r=reload",
            standings.sort_column.header()
        ))
        .style(Style::default().fg(Color::DarkGray)),
        legend,
    );

    let header = Row::new(Column::ALL.iter().map(|c| {
        let style = if *c == standings.sort_column {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(c.header()).style(style)
    }));

    let rows: Vec<Row> = standings
        .sorted_rows()
        .into_iter()
        .map(|row| {
            Row::new(Column::ALL.iter().map(|c| {
                let cell = Cell::from(cell_text(standings, row, *c));
                if *c == standings.sort_column {
                    cell.style(Style::default().fg(Color::Yellow))
                } else {
                    cell
                }
            }))
            .style(outcome_style(row))
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(7),
    ];
    f.render_widget(Table::new(rows, widths).header(header), content);
}

fn cell_text(standings: &StandingsState, row: &StandingsRow, column: Column) -> String {
    let c = &row.cumulative;
    match column {
        Column::Rank => row.standings.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
        Column::Team => standings.display_name(row.week.team_id),
        Column::Record => row.record(),
        Column::AllPlay => row.all_play_record(),
        Column::Score => row.week.score.to_string(),
        Column::Opponent if row.week.is_bye() => "bye".into(),
        Column::Opponent => row.week.opponent_score.to_string(),
        Column::CumScore => c.cum_score.to_string(),
        Column::CumScoreOpp => c.cum_score_opp.to_string(),
        Column::PerWeek => format!("{:.2}", c.score_per_week()),
    }
}

fn outcome_style(row: &StandingsRow) -> Style {
    let o = &row.outcome;
    if o.win_ind == 1 {
        Style::default().fg(Color::Green)
    } else if o.loss_ind == 1 {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn draw_survivor(f: &mut Frame, area: Rect, app: &App) {
    let standings = &app.state.standings;
    let block = default_border(Color::White).title(week_title(standings, "Survivor"));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(result) = standings.survivor() else {
        draw_status(f, inner, app, "Survivor");
        return;
    };

    let state = match result {
        Ok(state) => state,
        Err(StandingsError::NoDataForWeek { week }) => {
            draw_placeholder(f, inner, &format!("No scores for the surviving teams in week {week}"));
            return;
        }
        Err(e) => {
            draw_placeholder(f, inner, &e.to_string());
            return;
        }
    };

    let [alive_area, out_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(inner);

    let mut alive: Vec<Line> = vec![Line::from(Span::styled(
        format!("Alive ({})", state.alive_count()),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))];
    alive.extend(state.alive().map(|t| Line::from(format!("  {}", standings.display_name(t)))));
    if state.alive_count() == 1 {
        alive.push(Line::from(""));
        alive.push(Line::from(Span::styled("Winner!", Style::default().fg(Color::Yellow))));
    }
    f.render_widget(Paragraph::new(alive), alive_area);

    let weeks = standings
        .table()
        .map(|t| t.ranked_weeks())
        .unwrap_or_default();
    let mut out: Vec<Line> = vec![Line::from(Span::styled(
        format!("Eliminated ({})", state.eliminated().len()),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))];
    for (i, team) in state.eliminated().iter().enumerate() {
        let week = weeks.get(i).map(|w| format!("wk {w:>2}")).unwrap_or_default();
        let style = if Some(*team) == state.latest_loser() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        out.push(Line::from(Span::styled(
            format!("  {week}  {}", standings.display_name(*team)),
            style,
        )));
    }
    f.render_widget(Paragraph::new(out), out_area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Gray))
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_target(false)
        .output_file(false)
        .output_line(false);
    f.render_widget(logs, area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
