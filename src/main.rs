use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use nba_terminal::bracket::Side;
use nba_terminal::config::{self, DashboardConfig};
use nba_terminal::feed;
use nba_terminal::player_impact::WeightKind;
use nba_terminal::standings::{Conference, TeamSeasonRecord};
use nba_terminal::state::{
    AppState, Delta, ProviderCommand, Screen, apply_delta, conference_filter_label,
    playoff_mode_label, screen_label,
};
use nba_terminal::views::{self, PlayerSort};

const CHART_TEAMS: usize = 8;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cfg: &DashboardConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(cfg),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.search_active {
            match key.code {
                KeyCode::Enter => self.state.end_search(true),
                KeyCode::Esc => self.state.end_search(false),
                KeyCode::Backspace => self.state.pop_search_char(),
                KeyCode::Char(ch) => self.state.push_search_char(ch),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.set_screen(Screen::Standings),
            KeyCode::Char('2') => self.state.set_screen(Screen::Players),
            KeyCode::Char('3') => self.state.set_screen(Screen::Playoffs),
            KeyCode::Char('4') => {
                self.state.set_screen(Screen::Schedule);
                if self.state.schedule_cached_at.is_none() && !self.state.schedule_loading {
                    self.request_schedule(false);
                }
            }
            KeyCode::Char('u') => self.request_schedule(true),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('[') => {
                if let Some(season) = self.state.step_season(-1) {
                    self.request_season(season);
                }
            }
            KeyCode::Char(']') => {
                if let Some(season) = self.state.step_season(1) {
                    self.request_season(season);
                }
            }
            KeyCode::Char('c') => self.state.cycle_conference(),
            KeyCode::Char('v') => self.state.next_division(),
            KeyCode::Char('V') => self.state.toggle_division(),
            KeyCode::Char('/') => self.state.begin_search(),
            KeyCode::Char('t') => self.state.cycle_quick_sort(),
            KeyCode::Char('s') => self.state.cycle_sort(),
            KeyCode::Char('p') => self.state.nudge_weight(WeightKind::Points, -1),
            KeyCode::Char('P') => self.state.nudge_weight(WeightKind::Points, 1),
            KeyCode::Char('a') => self.state.nudge_weight(WeightKind::Assists, -1),
            KeyCode::Char('A') => self.state.nudge_weight(WeightKind::Assists, 1),
            KeyCode::Char('r') => self.state.nudge_weight(WeightKind::Rebounds, -1),
            KeyCode::Char('R') => self.state.nudge_weight(WeightKind::Rebounds, 1),
            KeyCode::Char('m') => self.state.toggle_playoff_mode(),
            KeyCode::Char('g') => self.state.simulate_round(),
            KeyCode::Char('G') => self.state.simulate_all(),
            KeyCode::Char('h') => self.state.pick(Side::Top),
            KeyCode::Char('l') => self.state.pick(Side::Bottom),
            KeyCode::Char('x') => {
                self.state.reset_bracket();
                self.state.push_log("[INFO] Bracket reset");
            }
            KeyCode::Char('e') => {
                if let Some(cmd) = self.state.csv_export_command() {
                    self.send(cmd, "CSV export");
                }
            }
            KeyCode::Char('w') => {
                let cmd = self.state.workbook_export_command();
                self.send(cmd, "Workbook export");
            }
            _ => {}
        }
    }

    fn send(&mut self, cmd: ProviderCommand, what: &str) -> bool {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log(format!("[INFO] {what} unavailable"));
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
            false
        } else {
            true
        }
    }

    fn request_season(&mut self, season: u16) {
        if self.send(ProviderCommand::LoadSeason { season }, "Season fetch") {
            self.state.mark_loading(season);
        }
    }

    fn request_schedule(&mut self, refresh: bool) {
        let cmd = self.state.schedule_command(refresh);
        if self.send(cmd, "Schedule fetch") {
            self.state.schedule_loading = true;
            let msg = if refresh {
                "[INFO] Schedule refresh sent"
            } else {
                "[INFO] Schedule request sent"
            };
            self.state.push_log(msg);
        }
    }
}

fn main() -> io::Result<()> {
    config::load_dotenv();
    let cfg = DashboardConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(cfg.clone(), tx, cmd_rx);

    let mut app = App::new(&cfg, Some(cmd_tx));
    app.request_season(app.state.season);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Standings => render_standings(frame, chunks[1], &app.state),
        Screen::Players => render_players(frame, chunks[1], &app.state),
        Screen::Playoffs => render_playoffs(frame, chunks[1], &app.state),
        Screen::Schedule => render_schedule(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state, chunks[2].height))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let updated = state
        .seasons_loaded_at
        .get(&state.season)
        .map(|t| DateTime::<Local>::from(*t).format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let loading = if state.is_loading() { " | loading..." } else { "" };
    let title = format!(
        "NBA TERMINAL | {} | {} | Updated {updated}{loading}",
        season_label(state.season),
        screen_label(state.screen),
    );
    let filters = match state.screen {
        Screen::Standings => format!(
            "Conf: {} | Div: {} | Quick: {} | Sort: {} | Search: {}",
            conference_filter_label(state.conference_filter),
            division_label(state),
            state.quick.label(),
            state.standings_sort.label(),
            search_label(state),
        ),
        Screen::Players => format!(
            "Sort: {} | Search: {} | Weights PTS {:.1} AST {:.1} TRB {:.1}",
            state.player_query.sort.label(),
            search_label(state),
            state.weights.points,
            state.weights.assists,
            state.weights.rebounds,
        ),
        Screen::Playoffs => format!(
            "Mode: {} | Stage: {}",
            playoff_mode_label(state.playoff_mode),
            state
                .bracket
                .as_ref()
                .map(|b| b.stage().label())
                .unwrap_or("-"),
        ),
        Screen::Schedule => format!("{} games today", state.schedule.len()),
    };
    format!("  (o)  {title}\n  /|\\  {filters}")
}

fn search_label(state: &AppState) -> String {
    let text = state.search_text();
    if state.search_active {
        format!("{text}_")
    } else if text.is_empty() {
        "-".to_string()
    } else {
        text.to_string()
    }
}

/// Selected divisions (or "All"), then the division under the `v` cursor.
fn division_label(state: &AppState) -> String {
    let selected = if state.division_filter.is_empty() {
        "All".to_string()
    } else {
        state.division_filter.join(",")
    };
    match state.cursor_division() {
        Some(cursor) => format!("{selected} [v:{cursor}]"),
        None => selected,
    }
}

/// `2025` is the 2024-25 season.
fn season_label(season: u16) -> String {
    format!("{}-{:02}", season - 1, season % 100)
}

fn footer_text(state: &AppState) -> String {
    if state.search_active {
        return "Type to search | Enter Keep | Esc Clear".to_string();
    }
    match state.screen {
        Screen::Standings => {
            "1-4 Screens | [/] Season | c Conf | v/V Div | / Search | t Quick | s Sort | e CSV | w XLSX | ? Help | q Quit".to_string()
        }
        Screen::Players => {
            "1-4 Screens | j/k Move | / Search | s Sort | p/P a/A r/R Weights | e CSV | w XLSX | ? Help | q Quit".to_string()
        }
        Screen::Playoffs => {
            "1-4 Screens | m Mode | g Round | G All | j/k Game | h/l Pick | x Reset | ? Help | q Quit".to_string()
        }
        Screen::Schedule => "1-4 Screens | j/k Move | u Refresh | ? Help | q Quit".to_string(),
    }
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(60), Constraint::Length(44)])
        .split(area);

    let block = Block::default().title("Standings").borders(Borders::ALL);
    let inner = block.inner(columns[0]);
    frame.render_widget(block, columns[0]);

    let rows = state.standings_rows();
    if let Some(msg) = unavailable_message(state, state.standings_error(), rows.is_empty()) {
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
    } else {
        render_standings_table(frame, inner, &rows, state.selected);
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(columns[1]);

    let leaders = Paragraph::new(leaders_text(state))
        .block(Block::default().title("Leaders").borders(Borders::ALL));
    frame.render_widget(leaders, right[0]);

    let charted: Vec<&TeamSeasonRecord> = rows.iter().copied().take(CHART_TEAMS).collect();
    render_wins_chart(frame, right[1], &charted);
    render_win_pct_chart(frame, right[2], &charted);
    render_point_diff_chart(frame, right[3], &charted);
}

fn unavailable_message(state: &AppState, error: Option<&str>, empty: bool) -> Option<String> {
    if state.season_data().is_none() {
        return Some(if state.is_loading() {
            format!("Loading {}...", season_label(state.season))
        } else {
            "No data".to_string()
        });
    }
    if let Some(err) = error {
        return Some(format!("Data unavailable: {err}"));
    }
    empty.then(|| "No data".to_string())
}

fn standings_columns() -> [Constraint; 8] {
    [
        Constraint::Length(4),
        Constraint::Min(22),
        Constraint::Length(6),
        Constraint::Length(11),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(7),
    ]
}

fn render_standings_table(
    frame: &mut Frame,
    area: Rect,
    rows: &[&TeamSeasonRecord],
    selected: usize,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);
    let widths = standings_columns();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    render_row(
        frame,
        sections[0],
        &widths,
        &["#", "Team", "Conf", "Division", "W", "L", "Win%", "Diff"],
        bold,
    );

    let list_area = sections[1];
    let (start, end) = visible_range(selected, rows.len(), list_area.height as usize);
    for (i, idx) in (start..end).enumerate() {
        let r = rows[idx];
        let style = if idx == selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        let cells = [
            (idx + 1).to_string(),
            r.team.clone(),
            r.conference.short().to_string(),
            r.division.clone().unwrap_or_else(|| "-".to_string()),
            r.wins.to_string(),
            r.losses.to_string(),
            format!("{:.3}", r.win_pct),
            format!("{:+.1}", r.point_diff),
        ];
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        render_row(frame, row_rect(list_area, i), &widths, &cells, style);
    }
}

fn leaders_text(state: &AppState) -> String {
    match state.standings_leaders() {
        Some(l) => [
            format!("Most wins   {} ({})", l.most_wins.team, l.most_wins.wins),
            format!(
                "Best win%   {} ({:.3})",
                l.best_win_pct.team, l.best_win_pct.win_pct
            ),
            format!(
                "Best diff   {} ({:+.1})",
                l.best_point_diff.team, l.best_point_diff.point_diff
            ),
        ]
        .join("\n"),
        None => "No data".to_string(),
    }
}

fn render_wins_chart(frame: &mut Frame, area: Rect, rows: &[&TeamSeasonRecord]) {
    let max = rows.iter().map(|r| r.games()).max().unwrap_or(82).max(1);
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            Bar::default()
                .label(Line::from(short_name(&r.team)))
                .value(r.wins as u64)
                .text_value(r.wins.to_string())
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();
    render_chart(frame, area, "Wins", &bars, max as u64);
}

fn render_win_pct_chart(frame: &mut Frame, area: Rect, rows: &[&TeamSeasonRecord]) {
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            Bar::default()
                .label(Line::from(short_name(&r.team)))
                .value((r.win_pct * 1000.0).round() as u64)
                .text_value(format!("{:.3}", r.win_pct))
                .style(Style::default().fg(Color::Yellow))
        })
        .collect();
    render_chart(frame, area, "Win%", &bars, 1000);
}

fn render_point_diff_chart(frame: &mut Frame, area: Rect, rows: &[&TeamSeasonRecord]) {
    let max = rows
        .iter()
        .map(|r| (r.point_diff.abs() * 10.0).round() as u64)
        .max()
        .unwrap_or(1)
        .max(1);
    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            let color = if r.point_diff >= 0.0 {
                Color::Green
            } else {
                Color::Red
            };
            Bar::default()
                .label(Line::from(short_name(&r.team)))
                .value((r.point_diff.abs() * 10.0).round() as u64)
                .text_value(format!("{:+.1}", r.point_diff))
                .style(Style::default().fg(color))
        })
        .collect();
    render_chart(frame, area, "Point Diff", &bars, max);
}

fn render_chart(frame: &mut Frame, area: Rect, title: &str, bars: &[Bar], max: u64) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    if bars.is_empty() {
        frame.render_widget(Paragraph::new("No data").block(block), area);
        return;
    }
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(max);
    frame.render_widget(chart, area);
}

/// Nickname only: "Boston Celtics" -> "Celtics".
fn short_name(team: &str) -> String {
    team.rsplit(' ').next().unwrap_or(team).to_string()
}

fn player_columns() -> [Constraint; 9] {
    [
        Constraint::Min(22),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
    ]
}

fn render_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(60), Constraint::Length(44)])
        .split(area);

    let block = Block::default().title("Players (per game)").borders(Borders::ALL);
    let inner = block.inner(columns[0]);
    frame.render_widget(block, columns[0]);

    let rows = state.player_rows();
    if let Some(msg) = unavailable_message(state, state.players_error(), rows.is_empty()) {
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
    } else {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);
        let widths = player_columns();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        render_row(
            frame,
            sections[0],
            &widths,
            &["Player", "Team", "Pos", "G", "PTS", "AST", "TRB", "STL", "BLK"],
            bold,
        );
        let list_area = sections[1];
        let (start, end) = visible_range(state.selected, rows.len(), list_area.height as usize);
        for (i, idx) in (start..end).enumerate() {
            let p = rows[idx];
            let style = if idx == state.selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let cells = [
                p.player.clone(),
                p.team.clone(),
                p.position.clone(),
                opt_text(p.games_played.map(|g| g.to_string())),
                format!("{:.1}", p.points),
                format!("{:.1}", p.assists),
                format!("{:.1}", p.rebounds),
                opt_text(p.steals.map(|v| format!("{v:.1}"))),
                opt_text(p.blocks.map(|v| format!("{v:.1}"))),
            ];
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            render_row(frame, row_rect(list_area, i), &widths, &cells, style);
        }
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(14), Constraint::Min(1)])
        .split(columns[1]);

    let impact = Paragraph::new(impact_text(state))
        .block(Block::default().title("Impact (G >= 65)").borders(Borders::ALL));
    frame.render_widget(impact, right[0]);

    let leaders = Paragraph::new(stat_leaders_text(state))
        .block(Block::default().title("Stat Leaders").borders(Borders::ALL));
    frame.render_widget(leaders, right[1]);
}

fn impact_text(state: &AppState) -> String {
    let w = state.weights;
    let mut lines = vec![format!(
        "PTS x{:.1}  AST x{:.1}  TRB x{:.1}",
        w.points, w.assists, w.rebounds
    )];
    let ranked = state.impact();
    if ranked.is_empty() {
        lines.push("No qualified players".to_string());
    }
    for (i, entry) in ranked.iter().enumerate() {
        lines.push(format!(
            "{:>2} {:<26} {:>7.2}",
            i + 1,
            truncate(&entry.player, 26),
            entry.impact_score
        ));
    }
    lines.join("\n")
}

fn stat_leaders_text(state: &AppState) -> String {
    let players = state.players();
    if players.is_empty() {
        return "No data".to_string();
    }
    let mut lines = Vec::new();
    for stat in [PlayerSort::Points, PlayerSort::Assists, PlayerSort::Rebounds] {
        lines.push(format!("Top {}", stat.label()));
        for p in views::stat_leaders(players, stat, 3) {
            lines.push(format!(
                "  {:<28} {:>5.1}",
                truncate(&p.player, 28),
                stat.value(p)
            ));
        }
    }
    lines.join("\n")
}

fn render_playoffs(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);

    for (conference, slot) in [(Conference::East, left[0]), (Conference::West, left[1])] {
        let picture = Paragraph::new(playoff_picture_text(state, conference)).block(
            Block::default()
                .title(format!("{} Top 8", conference.short()))
                .borders(Borders::ALL),
        );
        frame.render_widget(picture, slot);
    }

    let bracket = Paragraph::new(bracket_text(state)).block(
        Block::default()
            .title(format!(
                "Bracket ({})",
                playoff_mode_label(state.playoff_mode)
            ))
            .borders(Borders::ALL),
    );
    frame.render_widget(bracket, columns[1]);
}

fn playoff_picture_text(state: &AppState, conference: Conference) -> String {
    let picture = views::playoff_picture(state.records(), conference);
    if picture.is_empty() {
        return unavailable_message(state, state.standings_error(), true)
            .unwrap_or_else(|| "No data".to_string());
    }
    let mut lines = vec![format!(
        "{:>2} {:<24} {:>3} {:>3} {:>6} {:>6}",
        "#", "Team", "W", "L", "Win%", "Diff"
    )];
    for (i, r) in picture.iter().enumerate() {
        lines.push(format!(
            "{:>2} {:<24} {:>3} {:>3} {:>6.3} {:>+6.1}",
            i + 1,
            truncate(&r.team, 24),
            r.wins,
            r.losses,
            r.win_pct,
            r.point_diff
        ));
    }
    lines.join("\n")
}

fn bracket_text(state: &AppState) -> String {
    let Some(bracket) = &state.bracket else {
        return match &state.bracket_error {
            Some(err) => format!("Bracket unavailable: {err}"),
            None => "Waiting for standings".to_string(),
        };
    };

    let mut lines = Vec::new();
    if let Some(champion) = bracket.champion() {
        lines.push(format!(
            "Champion: ({}) {} [{}]",
            champion.seed,
            champion.name(),
            champion.team.conference.short()
        ));
    } else {
        lines.push(bracket.stage().to_string());
        for (idx, (conference, m)) in bracket.current_matchups().into_iter().enumerate() {
            let marker = if idx == state.selected { ">" } else { " " };
            let conf = conference.map(|c| c.short()).unwrap_or("Final");
            let pick = state
                .manual_pick(bracket.stage(), m)
                .map(|name| format!("  -> {name}"))
                .unwrap_or_default();
            lines.push(format!(
                "{marker} {conf:<5} ({}) {} vs ({}) {}  {:.0}%{pick}",
                m.top.seed,
                m.top.name(),
                m.bottom.seed,
                m.bottom.name(),
                m.top_win_probability() * 100.0,
            ));
        }
    }

    if !bracket.history().is_empty() {
        lines.push(String::new());
        lines.push("Results".to_string());
        for round in bracket.history() {
            let conf = round.conference.map(|c| c.short()).unwrap_or("Final");
            lines.push(format!(
                "  {} {conf}: {}",
                round.stage,
                round.winners.join(", ")
            ));
        }
    }
    lines.join("\n")
}

fn render_schedule(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Today's Games").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.schedule.is_empty() {
        let msg = if state.schedule_loading {
            "Loading schedule...".to_string()
        } else if let Some(err) = &state.schedule_error {
            format!("Schedule unavailable: {err}")
        } else {
            "No games found for today".to_string()
        };
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let widths = [
        Constraint::Min(30),
        Constraint::Length(14),
        Constraint::Length(16),
    ];
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    render_row(
        frame,
        sections[0],
        &widths,
        &["Matchup", "Time", "TV"],
        Style::default().add_modifier(Modifier::BOLD),
    );
    let list_area = sections[1];
    let (start, end) = visible_range(
        state.selected,
        state.schedule.len(),
        list_area.height as usize,
    );
    for (i, idx) in (start..end).enumerate() {
        let game = &state.schedule[idx];
        let style = if idx == state.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        render_row(
            frame,
            row_rect(list_area, i),
            &widths,
            &[game.matchup.as_str(), game.time.as_str(), game.tv.as_str()],
            style,
        );
    }
}

fn row_rect(area: Rect, offset: usize) -> Rect {
    Rect {
        x: area.x,
        y: area.y + offset as u16,
        width: area.width,
        height: 1,
    }
}

fn render_row(frame: &mut Frame, area: Rect, widths: &[Constraint], cells: &[&str], style: Style) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.to_vec())
        .split(area);
    for (col, text) in cols.iter().zip(cells) {
        frame.render_widget(Paragraph::new(text.to_string()).style(style), *col);
    }
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn opt_text(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

fn console_text(state: &AppState, height: u16) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let take = height.saturating_sub(2).max(1) as usize;
    let skip = state.logs.len().saturating_sub(take);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "NBA Terminal - Help",
        "",
        "Global:",
        "  1 2 3 4      Standings / Players / Playoffs / Schedule",
        "  [ / ]        Older / newer season",
        "  j/k or ↑/↓   Move selection",
        "  e            Export current view to CSV",
        "  w            Export workbook (xlsx)",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Standings:",
        "  c            Conference filter",
        "  v / V        Next division / toggle it in the filter",
        "  /            Search team",
        "  t            Quick sort (top/bottom 5 by win%)",
        "  s            Sort column",
        "",
        "Players:",
        "  /            Search player",
        "  s            Sort column",
        "  p/P a/A r/R  Impact weights -/+ 0.1",
        "",
        "Playoffs:",
        "  m            Manual / automatic",
        "  g / G        Play round / play to the end",
        "  h / l        Pick top / bottom team",
        "  x            Reset bracket",
        "",
        "Schedule:",
        "  u            Refresh",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
