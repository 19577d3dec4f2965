use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::time::SystemTime;

use rand::rngs::StdRng;

use crate::bracket::{AutomaticPolicy, Bracket, ManualPolicy, Matchup, Side, Stage};
use crate::config::{DashboardConfig, FIRST_SEASON, LAST_SEASON};
use crate::error::BracketError;
use crate::export;
use crate::player_impact::{ImpactEntry, ImpactWeights, WeightKind, rank_impact};
use crate::players::PlayerSeasonRecord;
use crate::season_fetch::SeasonData;
use crate::standings::{Conference, TeamSeasonRecord};
use crate::upcoming_fetch::UpcomingGame;
use crate::views::{self, PlayerQuery, QuickSort, StandingsLeaders, StandingsQuery, StandingsSort};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Standings,
    Players,
    Playoffs,
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayoffMode {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConferenceFilter {
    #[default]
    All,
    East,
    West,
}

impl ConferenceFilter {
    pub fn cycle(self) -> Self {
        match self {
            ConferenceFilter::All => ConferenceFilter::East,
            ConferenceFilter::East => ConferenceFilter::West,
            ConferenceFilter::West => ConferenceFilter::All,
        }
    }

    pub fn conferences(self) -> Vec<Conference> {
        match self {
            ConferenceFilter::All => Conference::ALL.to_vec(),
            ConferenceFilter::East => vec![Conference::East],
            ConferenceFilter::West => vec![Conference::West],
        }
    }
}

pub struct AppState {
    pub screen: Screen,
    pub season: u16,
    pub seasons: HashMap<u16, SeasonData>,
    pub seasons_loaded_at: HashMap<u16, SystemTime>,
    pub loading: HashSet<u16>,
    pub conference_filter: ConferenceFilter,
    pub division_filter: Vec<String>,
    pub division_cursor: usize,
    pub team_search: String,
    pub quick: QuickSort,
    pub standings_sort: StandingsSort,
    pub player_query: PlayerQuery,
    pub search_active: bool,
    pub weights: ImpactWeights,
    pub playoff_mode: PlayoffMode,
    pub bracket: Option<Bracket>,
    pub bracket_error: Option<String>,
    pub manual: ManualPolicy,
    pub automatic: AutomaticPolicy<StdRng>,
    pub schedule: Vec<UpcomingGame>,
    pub schedule_error: Option<String>,
    pub schedule_loading: bool,
    pub schedule_cached_at: Option<SystemTime>,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export_dir: PathBuf,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(cfg: &DashboardConfig) -> Self {
        Self {
            screen: Screen::Standings,
            season: cfg.initial_season,
            seasons: HashMap::new(),
            seasons_loaded_at: HashMap::new(),
            loading: HashSet::new(),
            conference_filter: ConferenceFilter::All,
            division_filter: Vec::new(),
            division_cursor: 0,
            team_search: String::new(),
            quick: QuickSort::None,
            standings_sort: StandingsSort::Wins,
            player_query: PlayerQuery::default(),
            search_active: false,
            weights: ImpactWeights::default(),
            playoff_mode: PlayoffMode::Automatic,
            bracket: None,
            bracket_error: None,
            manual: ManualPolicy::new(),
            automatic: AutomaticPolicy::from_entropy(),
            schedule: Vec::new(),
            schedule_error: None,
            schedule_loading: false,
            schedule_cached_at: None,
            selected: 0,
            logs: VecDeque::new(),
            help_overlay: false,
            export_dir: cfg.export_dir.clone(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn season_data(&self) -> Option<&SeasonData> {
        self.seasons.get(&self.season)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.contains(&self.season)
    }

    pub fn records(&self) -> &[TeamSeasonRecord] {
        self.season_data()
            .map(SeasonData::standings_records)
            .unwrap_or(&[])
    }

    pub fn players(&self) -> &[PlayerSeasonRecord] {
        self.season_data()
            .map(SeasonData::player_records)
            .unwrap_or(&[])
    }

    pub fn standings_error(&self) -> Option<&str> {
        self.season_data()
            .and_then(|d| d.standings.as_ref().err())
            .map(String::as_str)
    }

    pub fn players_error(&self) -> Option<&str> {
        self.season_data()
            .and_then(|d| d.players.as_ref().err())
            .map(String::as_str)
    }

    pub fn standings_query(&self) -> StandingsQuery {
        StandingsQuery {
            conferences: self.conference_filter.conferences(),
            divisions: self.division_filter.clone(),
            search: self.team_search.clone(),
            quick: self.quick,
            sort: self.standings_sort,
        }
    }

    pub fn standings_rows(&self) -> Vec<&TeamSeasonRecord> {
        views::standings_view(self.records(), &self.standings_query())
    }

    /// League-wide leaders; the standings filters do not apply.
    pub fn standings_leaders(&self) -> Option<StandingsLeaders> {
        views::leaders(self.records().iter())
    }

    pub fn player_rows(&self) -> Vec<&PlayerSeasonRecord> {
        views::player_view(self.players(), &self.player_query)
    }

    pub fn impact(&self) -> Vec<ImpactEntry> {
        rank_impact(self.players(), self.weights)
    }

    /// Divisions offered by the `v` filter: those of the selected conferences.
    pub fn division_choices(&self) -> Vec<String> {
        let conferences = self.conference_filter.conferences();
        let in_scope: Vec<TeamSeasonRecord> = self
            .records()
            .iter()
            .filter(|r| conferences.contains(&r.conference))
            .cloned()
            .collect();
        views::divisions(&in_scope)
    }

    pub fn cycle_conference(&mut self) {
        self.conference_filter = self.conference_filter.cycle();
        let choices = self.division_choices();
        self.division_filter.retain(|d| choices.contains(d));
        self.division_cursor = 0;
        self.selected = 0;
    }

    /// Division under the `v` cursor.
    pub fn cursor_division(&self) -> Option<String> {
        self.division_choices().get(self.division_cursor).cloned()
    }

    /// Moves the division cursor, wrapping after the last division.
    pub fn next_division(&mut self) {
        let total = self.division_choices().len();
        self.division_cursor = if total == 0 {
            0
        } else {
            (self.division_cursor + 1) % total
        };
    }

    /// Adds or removes the division under the cursor. An empty selection means
    /// every division.
    pub fn toggle_division(&mut self) {
        let Some(division) = self.cursor_division() else {
            return;
        };
        if let Some(idx) = self.division_filter.iter().position(|d| *d == division) {
            self.division_filter.remove(idx);
        } else {
            self.division_filter.push(division);
        }
        self.selected = 0;
    }

    pub fn cycle_quick_sort(&mut self) {
        self.quick = self.quick.cycle();
        self.selected = 0;
    }

    pub fn cycle_sort(&mut self) {
        match self.screen {
            Screen::Players => self.player_query.sort = self.player_query.sort.cycle(),
            _ => self.standings_sort = self.standings_sort.cycle(),
        }
        self.selected = 0;
    }

    pub fn search_text(&self) -> &str {
        match self.screen {
            Screen::Players => &self.player_query.search,
            _ => &self.team_search,
        }
    }

    pub fn begin_search(&mut self) {
        if matches!(self.screen, Screen::Standings | Screen::Players) {
            self.search_active = true;
        }
    }

    pub fn end_search(&mut self, keep: bool) {
        self.search_active = false;
        if !keep {
            self.search_mut().clear();
        }
        self.selected = 0;
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search_mut().push(ch);
        self.selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search_mut().pop();
        self.selected = 0;
    }

    fn search_mut(&mut self) -> &mut String {
        match self.screen {
            Screen::Players => &mut self.player_query.search,
            _ => &mut self.team_search,
        }
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.selected = 0;
            self.search_active = false;
        }
    }

    fn row_count(&self) -> usize {
        match self.screen {
            Screen::Standings => self.standings_rows().len(),
            Screen::Players => self.player_rows().len(),
            Screen::Playoffs => self
                .bracket
                .as_ref()
                .map(|b| b.current_matchups().len())
                .unwrap_or(0),
            Screen::Schedule => self.schedule.len(),
        }
    }

    pub fn select_next(&mut self) {
        let total = self.row_count();
        if total == 0 {
            self.selected = 0;
        } else {
            self.selected = (self.selected + 1).min(total - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Moves to an older (`-1`) or newer (`+1`) season. Returns the season if
    /// it still has to be fetched.
    pub fn step_season(&mut self, delta: i32) -> Option<u16> {
        let next = (self.season as i32 + delta).clamp(FIRST_SEASON as i32, LAST_SEASON as i32) as u16;
        if next == self.season {
            return None;
        }
        self.season = next;
        self.selected = 0;
        self.division_filter.clear();
        self.division_cursor = 0;
        self.reset_bracket();
        self.needs_load(next).then_some(next)
    }

    pub fn needs_load(&self, season: u16) -> bool {
        !self.seasons.contains_key(&season) && !self.loading.contains(&season)
    }

    pub fn mark_loading(&mut self, season: u16) {
        self.loading.insert(season);
    }

    pub fn nudge_weight(&mut self, kind: WeightKind, steps: i32) {
        self.weights.nudge(kind, steps);
    }

    pub fn toggle_playoff_mode(&mut self) {
        self.playoff_mode = match self.playoff_mode {
            PlayoffMode::Automatic => PlayoffMode::Manual,
            PlayoffMode::Manual => PlayoffMode::Automatic,
        };
        let label = playoff_mode_label(self.playoff_mode);
        self.push_log(format!("[INFO] Playoff mode: {label}"));
    }

    /// Reseeds from the current season's standings and forgets all picks.
    pub fn reset_bracket(&mut self) {
        self.manual.clear();
        if self.screen == Screen::Playoffs {
            self.selected = 0;
        }
        if self.season_data().is_none() {
            self.bracket = None;
            self.bracket_error = None;
            return;
        }
        match Bracket::seed(self.records()) {
            Ok(bracket) => {
                self.bracket = Some(bracket);
                self.bracket_error = None;
            }
            Err(err) => {
                self.bracket = None;
                self.bracket_error = Some(err.to_string());
            }
        }
    }

    pub fn selected_matchup(&self) -> Option<(Stage, Matchup)> {
        let bracket = self.bracket.as_ref()?;
        let (_, matchup) = bracket.current_matchups().get(self.selected).copied()?;
        Some((bracket.stage(), matchup.clone()))
    }

    pub fn manual_pick<'m>(&self, stage: Stage, matchup: &'m Matchup) -> Option<&'m str> {
        self.manual
            .picked(stage, matchup)
            .map(|side| matchup.side(side).name())
    }

    pub fn pick(&mut self, side: Side) {
        if self.playoff_mode != PlayoffMode::Manual {
            self.push_log("[INFO] Switch to manual mode (m) to pick winners");
            return;
        }
        let Some((stage, matchup)) = self.selected_matchup() else {
            self.push_log("[INFO] No matchup selected");
            return;
        };
        self.manual.choose(stage, &matchup, side);
        let winner = matchup.side(side).name().to_string();
        self.push_log(format!("[INFO] Picked {winner} ({stage})"));
        self.select_next();
    }

    /// Plays the current round with the active policy.
    pub fn simulate_round(&mut self) {
        let Some(bracket) = self.bracket.as_mut() else {
            self.log_no_bracket();
            return;
        };
        let result = match self.playoff_mode {
            PlayoffMode::Automatic => bracket.play_round(&mut self.automatic),
            PlayoffMode::Manual => bracket.play_round(&mut self.manual),
        };
        let champion = bracket.champion().map(|c| c.name().to_string());
        self.report_progress(result.map(|stage| (stage, champion)));
    }

    /// Plays rounds until a champion exists or a manual pick is missing.
    pub fn simulate_all(&mut self) {
        let Some(bracket) = self.bracket.as_mut() else {
            self.log_no_bracket();
            return;
        };
        let result = match self.playoff_mode {
            PlayoffMode::Automatic => bracket.run_to_completion(&mut self.automatic),
            PlayoffMode::Manual => bracket.run_to_completion(&mut self.manual),
        }
        .map(|champion| (Stage::Champion, Some(champion.name().to_string())));
        self.report_progress(result);
    }

    fn report_progress(&mut self, result: Result<(Stage, Option<String>), BracketError>) {
        match result {
            Ok((Stage::Champion, Some(champion))) => {
                self.push_log(format!("[INFO] {} champion: {champion}", self.season));
            }
            Ok((stage, _)) => self.push_log(format!("[INFO] Advanced to {stage}")),
            Err(err) => self.push_log(format!("[WARN] {err}")),
        }
        self.selected = 0;
    }

    fn log_no_bracket(&mut self) {
        let msg = match &self.bracket_error {
            Some(err) => format!("[WARN] No bracket: {err}"),
            None => "[INFO] No bracket yet; standings still loading".to_string(),
        };
        self.push_log(msg);
    }

    /// CSV of the view on screen: players on the Players screen, standings
    /// everywhere else.
    pub fn csv_export_command(&mut self) -> Option<ProviderCommand> {
        let (path, text, rows) = if self.screen == Screen::Players {
            let rows = self.player_rows();
            let text = export::players_csv(&rows);
            (
                export::players_csv_path(&self.export_dir, self.season),
                text,
                rows.len(),
            )
        } else {
            let rows = self.standings_rows();
            let text = export::standings_csv(&rows);
            (
                export::standings_csv_path(&self.export_dir, self.season),
                text,
                rows.len(),
            )
        };
        match text {
            Ok(text) => Some(ProviderCommand::ExportCsv { path, text, rows }),
            Err(err) => {
                self.push_log(format!("[ERR] CSV export failed: {err:#}"));
                None
            }
        }
    }

    /// A refresh only forces a refetch once a schedule page is cached.
    pub fn schedule_command(&self, refresh: bool) -> ProviderCommand {
        ProviderCommand::FetchSchedule {
            refresh: refresh && self.schedule_cached_at.is_some(),
        }
    }

    pub fn workbook_export_command(&self) -> ProviderCommand {
        ProviderCommand::ExportWorkbook {
            path: export::workbook_path(&self.export_dir, self.season),
            standings: self.standings_rows().into_iter().cloned().collect(),
            players: self.player_rows().into_iter().cloned().collect(),
            impact: self.impact(),
        }
    }
}

#[derive(Debug)]
pub enum Delta {
    SeasonLoaded(SeasonData),
    SetSchedule(Result<Vec<UpcomingGame>, String>),
    ExportFinished { path: String, rows: usize },
    ExportFailed { path: String, error: String },
    Log(String),
}

#[derive(Debug)]
pub enum ProviderCommand {
    LoadSeason {
        season: u16,
    },
    FetchSchedule {
        refresh: bool,
    },
    ExportCsv {
        path: PathBuf,
        text: String,
        rows: usize,
    },
    ExportWorkbook {
        path: PathBuf,
        standings: Vec<TeamSeasonRecord>,
        players: Vec<PlayerSeasonRecord>,
        impact: Vec<ImpactEntry>,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SeasonLoaded(data) => {
            let season = data.season;
            state.loading.remove(&season);
            for problem in data.problems() {
                state.push_log(format!("[WARN] {season}: {problem}"));
            }
            let skipped = data.skipped_rows();
            if skipped > 0 {
                state.push_log(format!(
                    "[WARN] {season}: skipped {skipped} unreadable standings rows"
                ));
            }
            let teams = data.standings_records().len();
            let players = data.player_records().len();
            state.push_log(format!(
                "[INFO] {season}: {teams} teams, {players} players"
            ));
            state.seasons.insert(season, data);
            state.seasons_loaded_at.insert(season, SystemTime::now());
            if season == state.season {
                state.reset_bracket();
                let total = state.row_count();
                state.selected = state.selected.min(total.saturating_sub(1));
            }
        }
        Delta::SetSchedule(result) => {
            state.schedule_loading = false;
            match result {
                Ok(games) => {
                    if games.is_empty() {
                        state.push_log("[INFO] No games scheduled today");
                    }
                    state.schedule = games;
                    state.schedule_error = None;
                    state.schedule_cached_at = Some(SystemTime::now());
                }
                Err(err) => {
                    state.push_log(format!("[WARN] Schedule fetch error: {err}"));
                    state.schedule_error = Some(err);
                }
            }
        }
        Delta::ExportFinished { path, rows } => {
            state.push_log(format!("[INFO] Exported {rows} rows to {path}"));
        }
        Delta::ExportFailed { path, error } => {
            state.push_log(format!("[ERR] Export to {path} failed: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Standings => "Standings",
        Screen::Players => "Players",
        Screen::Playoffs => "Playoffs",
        Screen::Schedule => "Schedule",
    }
}

pub fn playoff_mode_label(mode: PlayoffMode) -> &'static str {
    match mode {
        PlayoffMode::Automatic => "Automatic",
        PlayoffMode::Manual => "Manual",
    }
}

pub fn conference_filter_label(filter: ConferenceFilter) -> &'static str {
    match filter {
        ConferenceFilter::All => "Both",
        ConferenceFilter::East => "East",
        ConferenceFilter::West => "West",
    }
}
