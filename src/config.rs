use std::env;
use std::path::PathBuf;

pub const FIRST_SEASON: u16 = 2020;
pub const LAST_SEASON: u16 = 2025;

const DEFAULT_REFERENCE_BASE: &str = "https://www.basketball-reference.com";
const DEFAULT_SCHEDULE_URL: &str = "https://www.espn.com/nba/schedule";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub reference_base: String,
    pub schedule_url: String,
    pub http_timeout_secs: u64,
    pub export_dir: PathBuf,
    pub initial_season: u16,
    /// Saved season pages to read instead of fetching.
    pub fixtures_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            reference_base: DEFAULT_REFERENCE_BASE.to_string(),
            schedule_url: DEFAULT_SCHEDULE_URL.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            export_dir: PathBuf::from("."),
            initial_season: LAST_SEASON,
            fixtures_dir: None,
        }
    }
}

impl DashboardConfig {
    /// Reads settings from the environment. Call `load_dotenv` first if `.env`
    /// files should be honored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let reference_base = non_empty_var("NBA_REFERENCE_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.reference_base);
        let schedule_url = non_empty_var("NBA_SCHEDULE_URL").unwrap_or(defaults.schedule_url);
        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.http_timeout_secs)
            .clamp(3, 120);
        let export_dir = non_empty_var("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.export_dir);
        let initial_season = env::var("NBA_SEASON")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .map(clamp_season)
            .unwrap_or(defaults.initial_season);
        let fixtures_dir = non_empty_var("NBA_FIXTURES_DIR").map(PathBuf::from);

        Self {
            reference_base,
            schedule_url,
            http_timeout_secs,
            export_dir,
            initial_season,
            fixtures_dir,
        }
    }

    pub fn standings_url(&self, season: u16) -> String {
        format!(
            "{}/leagues/NBA_{season}_standings.html",
            self.reference_base
        )
    }

    pub fn per_game_url(&self, season: u16) -> String {
        format!("{}/leagues/NBA_{season}_per_game.html", self.reference_base)
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn clamp_season(season: u16) -> u16 {
    season.clamp(FIRST_SEASON, LAST_SEASON)
}

/// Seasons offered by the selector, newest first.
pub fn seasons() -> Vec<u16> {
    (FIRST_SEASON..=LAST_SEASON).rev().collect()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
