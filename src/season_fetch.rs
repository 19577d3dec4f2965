use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::http_cache::{CacheKey, Endpoint, fetch_page_cached};
use crate::http_client::http_client;
use crate::players::{PlayerSeasonRecord, parse_player_stats_html};
use crate::standings::{StandingsTable, parse_standings_html};

/// One season's worth of source data. Each half carries its own failure
/// message so a broken player page never hides the standings, and vice versa.
#[derive(Debug, Clone)]
pub struct SeasonData {
    pub season: u16,
    pub standings: Result<StandingsTable, String>,
    pub players: Result<Vec<PlayerSeasonRecord>, String>,
}

impl SeasonData {
    pub fn standings_records(&self) -> &[crate::standings::TeamSeasonRecord] {
        match &self.standings {
            Ok(table) => &table.records,
            Err(_) => &[],
        }
    }

    pub fn player_records(&self) -> &[PlayerSeasonRecord] {
        match &self.players {
            Ok(players) => players,
            Err(_) => &[],
        }
    }

    pub fn skipped_rows(&self) -> usize {
        self.standings.as_ref().map(|t| t.skipped).unwrap_or(0)
    }

    /// Human-readable failures, one per degraded section.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Err(err) = &self.standings {
            out.push(format!("standings: {err}"));
        }
        if let Err(err) = &self.players {
            out.push(format!("players: {err}"));
        }
        out
    }
}

/// Fetches the standings and per-game pages concurrently. Bodies are memoized
/// per `(endpoint, season)` for the life of the process.
pub fn fetch_season(cfg: &DashboardConfig, season: u16) -> SeasonData {
    let client = match http_client(cfg.http_timeout_secs) {
        Ok(client) => client,
        Err(err) => {
            let msg = format!("{err:#}");
            return SeasonData {
                season,
                standings: Err(msg.clone()),
                players: Err(msg),
            };
        }
    };

    let standings_url = cfg.standings_url(season);
    let per_game_url = cfg.per_game_url(season);
    let (standings, players) = rayon::join(
        || {
            fetch_page_cached(
                client,
                CacheKey::season(Endpoint::Standings, season),
                &standings_url,
            )
            .context("standings request failed")
            .and_then(|body| Ok(parse_standings_html(&body)?))
        },
        || {
            fetch_page_cached(
                client,
                CacheKey::season(Endpoint::PlayerPerGame, season),
                &per_game_url,
            )
            .context("player stats request failed")
            .and_then(|body| Ok(parse_player_stats_html(&body)?))
        },
    );

    SeasonData {
        season,
        standings: standings.map_err(|err| format!("{err:#}")),
        players: players.map_err(|err| format!("{err:#}")),
    }
}

/// Loads saved copies of the two season pages from `dir`, named the way the
/// source names them (`NBA_2024_standings.html`, `NBA_2024_per_game.html`).
pub fn load_season_from_dir(dir: &Path, season: u16) -> SeasonData {
    let standings = read_page(dir, &format!("NBA_{season}_standings.html"))
        .and_then(|body| Ok(parse_standings_html(&body)?));
    let players = read_page(dir, &format!("NBA_{season}_per_game.html"))
        .and_then(|body| Ok(parse_player_stats_html(&body)?));
    SeasonData {
        season,
        standings: standings.map_err(|err| format!("{err:#}")),
        players: players.map_err(|err| format!("{err:#}")),
    }
}

fn read_page(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
}
