use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::config::DashboardConfig;
use crate::export;
use crate::season_fetch::{self, SeasonData};
use crate::state::{Delta, ProviderCommand};
use crate::upcoming_fetch;

/// Runs blocking fetches and file writes off the UI thread. Commands are
/// handled one at a time, in the order they were sent.
pub fn spawn_provider(cfg: DashboardConfig, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let delta = handle_command(&cfg, cmd, &tx);
            if tx.send(delta).is_err() {
                break;
            }
        }
    });
}

fn handle_command(cfg: &DashboardConfig, cmd: ProviderCommand, tx: &Sender<Delta>) -> Delta {
    match cmd {
        ProviderCommand::LoadSeason { season } => {
            let _ = tx.send(Delta::Log(format!("[INFO] Fetching {season} season")));
            Delta::SeasonLoaded(load_season(cfg, season))
        }
        ProviderCommand::FetchSchedule { refresh } => {
            let result =
                upcoming_fetch::fetch_upcoming(cfg, refresh).map_err(|err| format!("{err:#}"));
            Delta::SetSchedule(result)
        }
        ProviderCommand::ExportCsv { path, text, rows } => {
            let shown = path.display().to_string();
            match export::write_csv(&path, &text) {
                Ok(()) => Delta::ExportFinished { path: shown, rows },
                Err(err) => Delta::ExportFailed {
                    path: shown,
                    error: format!("{err:#}"),
                },
            }
        }
        ProviderCommand::ExportWorkbook {
            path,
            standings,
            players,
            impact,
        } => {
            let shown = path.display().to_string();
            let standings: Vec<_> = standings.iter().collect();
            let players: Vec<_> = players.iter().collect();
            match export::export_workbook(&path, &standings, &players, &impact) {
                Ok(report) => Delta::ExportFinished {
                    path: shown,
                    rows: report.standings + report.players + report.impact,
                },
                Err(err) => Delta::ExportFailed {
                    path: shown,
                    error: format!("{err:#}"),
                },
            }
        }
    }
}

/// `NBA_FIXTURES_DIR` points the dashboard at saved season pages instead of
/// the network.
fn load_season(cfg: &DashboardConfig, season: u16) -> SeasonData {
    match &cfg.fixtures_dir {
        Some(dir) => season_fetch::load_season_from_dir(dir, season),
        None => season_fetch::fetch_season(cfg, season),
    }
}
