use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::player_impact::ImpactEntry;
use crate::players::PlayerSeasonRecord;
use crate::standings::TeamSeasonRecord;

pub const STANDINGS_HEADER: [&str; 7] = [
    "Team",
    "Conference",
    "Division",
    "Wins",
    "Losses",
    "Win%",
    "Point Diff",
];

pub const PLAYERS_HEADER: [&str; 9] = [
    "Player", "Team", "Pos", "G", "PTS", "AST", "TRB", "STL", "BLK",
];

pub const IMPACT_HEADER: [&str; 7] = ["Player", "Team", "G", "PTS", "AST", "TRB", "Impact"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub standings: usize,
    pub players: usize,
    pub impact: usize,
}

pub fn standings_csv_path(dir: &Path, season: u16) -> PathBuf {
    dir.join(format!("standings_{season}.csv"))
}

pub fn players_csv_path(dir: &Path, season: u16) -> PathBuf {
    dir.join(format!("players_{season}.csv"))
}

pub fn workbook_path(dir: &Path, season: u16) -> PathBuf {
    dir.join(format!("nba_{season}.xlsx"))
}

/// The filtered standings view as CSV text, rows in view order.
pub fn standings_csv(view: &[&TeamSeasonRecord]) -> Result<String> {
    to_csv(&standings_rows(view))
}

pub fn players_csv(view: &[&PlayerSeasonRecord]) -> Result<String> {
    to_csv(&player_rows(view))
}

pub fn write_csv(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export dir {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed writing {}", path.display()))
}

pub fn export_workbook(
    path: &Path,
    standings: &[&TeamSeasonRecord],
    players: &[&PlayerSeasonRecord],
    impact: &[ImpactEntry],
) -> Result<ExportReport> {
    let standings_rows = standings_rows(standings);
    let player_rows = player_rows(players);
    let impact_rows = impact_rows(impact);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Standings")?;
        write_rows(sheet, &standings_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_rows(sheet, &player_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Impact")?;
        write_rows(sheet, &impact_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        standings: standings_rows.len().saturating_sub(1),
        players: player_rows.len().saturating_sub(1),
        impact: impact_rows.len().saturating_sub(1),
    })
}

fn standings_rows(view: &[&TeamSeasonRecord]) -> Vec<Vec<String>> {
    let mut rows = vec![header(&STANDINGS_HEADER)];
    rows.extend(view.iter().map(|r| {
        vec![
            r.team.clone(),
            r.conference.label().to_string(),
            r.division.clone().unwrap_or_default(),
            r.wins.to_string(),
            r.losses.to_string(),
            format!("{:.3}", r.win_pct),
            format!("{:.1}", r.point_diff),
        ]
    }));
    rows
}

fn player_rows(view: &[&PlayerSeasonRecord]) -> Vec<Vec<String>> {
    let mut rows = vec![header(&PLAYERS_HEADER)];
    rows.extend(view.iter().map(|p| {
        vec![
            p.player.clone(),
            p.team.clone(),
            p.position.clone(),
            opt_to_string(p.games_played),
            format!("{:.1}", p.points),
            format!("{:.1}", p.assists),
            format!("{:.1}", p.rebounds),
            opt_stat(p.steals),
            opt_stat(p.blocks),
        ]
    }));
    rows
}

fn impact_rows(entries: &[ImpactEntry]) -> Vec<Vec<String>> {
    let mut rows = vec![header(&IMPACT_HEADER)];
    rows.extend(entries.iter().map(|e| {
        vec![
            e.player.clone(),
            e.team.clone(),
            e.games_played.to_string(),
            format!("{:.1}", e.points),
            format!("{:.1}", e.assists),
            format!("{:.1}", e.rebounds),
            format!("{:.2}", e.impact_score),
        ]
    }));
    rows
}

fn to_csv(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).context("write csv record")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("flush csv: {}", err.error()))?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_stat(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}
