use std::fmt;

use serde::Serialize;

use crate::error::DataError;
use crate::html_table::{RawTable, extract_table_by_id, normalize_ws, parse_number};

pub const COL_TEAM: &str = "Team";
pub const COL_WINS: &str = "Wins";
pub const COL_LOSSES: &str = "Losses";
pub const COL_WIN_PCT: &str = "Win%";
pub const COL_GAMES_BEHIND: &str = "Games Behind";
pub const COL_POINTS_FOR: &str = "Points For";
pub const COL_POINTS_AGAINST: &str = "Points Against";

const HEADER_RENAMES: [(&str, &str); 6] = [
    ("W", COL_WINS),
    ("L", COL_LOSSES),
    ("W/L%", COL_WIN_PCT),
    ("GB", COL_GAMES_BEHIND),
    ("PS/G", COL_POINTS_FOR),
    ("PA/G", COL_POINTS_AGAINST),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Conference {
    East,
    West,
}

impl Conference {
    pub const ALL: [Conference; 2] = [Conference::East, Conference::West];

    pub fn label(self) -> &'static str {
        match self {
            Conference::East => "Eastern Conference",
            Conference::West => "Western Conference",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Conference::East => "East",
            Conference::West => "West",
        }
    }

    /// Element id of the conference table on the standings page.
    pub fn table_id(self) -> &'static str {
        match self {
            Conference::East => "confs_standings_E",
            Conference::West => "confs_standings_W",
        }
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeasonRecord {
    pub team: String,
    pub conference: Conference,
    pub division: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: f64,
    pub games_behind: Option<f64>,
    pub points_for: f64,
    pub points_against: f64,
    pub point_diff: f64,
}

impl TeamSeasonRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn computed_win_pct(&self) -> f64 {
        win_pct(self.wins, self.losses)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandingsTable {
    pub records: Vec<TeamSeasonRecord>,
    /// Rows dropped because a required numeric cell was unreadable.
    pub skipped: usize,
}

pub fn parse_standings_html(html: &str) -> Result<StandingsTable, DataError> {
    let east = conference_table(html, Conference::East)?;
    let west = conference_table(html, Conference::West)?;
    let table = normalize_standings(east, west);
    if table.records.is_empty() {
        return Err(DataError::Empty { what: "standings" });
    }
    Ok(table)
}

fn conference_table(html: &str, conference: Conference) -> Result<RawTable, DataError> {
    extract_table_by_id(html, conference.table_id()).ok_or_else(|| DataError::TableMissing {
        id: conference.table_id().to_string(),
    })
}

/// Combines the two conference tables, East first, each row tagged with its
/// conference.
pub fn normalize_standings(east: RawTable, west: RawTable) -> StandingsTable {
    let mut out = StandingsTable::default();
    normalize_conference(east, Conference::East, &mut out);
    normalize_conference(west, Conference::West, &mut out);
    out
}

fn normalize_conference(mut table: RawTable, conference: Conference, out: &mut StandingsTable) {
    if let Some(first) = table.headers.first_mut() {
        *first = COL_TEAM.to_string();
    }
    for (from, to) in HEADER_RENAMES {
        table.rename_column(from, to);
    }

    for idx in 0..table.len() {
        match record_from_row(&table, idx, conference) {
            Some(record) => out.records.push(record),
            None => out.skipped += 1,
        }
    }
}

fn record_from_row(table: &RawTable, idx: usize, conference: Conference) -> Option<TeamSeasonRecord> {
    let label = table.rows.get(idx)?.first()?.as_deref()?;
    let (team, division) = split_team_label(label);
    if team.is_empty() {
        return None;
    }

    let wins = parse_count(table.cell(idx, COL_WINS))?;
    let losses = parse_count(table.cell(idx, COL_LOSSES))?;
    let points_for = parse_number(table.cell(idx, COL_POINTS_FOR))?;
    let points_against = parse_number(table.cell(idx, COL_POINTS_AGAINST))?;
    let win_pct = parse_number(table.cell(idx, COL_WIN_PCT))
        .filter(|p| (0.0..=1.0).contains(p))
        .unwrap_or_else(|| win_pct(wins, losses));
    let games_behind = parse_number(table.cell(idx, COL_GAMES_BEHIND));

    Some(TeamSeasonRecord {
        team,
        conference,
        division,
        wins,
        losses,
        win_pct,
        games_behind,
        points_for,
        points_against,
        point_diff: points_for - points_against,
    })
}

/// Splits `"Boston Celtics* (Atlantic)"` into `("Boston Celtics", Some("Atlantic"))`.
/// Asterisks mark playoff/notes annotations and are dropped.
pub fn split_team_label(raw: &str) -> (String, Option<String>) {
    let cleaned = raw.replace('*', "");

    let division = cleaned.find('(').and_then(|open| {
        let rest = &cleaned[open + 1..];
        let close = rest.find(')')?;
        let token = rest[..close].trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    });

    let name = match (cleaned.find('('), cleaned.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            format!("{}{}", &cleaned[..open], &cleaned[close + 1..])
        }
        _ => cleaned.clone(),
    };

    (normalize_ws(&name), division)
}

pub fn win_pct(wins: u32, losses: u32) -> f64 {
    let games = wins + losses;
    if games == 0 {
        return 0.0;
    }
    wins as f64 / games as f64
}

fn parse_count(raw: Option<&str>) -> Option<u32> {
    let value = parse_number(raw)?;
    if value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    Some(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(cells: &[&str]) -> Vec<Option<String>> {
        cells
            .iter()
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect()
    }

    fn conf_table(label: &str, rows: &[&[&str]]) -> RawTable {
        let headers = [label, "W", "L", "W/L%", "GB", "PS/G", "PA/G", "SRS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        RawTable::new(headers, rows.iter().map(|r| raw_row(r)).collect())
    }

    #[test]
    fn label_with_asterisk_and_division() {
        let (name, div) = split_team_label("Boston Celtics* (Atlantic)");
        assert_eq!(name, "Boston Celtics");
        assert_eq!(div.as_deref(), Some("Atlantic"));
    }

    #[test]
    fn label_without_annotations() {
        let (name, div) = split_team_label("Miami Heat");
        assert_eq!(name, "Miami Heat");
        assert_eq!(div, None);
    }

    #[test]
    fn label_with_seed_token_and_nbsp() {
        let (name, div) = split_team_label("Denver Nuggets*\u{a0}(2)");
        assert_eq!(name, "Denver Nuggets");
        assert_eq!(div.as_deref(), Some("2"));
    }

    #[test]
    fn normalizes_and_tags_conferences() {
        let east = conf_table(
            "Eastern Conference",
            &[
                &["Boston Celtics* (1)", "64", "18", ".780", "—", "120.6", "109.2", "10.75"],
                &["New York Knicks* (2)", "50", "32", ".610", "14.0", "112.8", "108.2", "4.39"],
            ],
        );
        let west = conf_table(
            "Western Conference",
            &[&["Oklahoma City Thunder* (1)", "57", "25", ".695", "—", "120.1", "112.7", "7.28"]],
        );

        let table = normalize_standings(east, west);
        assert_eq!(table.skipped, 0);
        assert_eq!(table.records.len(), 3);

        let celtics = &table.records[0];
        assert_eq!(celtics.team, "Boston Celtics");
        assert_eq!(celtics.conference, Conference::East);
        assert_eq!(celtics.division.as_deref(), Some("1"));
        assert_eq!(celtics.wins, 64);
        assert_eq!(celtics.games_behind, None);
        assert!((celtics.point_diff - 11.4).abs() < 1e-9);

        assert_eq!(table.records[1].games_behind, Some(14.0));
        assert_eq!(table.records[2].conference, Conference::West);

        for r in &table.records {
            assert!((r.computed_win_pct() - r.win_pct).abs() <= 0.001, "{}", r.team);
        }
    }

    #[test]
    fn missing_win_pct_is_computed() {
        let east = conf_table("E", &[&["Team A", "30", "10", "", "", "100", "90", ""]]);
        let table = normalize_standings(east, conf_table("W", &[]));
        assert_eq!(table.records[0].win_pct, 0.75);
    }

    #[test]
    fn unreadable_rows_are_counted_not_fatal() {
        let east = conf_table(
            "E",
            &[
                &["Team A", "x", "10", ".500", "", "100", "90", ""],
                &["Team B", "20", "20", ".500", "", "100", "100", ""],
            ],
        );
        let table = normalize_standings(east, conf_table("W", &[]));
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.skipped, 1);
    }

    #[test]
    fn missing_conference_table_is_data_unavailable() {
        let html = "<html><table id=\"confs_standings_E\"><thead><tr><th>E</th></tr></thead></table></html>";
        let err = parse_standings_html(html).unwrap_err();
        assert_eq!(
            err,
            DataError::TableMissing {
                id: "confs_standings_W".to_string()
            }
        );
    }

    #[test]
    fn zero_games_win_pct_is_zero() {
        assert_eq!(win_pct(0, 0), 0.0);
    }
}
