use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::DataError;
use crate::html_table::{RawTable, extract_first_table, extract_table_by_id, parse_number};

pub const PER_GAME_TABLE_ID: &str = "per_game_stats";

/// Header label the source re-prints as a data row every few dozen rows.
const HEADER_ARTIFACT: &str = "Player";

/// Columns parsed into typed fields; everything else lands in `extra`.
const TYPED_COLUMNS: [&str; 16] = [
    "Player", "Team", "Tm", "Pos", "Age", "G", "PTS", "AST", "TRB", "STL", "BLK", "TOV", "FG%",
    "3P%", "FT%", "Rk",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeasonRecord {
    pub player: String,
    pub team: String,
    pub position: String,
    pub age: Option<u32>,
    pub games_played: Option<u32>,
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub steals: Option<f64>,
    pub blocks: Option<f64>,
    pub turnovers: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub extra: BTreeMap<String, String>,
}

pub fn parse_player_stats_html(html: &str) -> Result<Vec<PlayerSeasonRecord>, DataError> {
    let table = extract_table_by_id(html, PER_GAME_TABLE_ID)
        .or_else(|| extract_first_table(html))
        .ok_or_else(|| DataError::TableMissing {
            id: PER_GAME_TABLE_ID.to_string(),
        })?;
    let players = clean_player_table(&table);
    if players.is_empty() {
        return Err(DataError::Empty { what: "player" });
    }
    Ok(players)
}

/// Drops repeated header rows and rows without points/assists/rebounds (the
/// source's multi-team aggregate rows), then casts the consumed columns.
pub fn clean_player_table(table: &RawTable) -> Vec<PlayerSeasonRecord> {
    let kept = retain_core_rows(table);
    (0..kept.len())
        .filter_map(|idx| record_from_row(&kept, idx))
        .collect()
}

/// Row-level filter behind `clean_player_table`. Running it on its own output
/// keeps every row.
pub fn retain_core_rows(table: &RawTable) -> RawTable {
    let rows = (0..table.len())
        .filter(|&idx| has_core_stats(table, idx))
        .map(|idx| table.rows[idx].clone())
        .collect();
    RawTable::new(table.headers.clone(), rows)
}

fn has_core_stats(table: &RawTable, idx: usize) -> bool {
    let Some(player) = table.cell(idx, "Player") else {
        return false;
    };
    player != HEADER_ARTIFACT
        && ["PTS", "AST", "TRB"]
            .iter()
            .all(|col| parse_number(table.cell(idx, col)).is_some())
}

fn record_from_row(table: &RawTable, idx: usize) -> Option<PlayerSeasonRecord> {
    let player = table.cell(idx, "Player")?.to_string();
    let points = parse_number(table.cell(idx, "PTS"))?;
    let assists = parse_number(table.cell(idx, "AST"))?;
    let rebounds = parse_number(table.cell(idx, "TRB"))?;

    let team = table
        .column_any(&["Team", "Tm"])
        .and_then(|col| table.rows[idx].get(col))
        .and_then(|c| c.clone())
        .unwrap_or_default();

    let mut extra = BTreeMap::new();
    for (col, header) in table.headers.iter().enumerate() {
        if header.is_empty() || TYPED_COLUMNS.contains(&header.as_str()) {
            continue;
        }
        if let Some(Some(value)) = table.rows[idx].get(col) {
            extra.insert(header.clone(), value.clone());
        }
    }

    Some(PlayerSeasonRecord {
        player,
        team,
        position: table.cell(idx, "Pos").unwrap_or_default().to_string(),
        age: parse_whole(table.cell(idx, "Age")),
        games_played: parse_whole(table.cell(idx, "G")),
        points,
        assists,
        rebounds,
        steals: parse_number(table.cell(idx, "STL")),
        blocks: parse_number(table.cell(idx, "BLK")),
        turnovers: parse_number(table.cell(idx, "TOV")),
        fg_pct: parse_number(table.cell(idx, "FG%")),
        three_pct: parse_number(table.cell(idx, "3P%")),
        ft_pct: parse_number(table.cell(idx, "FT%")),
        extra,
    })
}

fn parse_whole(raw: Option<&str>) -> Option<u32> {
    let value = parse_number(raw)?;
    if value < 0.0 {
        return None;
    }
    Some(value.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        let headers = ["Rk", "Player", "Age", "Team", "Pos", "G", "MP", "3P%", "TRB", "AST", "PTS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows: Vec<Vec<Option<String>>> = vec![
            vec!["1", "Joel Embiid", "29", "PHI", "C", "39", "33.6", ".388", "11.0", "5.6", "34.7"],
            vec!["Rk", "Player", "Age", "Team", "Pos", "G", "MP", "3P%", "TRB", "AST", "PTS"],
            vec!["2", "Traded Guy", "27", "2TM", "SG", "70", "30.1", "", "", "", ""],
            vec!["3", "Zero Threes", "24", "MEM", "C", "66", "20.0", "", "7.5", "1.1", "9.0"],
        ]
        .into_iter()
        .map(|r| {
            r.into_iter()
                .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                .collect()
        })
        .collect();
        RawTable::new(headers, rows)
    }

    #[test]
    fn drops_header_artifacts_and_aggregate_rows() {
        let players = clean_player_table(&table());
        let names: Vec<&str> = players.iter().map(|p| p.player.as_str()).collect();
        assert_eq!(names, vec!["Joel Embiid", "Zero Threes"]);
    }

    #[test]
    fn casts_consumed_columns() {
        let players = clean_player_table(&table());
        let embiid = &players[0];
        assert_eq!(embiid.points, 34.7);
        assert_eq!(embiid.assists, 5.6);
        assert_eq!(embiid.rebounds, 11.0);
        assert_eq!(embiid.games_played, Some(39));
        assert_eq!(embiid.three_pct, Some(0.388));
        assert_eq!(embiid.team, "PHI");
        assert_eq!(embiid.extra.get("MP").map(String::as_str), Some("33.6"));
        assert!(!embiid.extra.contains_key("PTS"));

        assert_eq!(players[1].three_pct, None);
    }

    #[test]
    fn cleaning_a_cleaned_table_keeps_every_row() {
        let once = retain_core_rows(&table());
        assert_eq!(once.len(), 2);
        let twice = retain_core_rows(&once);
        assert_eq!(once, twice);

        let first = clean_player_table(&table());
        let second = clean_player_table(&once);
        assert_eq!(first, second);
    }

    #[test]
    fn league_average_row_without_player_is_dropped() {
        let mut t = table();
        let mut average = t.rows[0].clone();
        average[1] = None;
        t.rows.push(average);
        assert_eq!(retain_core_rows(&t).len(), 2);
    }

    #[test]
    fn legacy_tm_header_is_accepted() {
        let mut t = table();
        t.rename_column("Team", "Tm");
        let players = clean_player_table(&t);
        assert_eq!(players[0].team, "PHI");
    }
}
