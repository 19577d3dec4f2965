use std::fs;
use std::path::PathBuf;

use nba_terminal::players::parse_player_stats_html;
use nba_terminal::standings::{Conference, parse_standings_html};
use nba_terminal::upcoming_fetch::parse_schedule_html;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_both_conferences_including_commented_table() {
    let raw = read_fixture("NBA_2024_standings.html");
    let table = parse_standings_html(&raw).expect("fixture should parse");
    assert_eq!(table.skipped, 0);
    assert_eq!(table.records.len(), 30);

    let east = table
        .records
        .iter()
        .filter(|r| r.conference == Conference::East)
        .count();
    assert_eq!(east, 15);
    assert_eq!(table.records[0].team, "Boston Celtics");
    assert_eq!(table.records[15].team, "Oklahoma City Thunder");
    assert_eq!(table.records[15].conference, Conference::West);
}

#[test]
fn standings_fields_are_normalized() {
    let raw = read_fixture("NBA_2024_standings.html");
    let table = parse_standings_html(&raw).expect("fixture should parse");

    let celtics = &table.records[0];
    assert_eq!(celtics.division.as_deref(), Some("Atlantic"));
    assert_eq!((celtics.wins, celtics.losses), (64, 18));
    assert_eq!(celtics.win_pct, 0.78);
    assert_eq!(celtics.games_behind, None);
    assert!((celtics.point_diff - 11.4).abs() < 1e-9);

    let pistons = table
        .records
        .iter()
        .find(|r| r.team == "Detroit Pistons")
        .expect("pistons row");
    assert_eq!(pistons.games_behind, Some(50.0));
    assert!(pistons.point_diff < 0.0);

    for r in &table.records {
        assert!(!r.team.contains('*'), "{}", r.team);
        assert!(!r.team.contains('('), "{}", r.team);
        assert!((r.points_for - r.points_against - r.point_diff).abs() < 1e-9);
        assert!((r.computed_win_pct() - r.win_pct).abs() <= 0.001, "{}", r.team);
    }
}

#[test]
fn player_fixture_drops_artifacts() {
    let raw = read_fixture("NBA_2024_per_game.html");
    let players = parse_player_stats_html(&raw).expect("fixture should parse");
    assert_eq!(players.len(), 14);
    assert!(players.iter().all(|p| p.player != "Player"));
    assert!(players.iter().all(|p| p.team != "2TM"));

    let jokic = players
        .iter()
        .find(|p| p.player == "Nikola Jokic")
        .expect("jokic row");
    assert_eq!(jokic.team, "DEN");
    assert_eq!(jokic.games_played, Some(79));
    assert_eq!(jokic.rebounds, 12.4);
    assert_eq!(jokic.steals, Some(1.4));
    assert_eq!(jokic.extra.get("GS").map(String::as_str), Some("79"));
}

#[test]
fn schedule_fixture_skips_headers_and_notes() {
    let raw = read_fixture("nba_schedule.html");
    let games = parse_schedule_html(&raw);
    assert_eq!(games.len(), 3);
    assert_eq!(games[0].matchup, "Miami @ Philadelphia");
    assert_eq!(games[0].time, "7:00 PM");
    assert_eq!(games[2].tv, "ESPN");
}

#[test]
fn page_without_tables_is_data_unavailable() {
    let html = "<html><body><p>Rate limited</p></body></html>";
    assert!(parse_standings_html(html).is_err());
    assert!(parse_player_stats_html(html).is_err());
}
