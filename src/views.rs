use std::cmp::Ordering;

use crate::bracket::{PLAYOFF_TEAMS_PER_CONFERENCE, ranked_conference};
use crate::players::PlayerSeasonRecord;
use crate::standings::{Conference, TeamSeasonRecord};

const QUICK_SORT_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuickSort {
    #[default]
    None,
    Top5,
    Bottom5,
}

impl QuickSort {
    pub fn cycle(self) -> Self {
        match self {
            QuickSort::None => QuickSort::Top5,
            QuickSort::Top5 => QuickSort::Bottom5,
            QuickSort::Bottom5 => QuickSort::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuickSort::None => "All",
            QuickSort::Top5 => "Top 5",
            QuickSort::Bottom5 => "Bottom 5",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandingsSort {
    #[default]
    Wins,
    Losses,
    WinPct,
    PointDiff,
}

impl StandingsSort {
    pub fn cycle(self) -> Self {
        match self {
            StandingsSort::Wins => StandingsSort::Losses,
            StandingsSort::Losses => StandingsSort::WinPct,
            StandingsSort::WinPct => StandingsSort::PointDiff,
            StandingsSort::PointDiff => StandingsSort::Wins,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StandingsSort::Wins => "Wins",
            StandingsSort::Losses => "Losses",
            StandingsSort::WinPct => "Win%",
            StandingsSort::PointDiff => "Point Diff",
        }
    }

    fn key(self, record: &TeamSeasonRecord) -> f64 {
        match self {
            StandingsSort::Wins => record.wins as f64,
            StandingsSort::Losses => record.losses as f64,
            StandingsSort::WinPct => record.win_pct,
            StandingsSort::PointDiff => record.point_diff,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsQuery {
    pub conferences: Vec<Conference>,
    pub divisions: Vec<String>,
    pub search: String,
    pub quick: QuickSort,
    pub sort: StandingsSort,
}

impl Default for StandingsQuery {
    fn default() -> Self {
        Self {
            conferences: Conference::ALL.to_vec(),
            divisions: Vec::new(),
            search: String::new(),
            quick: QuickSort::None,
            sort: StandingsSort::Wins,
        }
    }
}

/// Filtered and sorted standings.
///
/// Order of operations: conference filter, division filter (skipped when no
/// division is selected), team-name search, quick top/bottom 5 by win%, then a
/// stable descending sort of whatever remains by the sort column.
pub fn standings_view<'a>(
    records: &'a [TeamSeasonRecord],
    query: &StandingsQuery,
) -> Vec<&'a TeamSeasonRecord> {
    let needle = query.search.trim().to_lowercase();
    let mut rows: Vec<&TeamSeasonRecord> = records
        .iter()
        .filter(|r| query.conferences.contains(&r.conference))
        .filter(|r| {
            query.divisions.is_empty()
                || r
                    .division
                    .as_ref()
                    .is_some_and(|d| query.divisions.iter().any(|q| q == d))
        })
        .filter(|r| needle.is_empty() || r.team.to_lowercase().contains(&needle))
        .collect();

    match query.quick {
        QuickSort::None => {}
        QuickSort::Top5 => {
            rows.sort_by(|a, b| desc(a.win_pct, b.win_pct));
            rows.truncate(QUICK_SORT_N);
        }
        QuickSort::Bottom5 => {
            rows.sort_by(|a, b| a.win_pct.total_cmp(&b.win_pct));
            rows.truncate(QUICK_SORT_N);
        }
    }

    rows.sort_by(|a, b| desc(query.sort.key(a), query.sort.key(b)));
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsLeaders {
    pub most_wins: TeamSeasonRecord,
    pub best_win_pct: TeamSeasonRecord,
    pub best_point_diff: TeamSeasonRecord,
}

/// Top team per headline metric. Ties go to the team listed first.
pub fn leaders<'a, I>(records: I) -> Option<StandingsLeaders>
where
    I: IntoIterator<Item = &'a TeamSeasonRecord>,
    I::IntoIter: Clone,
{
    let iter = records.into_iter();
    let most_wins = first_max(iter.clone(), |r| r.wins as f64)?;
    let best_win_pct = first_max(iter.clone(), |r| r.win_pct)?;
    let best_point_diff = first_max(iter, |r| r.point_diff)?;
    Some(StandingsLeaders {
        most_wins: most_wins.clone(),
        best_win_pct: best_win_pct.clone(),
        best_point_diff: best_point_diff.clone(),
    })
}

fn first_max<'a, T, F>(items: impl Iterator<Item = &'a T>, key: F) -> Option<&'a T>
where
    F: Fn(&T) -> f64,
    T: 'a,
{
    let mut best: Option<&T> = None;
    for item in items {
        match best {
            Some(current) if key(item) <= key(current) => {}
            _ => best = Some(item),
        }
    }
    best
}

/// Distinct divisions in table order.
pub fn divisions(records: &[TeamSeasonRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for division in records.iter().filter_map(|r| r.division.as_ref()) {
        if !out.contains(division) {
            out.push(division.clone());
        }
    }
    out
}

/// Teams currently holding a playoff spot in one conference, best first.
/// Shorter than eight when the table is short.
pub fn playoff_picture(records: &[TeamSeasonRecord], conference: Conference) -> Vec<&TeamSeasonRecord> {
    let mut ranked = ranked_conference(records, conference);
    ranked.truncate(PLAYOFF_TEAMS_PER_CONFERENCE);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerSort {
    #[default]
    Points,
    Assists,
    Rebounds,
    Steals,
    Blocks,
    Games,
}

impl PlayerSort {
    pub fn cycle(self) -> Self {
        match self {
            PlayerSort::Points => PlayerSort::Assists,
            PlayerSort::Assists => PlayerSort::Rebounds,
            PlayerSort::Rebounds => PlayerSort::Steals,
            PlayerSort::Steals => PlayerSort::Blocks,
            PlayerSort::Blocks => PlayerSort::Games,
            PlayerSort::Games => PlayerSort::Points,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayerSort::Points => "PTS",
            PlayerSort::Assists => "AST",
            PlayerSort::Rebounds => "TRB",
            PlayerSort::Steals => "STL",
            PlayerSort::Blocks => "BLK",
            PlayerSort::Games => "G",
        }
    }

    /// Missing optional stats sort below every real value.
    pub fn value(self, player: &PlayerSeasonRecord) -> f64 {
        let opt = match self {
            PlayerSort::Points => Some(player.points),
            PlayerSort::Assists => Some(player.assists),
            PlayerSort::Rebounds => Some(player.rebounds),
            PlayerSort::Steals => player.steals,
            PlayerSort::Blocks => player.blocks,
            PlayerSort::Games => player.games_played.map(f64::from),
        };
        opt.unwrap_or(f64::NEG_INFINITY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerQuery {
    pub search: String,
    pub sort: PlayerSort,
    pub limit: Option<usize>,
}

impl Default for PlayerQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: PlayerSort::Points,
            limit: None,
        }
    }
}

pub fn player_view<'a>(
    players: &'a [PlayerSeasonRecord],
    query: &PlayerQuery,
) -> Vec<&'a PlayerSeasonRecord> {
    let needle = query.search.trim().to_lowercase();
    let mut rows: Vec<&PlayerSeasonRecord> = players
        .iter()
        .filter(|p| needle.is_empty() || p.player.to_lowercase().contains(&needle))
        .collect();
    rows.sort_by(|a, b| desc(query.sort.value(a), query.sort.value(b)));
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    rows
}

/// Top `n` players for one stat column.
pub fn stat_leaders(
    players: &[PlayerSeasonRecord],
    stat: PlayerSort,
    n: usize,
) -> Vec<&PlayerSeasonRecord> {
    player_view(
        players,
        &PlayerQuery {
            search: String::new(),
            sort: stat,
            limit: Some(n),
        },
    )
}

fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
