use serde::Serialize;

use crate::players::PlayerSeasonRecord;

pub const QUALIFYING_GAMES: u32 = 65;
pub const IMPACT_TOP_N: usize = 10;

pub const WEIGHT_MIN: f64 = 0.0;
pub const WEIGHT_MAX: f64 = 2.0;
pub const WEIGHT_STEP: f64 = 0.1;

/// User-tunable coefficients of the impact score. Each weight lives in [0, 2].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactWeights {
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            points: 1.0,
            assists: 1.0,
            rebounds: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    Points,
    Assists,
    Rebounds,
}

impl ImpactWeights {
    pub fn new(points: f64, assists: f64, rebounds: f64) -> Self {
        Self {
            points: clamp_weight(points),
            assists: clamp_weight(assists),
            rebounds: clamp_weight(rebounds),
        }
    }

    pub fn get(&self, kind: WeightKind) -> f64 {
        match kind {
            WeightKind::Points => self.points,
            WeightKind::Assists => self.assists,
            WeightKind::Rebounds => self.rebounds,
        }
    }

    /// Moves one weight by `steps` slider notches, staying on the 0.1 grid.
    pub fn nudge(&mut self, kind: WeightKind, steps: i32) {
        let next = clamp_weight(round_to(self.get(kind) + steps as f64 * WEIGHT_STEP, 1));
        match kind {
            WeightKind::Points => self.points = next,
            WeightKind::Assists => self.assists = next,
            WeightKind::Rebounds => self.rebounds = next,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactEntry {
    pub player: String,
    pub team: String,
    pub games_played: u32,
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub impact_score: f64,
}

pub fn impact_score(player: &PlayerSeasonRecord, weights: ImpactWeights) -> f64 {
    let raw = player.points * weights.points
        + player.assists * weights.assists
        + player.rebounds * weights.rebounds;
    round_to(raw, 2)
}

pub fn is_qualified(player: &PlayerSeasonRecord) -> bool {
    player
        .games_played
        .is_some_and(|g| g >= QUALIFYING_GAMES)
}

/// Qualified players ranked by impact score, best first. `sort_by` is stable,
/// so equal scores keep source order.
pub fn rank_impact(players: &[PlayerSeasonRecord], weights: ImpactWeights) -> Vec<ImpactEntry> {
    let mut ranked: Vec<ImpactEntry> = players
        .iter()
        .filter(|p| is_qualified(p))
        .map(|p| ImpactEntry {
            player: p.player.clone(),
            team: p.team.clone(),
            games_played: p.games_played.unwrap_or_default(),
            points: p.points,
            assists: p.assists,
            rebounds: p.rebounds,
            impact_score: impact_score(p, weights),
        })
        .collect();
    ranked.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
    ranked.truncate(IMPACT_TOP_N);
    ranked
}

fn clamp_weight(w: f64) -> f64 {
    if w.is_nan() {
        return WEIGHT_MIN;
    }
    w.clamp(WEIGHT_MIN, WEIGHT_MAX)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn player(name: &str, games: u32, pts: f64, ast: f64, trb: f64) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            player: name.to_string(),
            team: "TST".to_string(),
            position: "G".to_string(),
            age: None,
            games_played: Some(games),
            points: pts,
            assists: ast,
            rebounds: trb,
            steals: None,
            blocks: None,
            turnovers: None,
            fg_pct: None,
            three_pct: None,
            ft_pct: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn score_is_weighted_sum_rounded() {
        let p = player("A", 70, 25.33, 7.11, 5.07);
        let w = ImpactWeights::new(1.5, 0.7, 0.3);
        // 37.995 + 4.977 + 1.521 = 44.493
        assert_eq!(impact_score(&p, w), 44.49);
    }

    #[test]
    fn raising_any_weight_never_lowers_score() {
        let p = player("A", 70, 21.4, 3.2, 9.9);
        let base = ImpactWeights::new(0.5, 0.5, 0.5);
        for kind in [WeightKind::Points, WeightKind::Assists, WeightKind::Rebounds] {
            let mut w = base;
            let mut prev = impact_score(&p, w);
            for _ in 0..20 {
                w.nudge(kind, 1);
                let next = impact_score(&p, w);
                assert!(next >= prev, "{kind:?}: {next} < {prev}");
                prev = next;
            }
            assert_eq!(w.get(kind), WEIGHT_MAX);
        }
    }

    #[test]
    fn only_qualified_players_rank() {
        let players = vec![
            player("Short", 64, 40.0, 10.0, 10.0),
            player("Long", 65, 10.0, 1.0, 1.0),
            player("Unknown", 0, 50.0, 0.0, 0.0),
        ];
        let ranked = rank_impact(&players, ImpactWeights::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].player, "Long");
    }

    #[test]
    fn ties_keep_source_order_and_top_ten() {
        let mut players: Vec<PlayerSeasonRecord> = (0..12)
            .map(|i| player(&format!("P{i}"), 70, 10.0, 0.0, 0.0))
            .collect();
        players.push(player("Best", 82, 30.0, 0.0, 0.0));
        let ranked = rank_impact(&players, ImpactWeights::default());
        assert_eq!(ranked.len(), IMPACT_TOP_N);
        assert_eq!(ranked[0].player, "Best");
        let rest: Vec<&str> = ranked[1..].iter().map(|e| e.player.as_str()).collect();
        assert_eq!(rest, vec!["P0", "P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8"]);
    }

    #[test]
    fn weights_are_clamped() {
        let w = ImpactWeights::new(-1.0, 3.0, f64::NAN);
        assert_eq!(w, ImpactWeights::new(0.0, 2.0, 0.0));
        let mut w = ImpactWeights::default();
        w.nudge(WeightKind::Assists, -15);
        assert_eq!(w.assists, 0.0);
    }
}
