use rand::Rng;

/// Chance that the first team beats the second: `wp1 / (wp1 + wp2)`.
///
/// This is a relative-strength ratio, not a probability calibrated against
/// real results. Two 0.100 teams split 50/50 exactly like two 0.900 teams.
/// When both inputs are zero (or unusable) the game is a coin flip.
pub fn relative_strength(win_pct_first: f64, win_pct_second: f64) -> f64 {
    let a = sanitize(win_pct_first);
    let b = sanitize(win_pct_second);
    let total = a + b;
    if total <= 0.0 {
        return 0.5;
    }
    a / total
}

/// One Bernoulli trial: `true` when the first team wins.
pub fn first_team_wins<R: Rng + ?Sized>(p_first: f64, rng: &mut R) -> bool {
    let p = if p_first.is_nan() {
        0.5
    } else {
        p_first.clamp(0.0, 1.0)
    };
    rng.gen_bool(p)
}

fn sanitize(win_pct: f64) -> f64 {
    if win_pct.is_finite() {
        win_pct.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn equal_strength_is_exactly_half() {
        for wp in [0.001, 0.25, 0.5, 0.731, 0.999] {
            assert_eq!(relative_strength(wp, wp), 0.5);
        }
        assert_eq!(relative_strength(0.0, 0.0), 0.5);
    }

    #[test]
    fn ratio_follows_win_pct() {
        assert!((relative_strength(0.75, 0.25) - 0.75).abs() < 1e-12);
        assert_eq!(relative_strength(0.6, 0.0), 1.0);
        assert_eq!(relative_strength(0.0, 0.6), 0.0);
        assert_eq!(relative_strength(f64::NAN, 0.4), 0.0);
    }

    #[test]
    fn certain_outcomes_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(first_team_wins(1.0, &mut rng));
            assert!(!first_team_wins(0.0, &mut rng));
        }
    }

    #[test]
    fn favourite_wins_more_often() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = relative_strength(0.8, 0.2);
        let wins = (0..10_000).filter(|_| first_team_wins(p, &mut rng)).count();
        assert!((7_600..=8_400).contains(&wins), "wins = {wins}");
    }
}
