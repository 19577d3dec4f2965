use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;

use nba_terminal::bracket::{AutomaticPolicy, Bracket, championship_counts};
use nba_terminal::config::{self, DashboardConfig};
use nba_terminal::season_fetch::{self, SeasonData};
use nba_terminal::standings::Conference;
use nba_terminal::views;

fn main() -> Result<()> {
    config::load_dotenv();
    let cfg = DashboardConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    let season = positional_season(&args)
        .map(config::clamp_season)
        .unwrap_or(cfg.initial_season);
    let seed = flag_value(&args, "--seed")
        .map(|raw| raw.parse::<u64>().context("--seed expects an integer"))
        .transpose()?;
    let runs = flag_value(&args, "--runs")
        .map(|raw| raw.parse::<usize>().context("--runs expects an integer"))
        .transpose()?;
    let fixtures = flag_value(&args, "--fixtures")
        .map(PathBuf::from)
        .or_else(|| cfg.fixtures_dir.clone());
    let json = args.iter().any(|a| a == "--json");

    let data: SeasonData = match &fixtures {
        Some(dir) => season_fetch::load_season_from_dir(dir, season),
        None => season_fetch::fetch_season(&cfg, season),
    };
    let records = data
        .standings
        .as_ref()
        .map_err(|err| anyhow!("standings unavailable for {season}: {err}"))?
        .records
        .clone();

    let mut policy = match seed {
        Some(seed) => AutomaticPolicy::seeded(seed),
        None => AutomaticPolicy::from_entropy(),
    };
    let mut bracket = Bracket::seed(&records)?;
    bracket.run_to_completion(&mut policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bracket)?);
        return Ok(());
    }

    println!("Season {season}");
    for conference in Conference::ALL {
        println!("{}", conference.label());
        for (i, team) in views::playoff_picture(&records, conference).iter().enumerate() {
            println!(
                "  {:>2} {:<26} {:>2}-{:<2} {:.3}",
                i + 1,
                team.team,
                team.wins,
                team.losses,
                team.win_pct
            );
        }
    }

    println!();
    for round in bracket.history() {
        let conf = round.conference.map(|c| c.short()).unwrap_or("Final");
        println!("{} [{conf}]", round.stage);
        for (matchup, winner) in round.matchups.iter().zip(&round.winners) {
            println!(
                "  ({}) {} vs ({}) {} -> {winner}",
                matchup.top.seed,
                matchup.top.name(),
                matchup.bottom.seed,
                matchup.bottom.name()
            );
        }
    }
    if let Some(champion) = bracket.champion() {
        println!("Champion: {}", champion.name());
    }

    if let Some(runs) = runs.filter(|r| *r > 0) {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        let counts = championship_counts(&records, runs, rng)?;
        println!();
        println!("Titles over {runs} runs");
        for (team, titles) in counts {
            println!(
                "  {:<26} {:>6} {:>5.1}%",
                team,
                titles,
                titles as f64 * 100.0 / runs as f64
            );
        }
    }

    Ok(())
}

const VALUE_FLAGS: [&str; 3] = ["--seed", "--runs", "--fixtures"];

fn positional_season(args: &[String]) -> Option<u16> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if let Ok(season) = arg.parse::<u16>() {
            return Some(season);
        }
    }
    None
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
