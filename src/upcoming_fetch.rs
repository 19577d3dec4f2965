use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::html_table::cell_text;
use crate::http_cache::{CacheKey, Endpoint, fetch_page_cached, global_cache};
use crate::http_client::http_client;

static SCHEDULE_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.ScheduleTable").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingGame {
    pub matchup: String,
    pub time: String,
    pub tv: String,
}

/// `refresh` drops the memoized page first so the request goes out again.
pub fn fetch_upcoming(cfg: &DashboardConfig, refresh: bool) -> Result<Vec<UpcomingGame>> {
    let key = CacheKey::unkeyed(Endpoint::Schedule);
    if refresh {
        global_cache().remove(key);
    }
    let client = http_client(cfg.http_timeout_secs)?;
    let body = fetch_page_cached(client, key, &cfg.schedule_url)
    .context("schedule request failed")?;
    Ok(parse_schedule_html(&body))
}

/// Every schedule table contributes its rows after the first; rows with fewer
/// than three cells (date banners, "no games" notes) are ignored. An empty
/// result just means nothing is scheduled.
pub fn parse_schedule_html(html: &str) -> Vec<UpcomingGame> {
    let doc = Html::parse_document(html);
    let mut games = Vec::new();
    for table in doc.select(&SCHEDULE_TABLE) {
        for row in table.select(&ROW).skip(1) {
            let cols: Vec<String> = row
                .select(&TD)
                .map(|td| cell_text(td).unwrap_or_default())
                .collect();
            if cols.len() < 3 {
                continue;
            }
            games.push(UpcomingGame {
                matchup: cols[0].clone(),
                time: cols[1].clone(),
                tv: cols[2].clone(),
            });
        }
    }
    games
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_after_header() {
        let html = r#"
            <table class="Table ScheduleTable">
              <thead><tr><th>Matchup</th><th>Time</th><th>TV</th></tr></thead>
              <tbody>
                <tr><td>Boston @ Miami</td><td>7:30 PM</td><td>ESPN</td></tr>
                <tr><td colspan="3">Postponed</td></tr>
              </tbody>
            </table>
            <table class="ScheduleTable">
              <tr><td>hdr</td><td>hdr</td><td>hdr</td></tr>
              <tr><td>Denver @ Utah</td><td>9:00 PM</td><td></td></tr>
            </table>"#;
        let games = parse_schedule_html(html);
        assert_eq!(
            games,
            vec![
                UpcomingGame {
                    matchup: "Boston @ Miami".to_string(),
                    time: "7:30 PM".to_string(),
                    tv: "ESPN".to_string(),
                },
                UpcomingGame {
                    matchup: "Denver @ Utah".to_string(),
                    time: "9:00 PM".to_string(),
                    tv: String::new(),
                },
            ]
        );
    }

    #[test]
    fn no_tables_means_no_games() {
        assert!(parse_schedule_html("<html><p>No games</p></html>").is_empty());
    }
}
