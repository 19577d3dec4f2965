pub mod bracket;
pub mod config;
pub mod error;
pub mod export;
pub mod feed;
pub mod html_table;
pub mod http_cache;
pub mod http_client;
pub mod player_impact;
pub mod players;
pub mod season_fetch;
pub mod standings;
pub mod state;
pub mod upcoming_fetch;
pub mod views;
pub mod win_prob;
