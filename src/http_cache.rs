use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT_LANGUAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Standings,
    PlayerPerGame,
    Schedule,
}

/// Memo key. Schedule pages are not season-specific and use `season: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: Endpoint,
    pub season: Option<u16>,
}

impl CacheKey {
    pub fn season(endpoint: Endpoint, season: u16) -> Self {
        Self {
            endpoint,
            season: Some(season),
        }
    }

    pub fn unkeyed(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            season: None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    fetched_at: SystemTime,
}

/// In-memory page memo. Entries live until `clear` or process exit; failed
/// fetches are never stored.
pub struct PageCache {
    entries: Mutex<Option<HashMap<CacheKey, CacheEntry>>>,
}

static GLOBAL: PageCache = PageCache::new();

pub fn global_cache() -> &'static PageCache {
    &GLOBAL
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCache {
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(None),
        }
    }

    pub fn get(&self, key: CacheKey) -> Option<String> {
        let guard = self.entries.lock().expect("page cache lock poisoned");
        guard
            .as_ref()
            .and_then(|map| map.get(&key))
            .map(|entry| entry.body.clone())
    }

    pub fn fetched_at(&self, key: CacheKey) -> Option<SystemTime> {
        let guard = self.entries.lock().expect("page cache lock poisoned");
        guard
            .as_ref()
            .and_then(|map| map.get(&key))
            .map(|entry| entry.fetched_at)
    }

    pub fn insert(&self, key: CacheKey, body: String) {
        let mut guard = self.entries.lock().expect("page cache lock poisoned");
        guard.get_or_insert_with(HashMap::new).insert(
            key,
            CacheEntry {
                body,
                fetched_at: SystemTime::now(),
            },
        );
    }

    /// Returns the memoized body for `key`, calling `fetch` only on a miss.
    /// The lock is not held while `fetch` runs.
    pub fn get_or_fetch<F>(&self, key: CacheKey, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(body) = self.get(key) {
            return Ok(body);
        }
        let body = fetch()?;
        self.insert(key, body.clone());
        Ok(body)
    }

    /// Forgets one page so the next lookup fetches it again.
    pub fn remove(&self, key: CacheKey) -> bool {
        let mut guard = self.entries.lock().expect("page cache lock poisoned");
        guard
            .as_mut()
            .is_some_and(|map| map.remove(&key).is_some())
    }

    pub fn len(&self) -> usize {
        let guard = self.entries.lock().expect("page cache lock poisoned");
        guard.as_ref().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut guard = self.entries.lock().expect("page cache lock poisoned");
        *guard = None;
    }
}

pub fn fetch_page_cached(client: &Client, key: CacheKey, url: &str) -> Result<String> {
    global_cache().get_or_fetch(key, || fetch_page(client, url))
}

fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.8")
        .send()
        .with_context(|| format!("request failed: {url}"))?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {} for {}", status, url));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn second_lookup_is_served_from_memo() {
        let cache = PageCache::new();
        let calls = Cell::new(0);
        let key = CacheKey::season(Endpoint::Standings, 2024);

        let first = cache
            .get_or_fetch(key, || {
                calls.set(calls.get() + 1);
                Ok("<html>a</html>".to_string())
            })
            .unwrap();
        let second = cache
            .get_or_fetch(key, || {
                calls.set(calls.get() + 1);
                Ok("<html>b</html>".to_string())
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert!(cache.fetched_at(key).is_some());
    }

    #[test]
    fn keys_differ_by_season_and_endpoint() {
        let cache = PageCache::new();
        cache.insert(CacheKey::season(Endpoint::Standings, 2024), "s24".into());
        cache.insert(CacheKey::season(Endpoint::Standings, 2023), "s23".into());
        cache.insert(CacheKey::season(Endpoint::PlayerPerGame, 2024), "p24".into());
        cache.insert(CacheKey::unkeyed(Endpoint::Schedule), "sched".into());

        assert_eq!(cache.len(), 4);
        assert_eq!(
            cache.get(CacheKey::season(Endpoint::Standings, 2023)).as_deref(),
            Some("s23")
        );
        assert!(cache.get(CacheKey::season(Endpoint::Schedule, 2024)).is_none());
    }

    #[test]
    fn removed_page_is_fetched_again() {
        let cache = PageCache::new();
        let key = CacheKey::unkeyed(Endpoint::Schedule);
        cache.insert(key, "old".into());
        assert!(cache.remove(key));
        assert!(!cache.remove(key));

        let body = cache.get_or_fetch(key, || Ok("new".to_string())).unwrap();
        assert_eq!(body, "new");
        assert_eq!(cache.get(CacheKey::season(Endpoint::Standings, 2024)), None);
    }

    #[test]
    fn failed_fetch_is_not_memoized() {
        let cache = PageCache::new();
        let key = CacheKey::unkeyed(Endpoint::Schedule);
        let err = cache.get_or_fetch(key, || Err(anyhow::anyhow!("offline")));
        assert!(err.is_err());
        assert!(cache.get(key).is_none());

        let ok = cache.get_or_fetch(key, || Ok("later".to_string())).unwrap();
        assert_eq!(ok, "later");
    }

    #[test]
    fn clear_invalidates_everything() {
        let cache = PageCache::new();
        cache.insert(CacheKey::unkeyed(Endpoint::Schedule), "x".into());
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
