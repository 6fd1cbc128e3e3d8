//! RAWG catalog client over blocking HTTP.

use crate::metadata::{is_searchable, GameMetadataProvider, MetadataError, MetadataResult};
use crate::model::game::GameMetadata;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const RAWG_BASE_URL: &str = "https://api.rawg.io/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Oldest responses are evicted first once the cache is full.
pub const MAX_CACHED_RESPONSES: usize = 64;

#[derive(Debug, Default)]
struct ResponseCache {
    entries: HashMap<String, Value>,
    order: VecDeque<String>,
}

impl ResponseCache {
    fn insert(&mut self, key: String, value: Value) {
        if self.entries.insert(key.clone(), value).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > MAX_CACHED_RESPONSES {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

/// Catalog client with a bounded in-memory response cache keyed by request URL.
pub struct RawgClient {
    base_url: String,
    api_key: String,
    client: Client,
    cache: Mutex<ResponseCache>,
}

impl RawgClient {
    pub fn new(api_key: &str) -> MetadataResult<Self> {
        Self::with_url(RAWG_BASE_URL, api_key)
    }

    pub fn with_url(base_url: &str, api_key: &str) -> MetadataResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(MetadataError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            cache: Mutex::new(ResponseCache::default()),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> MetadataResult<Url> {
        let mut pairs = vec![("key", self.api_key.clone())];
        pairs.extend(params.iter().map(|(name, value)| (*name, value.clone())));
        Url::parse_with_params(&format!("{}{path}", self.base_url), &pairs)
            .map_err(|e| MetadataError::Parse(e.to_string()))
    }

    fn fetch(&self, path: &str, params: &[(&str, String)]) -> MetadataResult<Value> {
        let url = self.url(path, params)?;
        let cache_key = url.to_string();
        if let Some(hit) = self.cached(&cache_key) {
            debug!("event=catalog_fetch module=metadata status=ok cache=hit path={path}");
            return Ok(hit);
        }

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| MetadataError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=catalog_fetch module=metadata status=error path={path} http={}",
                status.as_u16()
            );
            return Err(MetadataError::Http(status.as_u16()));
        }
        let body: Value = response
            .json()
            .map_err(|e| MetadataError::Parse(e.to_string()))?;

        self.remember(cache_key, body.clone());
        info!("event=catalog_fetch module=metadata status=ok cache=miss path={path}");
        Ok(body)
    }

    fn cached(&self, key: &str) -> Option<Value> {
        self.cache.lock().ok()?.entries.get(key).cloned()
    }

    fn remember(&self, key: String, body: Value) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, body);
        }
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.lock().map(|cache| cache.entries.len()).unwrap_or(0)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = ResponseCache::default();
        }
    }
}

impl GameMetadataProvider for RawgClient {
    fn search(&self, query: &str, limit: usize) -> MetadataResult<Vec<GameMetadata>> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }
        let page = self.fetch(
            "/games",
            &[
                ("search", query.trim().to_string()),
                ("page_size", limit.to_string()),
                ("ordering", "-rating".to_string()),
            ],
        )?;
        parse_page(page)
    }

    fn details(&self, id: u64) -> MetadataResult<GameMetadata> {
        parse_game(self.fetch(&format!("/games/{id}"), &[])?)
    }

    fn popular(&self, limit: usize) -> MetadataResult<Vec<GameMetadata>> {
        let page = self.fetch(
            "/games",
            &[
                ("page_size", limit.to_string()),
                ("ordering", "-rating".to_string()),
            ],
        )?;
        parse_page(page)
    }
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    results: Vec<RawGame>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGame {
    id: u64,
    name: String,
    slug: String,
    released: Option<String>,
    background_image: Option<String>,
    rating: Option<f64>,
    rating_top: Option<u32>,
    ratings_count: Option<u32>,
    metacritic: Option<u32>,
    playtime: Option<u32>,
    platforms: Option<Vec<PlatformEntry>>,
    genres: Option<Vec<Named>>,
    stores: Option<Vec<StoreEntry>>,
    tags: Option<Vec<Named>>,
    description_raw: Option<String>,
    description: Option<String>,
    website: Option<String>,
    reddit_url: Option<String>,
    metacritic_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlatformEntry {
    platform: Named,
}

#[derive(Debug, Deserialize)]
struct StoreEntry {
    store: Named,
}

impl From<RawGame> for GameMetadata {
    fn from(raw: RawGame) -> Self {
        let names = |items: Option<Vec<Named>>| {
            items
                .unwrap_or_default()
                .into_iter()
                .map(|item| item.name)
                .collect::<Vec<_>>()
        };
        let description = raw
            .description_raw
            .filter(|text| !text.is_empty())
            .or(raw.description);
        Self {
            id: raw.id,
            name: raw.name,
            slug: raw.slug,
            released: raw.released,
            background_image: raw.background_image,
            rating: raw.rating,
            rating_top: raw.rating_top,
            ratings_count: raw.ratings_count,
            metacritic: raw.metacritic,
            playtime: raw.playtime,
            platforms: raw
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|entry| entry.platform.name)
                .collect(),
            genres: names(raw.genres),
            stores: raw
                .stores
                .unwrap_or_default()
                .into_iter()
                .map(|entry| entry.store.name)
                .collect(),
            tags: names(raw.tags),
            description,
            website: raw.website,
            reddit_url: raw.reddit_url,
            metacritic_url: raw.metacritic_url,
        }
    }
}

fn parse_page(body: Value) -> MetadataResult<Vec<GameMetadata>> {
    let page: RawPage =
        serde_json::from_value(body).map_err(|e| MetadataError::Parse(e.to_string()))?;
    Ok(page.results.into_iter().map(GameMetadata::from).collect())
}

fn parse_game(body: Value) -> MetadataResult<GameMetadata> {
    let game: RawGame =
        serde_json::from_value(body).map_err(|e| MetadataError::Parse(e.to_string()))?;
    Ok(game.into())
}

#[cfg(test)]
mod tests {
    use super::{parse_game, parse_page, RawgClient, MAX_CACHED_RESPONSES};
    use crate::metadata::{GameMetadataProvider, MetadataError};
    use serde_json::json;

    #[test]
    fn maps_nested_catalog_fields() {
        let game = parse_game(json!({
            "id": 3498,
            "name": "Grand Theft Auto V",
            "slug": "grand-theft-auto-v",
            "rating": 4.47,
            "metacritic": 92,
            "platforms": [
                {"platform": {"id": 187, "name": "PlayStation 5"}},
                {"platform": {"id": 4, "name": "PC"}}
            ],
            "genres": [{"name": "Action"}],
            "stores": [{"store": {"name": "Steam"}}],
            "tags": [{"name": "Open World"}],
            "description": "<p>html</p>",
            "description_raw": "plain"
        }))
        .unwrap();
        assert_eq!(game.platforms, vec!["PlayStation 5", "PC"]);
        assert_eq!(game.genres, vec!["Action"]);
        assert_eq!(game.stores, vec!["Steam"]);
        assert_eq!(game.tags, vec!["Open World"]);
        assert_eq!(game.description.as_deref(), Some("plain"));
        assert_eq!(game.metacritic, Some(92));
    }

    #[test]
    fn page_tolerates_null_lists() {
        let games = parse_page(json!({
            "count": 1,
            "results": [{"id": 1, "name": "Hades", "platforms": null, "description": "rogue"}]
        }))
        .unwrap();
        assert_eq!(games.len(), 1);
        assert!(games[0].platforms.is_empty());
        assert_eq!(games[0].description.as_deref(), Some("rogue"));
    }

    #[test]
    fn empty_key_is_rejected_and_short_query_skips_network() {
        assert!(matches!(
            RawgClient::new("  "),
            Err(MetadataError::MissingApiKey)
        ));
        let client = RawgClient::with_url("http://127.0.0.1:9", "test-key").unwrap();
        assert!(client.search("ab", 5).unwrap().is_empty());
        assert_eq!(client.cached_responses(), 0);
    }

    #[test]
    fn response_cache_is_bounded_and_evicts_oldest() {
        let client = RawgClient::with_url("http://127.0.0.1:9", "test-key").unwrap();
        for index in 0..MAX_CACHED_RESPONSES + 5 {
            client.remember(format!("/games/{index}"), json!({"id": index}));
        }
        assert_eq!(client.cached_responses(), MAX_CACHED_RESPONSES);
        assert!(client.cached("/games/0").is_none());
        assert_eq!(
            client.cached(&format!("/games/{}", MAX_CACHED_RESPONSES + 4)),
            Some(json!({"id": MAX_CACHED_RESPONSES + 4}))
        );

        client.remember("/games/10".to_string(), json!({"id": "again"}));
        assert_eq!(client.cached_responses(), MAX_CACHED_RESPONSES);

        client.clear_cache();
        assert_eq!(client.cached_responses(), 0);
    }
}
