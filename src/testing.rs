//! Scripted in-memory catalog for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::{CatalogClient, DetailIncludes, DiscoverQuery, ListEndpoint};
use crate::media::{
    ApiError, Genre, MediaType, PersonHit, RawCatalogItem, Translation, Video,
    WatchProviderRegions,
};

pub fn raw(value: Value) -> RawCatalogItem {
    serde_json::from_value(value).unwrap()
}

pub fn endpoint_key(endpoint: &ListEndpoint) -> String {
    if endpoint.params.is_empty() {
        return endpoint.path.to_string();
    }
    let params: Vec<String> = endpoint
        .params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!("{}?{}", endpoint.path, params.join("&"))
}

#[derive(Default)]
pub struct FakeCatalog {
    listings: Mutex<HashMap<String, Vec<RawCatalogItem>>>,
    discover_results: Mutex<Vec<RawCatalogItem>>,
    details: Mutex<HashMap<String, RawCatalogItem>>,
    translations: Mutex<HashMap<String, Translation>>,
    videos: Mutex<HashMap<(String, Option<String>), Vec<Video>>>,
    credits: Mutex<HashMap<String, Vec<String>>>,
    providers: Mutex<HashMap<String, WatchProviderRegions>>,
    search_results: Mutex<HashMap<String, Vec<RawCatalogItem>>>,
    people: Mutex<HashMap<String, Vec<PersonHit>>>,
    genres: Mutex<HashMap<MediaType, Vec<Genre>>>,
    failures: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    discover_queries: Mutex<Vec<DiscoverQuery>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_listing(&self, endpoint: &ListEndpoint, items: Vec<RawCatalogItem>) {
        self.listings
            .lock()
            .unwrap()
            .insert(endpoint_key(endpoint), items);
    }

    pub fn set_discover(&self, items: Vec<RawCatalogItem>) {
        *self.discover_results.lock().unwrap() = items;
    }

    pub fn set_detail(&self, id: &str, detail: RawCatalogItem) {
        self.details.lock().unwrap().insert(id.to_string(), detail);
    }

    pub fn set_translation(&self, id: &str, translation: Translation) {
        self.translations
            .lock()
            .unwrap()
            .insert(id.to_string(), translation);
    }

    pub fn set_videos(&self, id: &str, locale: Option<&str>, videos: Vec<Video>) {
        self.videos
            .lock()
            .unwrap()
            .insert((id.to_string(), locale.map(String::from)), videos);
    }

    pub fn set_credits(&self, id: &str, names: &[&str]) {
        self.credits.lock().unwrap().insert(
            id.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
    }

    pub fn set_providers(&self, id: &str, regions: WatchProviderRegions) {
        self.providers
            .lock()
            .unwrap()
            .insert(id.to_string(), regions);
    }

    pub fn set_search(&self, query: &str, items: Vec<RawCatalogItem>) {
        self.search_results
            .lock()
            .unwrap()
            .insert(query.to_string(), items);
    }

    pub fn set_people(&self, name: &str, hits: Vec<PersonHit>) {
        self.people.lock().unwrap().insert(name.to_string(), hits);
    }

    pub fn set_genres(&self, media_type: MediaType, genres: Vec<Genre>) {
        self.genres.lock().unwrap().insert(media_type, genres);
    }

    /// Makes every call whose log line starts with `prefix` fail.
    pub fn fail(&self, prefix: &str) {
        self.failures.lock().unwrap().insert(prefix.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn discover_queries(&self) -> Vec<DiscoverQuery> {
        self.discover_queries.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        let failing = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .any(|prefix| call.starts_with(prefix.as_str()));
        self.calls.lock().unwrap().push(call);
        if failing {
            Err(ApiError::Network("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_by_endpoint(
        &self,
        endpoint: &ListEndpoint,
        _locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError> {
        let key = endpoint_key(endpoint);
        self.record(format!("list {}", key))?;
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn discover(
        &self,
        query: &DiscoverQuery,
        _locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError> {
        self.discover_queries.lock().unwrap().push(query.clone());
        self.record(format!("discover {}", query.path()))?;
        Ok(self.discover_results.lock().unwrap().clone())
    }

    async fn item_detail(
        &self,
        id: &str,
        media_type: MediaType,
        _locale: Option<&str>,
        _includes: DetailIncludes,
    ) -> Result<RawCatalogItem, ApiError> {
        self.record(format!("detail {} {}", media_type, id))?;
        self.details
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn translation(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<Option<Translation>, ApiError> {
        self.record(format!("translation {} {}", media_type, id))?;
        Ok(self.translations.lock().unwrap().get(id).cloned())
    }

    async fn videos(
        &self,
        id: &str,
        media_type: MediaType,
        locale: Option<&str>,
    ) -> Result<Vec<Video>, ApiError> {
        self.record(format!(
            "videos {} {} {}",
            media_type,
            id,
            locale.unwrap_or("-")
        ))?;
        Ok(self
            .videos
            .lock()
            .unwrap()
            .get(&(id.to_string(), locale.map(String::from)))
            .cloned()
            .unwrap_or_default())
    }

    async fn credits(
        &self,
        id: &str,
        media_type: MediaType,
        _locale: &str,
    ) -> Result<Vec<String>, ApiError> {
        self.record(format!("credits {} {}", media_type, id))?;
        Ok(self
            .credits
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn watch_providers(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<WatchProviderRegions, ApiError> {
        self.record(format!("providers {} {}", media_type, id))?;
        Ok(self
            .providers
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_multi(
        &self,
        query: &str,
        _locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError> {
        self.record(format!("search {}", query))?;
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_person(&self, name: &str, _locale: &str) -> Result<Vec<PersonHit>, ApiError> {
        self.record(format!("person {}", name))?;
        Ok(self
            .people
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn genres(&self, media_type: MediaType, _locale: &str) -> Result<Vec<Genre>, ApiError> {
        self.record(format!("genres {}", media_type))?;
        Ok(self
            .genres
            .lock()
            .unwrap()
            .get(&media_type)
            .cloned()
            .unwrap_or_default())
    }
}
