use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::catalog::{CatalogClient, DetailIncludes, DiscoverQuery, ListEndpoint};
use crate::media::{
    ApiError, CatalogPage, CreditsResponse, Genre, GenreListResponse, MediaType, PersonHit,
    PersonSearchResponse, RawCatalogItem, Translation, TranslationEntry, TranslationsResponse,
    Video, VideosResponse, WatchProviderRegions, WatchProvidersResponse,
};
use crate::settings::AppSettings;

const GENRE_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Copy)]
pub enum ImageSize {
    Poster,
    Backdrop,
    Original,
}

struct CacheEntry<T> {
    data: T,
    created_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            created_at: Instant::now(),
        }
    }

    fn is_valid(&self) -> bool {
        self.created_at.elapsed() < Duration::from_secs(GENRE_CACHE_TTL_SECONDS)
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    image_base_url: String,
    placeholder_image: String,
    language: String,
    http_client: Arc<reqwest::Client>,
    genre_cache: Arc<RwLock<HashMap<String, CacheEntry<Vec<Genre>>>>>,
}

impl TmdbClient {
    pub fn new(api_key: String, base_url: String, language: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            image_base_url: String::from(crate::settings::DEFAULT_IMAGE_BASE_URL),
            placeholder_image: String::from("/placeholder.jpg"),
            language,
            http_client: Arc::new(reqwest::Client::new()),
            genre_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        let language = if settings.language.is_empty() {
            String::from("pt-BR")
        } else {
            settings.language.clone()
        };
        let mut client = Self::new(settings.api_key.clone(), settings.base_url.clone(), language);
        client.image_base_url = settings.image_base_url.trim_end_matches('/').to_string();
        client.placeholder_image = settings.placeholder_image.clone();
        client
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn image_url(&self, path: &str, size: ImageSize) -> String {
        let size_path = match size {
            ImageSize::Poster => "w500",
            ImageSize::Backdrop | ImageSize::Original => "original",
        };
        format!("{}/{}{}", self.image_base_url, size_path, path)
    }

    /// Backdrop URL, or the local placeholder when the item has none.
    pub fn backdrop_url(&self, path: Option<&str>) -> String {
        match path.filter(|p| !p.is_empty()) {
            Some(path) => self.image_url(path, ImageSize::Backdrop),
            None => self.placeholder_image.clone(),
        }
    }

    fn request(
        &self,
        endpoint: &str,
        locale: Option<&str>,
        params: &[(&str, String)],
    ) -> reqwest::RequestBuilder {
        let mut query: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        if let Some(locale) = locale {
            query.push(("language", locale));
        }
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        debug!(endpoint, locale, "catalog request");
        self.http_client
            .get(format!("{}{}", self.base_url, endpoint))
            .query(&query)
    }

    async fn fetch_response(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        match response.status().as_u16() {
            401 => Err(ApiError::Unauthorized),
            404 => Err(ApiError::NotFound),
            429 => Err(ApiError::RateLimit),
            s if s >= 400 => Err(ApiError::Network(format!("HTTP error: {}", s))),
            _ => Ok(response),
        }
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        locale: Option<&str>,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.fetch_response(self.request(endpoint, locale, params))
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn fetch_page(
        &self,
        endpoint: &str,
        locale: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<RawCatalogItem>, ApiError> {
        let page: CatalogPage = self.fetch_json(endpoint, Some(locale), params).await?;
        Ok(page.results)
    }

    fn get_cached_genres(&self, key: &str) -> Option<Vec<Genre>> {
        self.genre_cache
            .read()
            .ok()?
            .get(key)
            .filter(|e| e.is_valid())
            .map(|e| e.data.clone())
    }

    fn set_cached_genres(&self, key: String, data: Vec<Genre>) {
        if let Ok(mut cache) = self.genre_cache.write() {
            cache.insert(key, CacheEntry::new(data));
        }
    }
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn list_by_endpoint(
        &self,
        endpoint: &ListEndpoint,
        locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError> {
        self.fetch_page(endpoint.path, locale, &endpoint.params).await
    }

    async fn discover(
        &self,
        query: &DiscoverQuery,
        locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError> {
        self.fetch_page(&query.path(), locale, &query.params()).await
    }

    async fn item_detail(
        &self,
        id: &str,
        media_type: MediaType,
        locale: Option<&str>,
        includes: DetailIncludes,
    ) -> Result<RawCatalogItem, ApiError> {
        let params: Vec<(&str, String)> = includes
            .append_to_response()
            .map(|append| vec![("append_to_response", append)])
            .unwrap_or_default();
        self.fetch_json(&format!("/{}/{}", media_type.path(), id), locale, &params)
            .await
    }

    async fn translation(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<Option<Translation>, ApiError> {
        let response: TranslationsResponse = self
            .fetch_json(
                &format!("/{}/{}/translations", media_type.path(), id),
                None,
                &[],
            )
            .await?;
        Ok(select_translation(&response.translations, &self.language))
    }

    async fn videos(
        &self,
        id: &str,
        media_type: MediaType,
        locale: Option<&str>,
    ) -> Result<Vec<Video>, ApiError> {
        let response: VideosResponse = self
            .fetch_json(&format!("/{}/{}/videos", media_type.path(), id), locale, &[])
            .await?;
        Ok(response.results)
    }

    async fn credits(
        &self,
        id: &str,
        media_type: MediaType,
        locale: &str,
    ) -> Result<Vec<String>, ApiError> {
        let credits: CreditsResponse = self
            .fetch_json(
                &format!("/{}/{}/credits", media_type.path(), id),
                Some(locale),
                &[],
            )
            .await?;
        Ok(credits.cast.into_iter().map(|c| c.name).collect())
    }

    async fn watch_providers(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<WatchProviderRegions, ApiError> {
        let response: WatchProvidersResponse = self
            .fetch_json(
                &format!("/{}/{}/watch/providers", media_type.path(), id),
                None,
                &[],
            )
            .await?;
        Ok(response.results)
    }

    async fn search_multi(
        &self,
        query: &str,
        locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError> {
        let params = [
            ("query", query.to_string()),
            ("include_adult", String::from("false")),
        ];
        self.fetch_page("/search/multi", locale, &params).await
    }

    async fn search_person(&self, name: &str, locale: &str) -> Result<Vec<PersonHit>, ApiError> {
        let response: PersonSearchResponse = self
            .fetch_json("/search/person", Some(locale), &[("query", name.to_string())])
            .await?;
        Ok(response.results)
    }

    async fn genres(&self, media_type: MediaType, locale: &str) -> Result<Vec<Genre>, ApiError> {
        let cache_key = format!("{}_{}", media_type.path(), locale);
        if let Some(cached) = self.get_cached_genres(&cache_key) {
            return Ok(cached);
        }

        let response: GenreListResponse = self
            .fetch_json(&format!("/genre/{}/list", media_type.path()), Some(locale), &[])
            .await?;
        self.set_cached_genres(cache_key, response.genres.clone());
        Ok(response.genres)
    }
}

/// Picks the translation for `locale` (e.g. `pt-BR`): the language subtag
/// must match, and an entry for the same region wins over other regions.
pub fn select_translation(entries: &[TranslationEntry], locale: &str) -> Option<Translation> {
    let mut parts = locale.split(['-', '_']);
    let language = parts.next().unwrap_or_default();
    let region = parts.next().unwrap_or_default();

    let matches_language = |e: &&TranslationEntry| {
        e.iso_639_1.eq_ignore_ascii_case(language) || e.iso_639_1.eq_ignore_ascii_case(locale)
    };

    entries
        .iter()
        .filter(matches_language)
        .find(|e| !region.is_empty() && e.iso_3166_1.eq_ignore_ascii_case(region))
        .or_else(|| entries.iter().find(matches_language))
        .map(|e| e.data.clone())
}
