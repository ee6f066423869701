//! The seam between the pipelines and the remote media catalog.
//!
//! Pipelines only ever talk to a [`CatalogClient`]; the reqwest-backed
//! implementation lives in [`crate::tmdb`].

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::media::{
    ApiError, Genre, MediaType, PersonHit, RawCatalogItem, Translation, Video,
    WatchProviderRegions, DOCUMENTARY_GENRE_ID,
};
use crate::settings::AppSettings;

/// Viewer locale shared by every pipeline call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub language: String,
    pub fallback_language: String,
    pub region: String,
}

impl Locale {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            language: settings.language.clone(),
            fallback_language: settings.fallback_language.clone(),
            region: settings.region.clone(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::from_settings(&AppSettings::default())
    }
}

/// A fixed listing endpoint plus any query parameters it always carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEndpoint {
    pub path: &'static str,
    pub params: Vec<(&'static str, String)>,
}

impl ListEndpoint {
    pub fn new(path: &'static str) -> Self {
        Self {
            path,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// The kind of record the endpoint lists.
    pub fn media_type(&self) -> MediaType {
        if self.path.starts_with("/tv/") || self.path == "/discover/tv" {
            MediaType::Tv
        } else {
            MediaType::Movie
        }
    }

    pub fn upcoming_movies() -> Self {
        Self::new("/movie/upcoming")
    }

    pub fn tv_on_the_air() -> Self {
        Self::new("/tv/on_the_air")
    }

    pub fn tv_popular() -> Self {
        Self::new("/tv/popular")
    }

    pub fn documentaries() -> Self {
        Self::new("/discover/movie").with_param("with_genres", DOCUMENTARY_GENRE_ID.to_string())
    }
}

/// Parameters for `/discover/{movie,tv}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverQuery {
    pub media_type: MediaType,
    pub with_genres: Option<String>,
    pub year: Option<i32>,
    pub release_date_from: Option<NaiveDate>,
    pub release_date_to: Option<NaiveDate>,
    pub with_cast: Option<u64>,
}

impl DiscoverQuery {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            with_genres: None,
            year: None,
            release_date_from: None,
            release_date_to: None,
            with_cast: None,
        }
    }

    pub fn path(&self) -> String {
        format!("/discover/{}", self.media_type.path())
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(genres) = &self.with_genres {
            params.push(("with_genres", genres.clone()));
        }
        // The caller does not know which date field the listing uses.
        if let Some(year) = self.year {
            params.push(("primary_release_year", year.to_string()));
            params.push(("first_air_date_year", year.to_string()));
        }
        if let Some(from) = self.release_date_from {
            params.push(("primary_release_date.gte", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.release_date_to {
            params.push(("primary_release_date.lte", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(cast) = self.with_cast {
            params.push(("with_cast", cast.to_string()));
        }
        params
    }
}

/// Sub-resources appended to an item detail request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetailIncludes {
    pub credits: bool,
    pub videos: bool,
    pub watch_providers: bool,
}

impl DetailIncludes {
    pub const NONE: DetailIncludes = DetailIncludes {
        credits: false,
        videos: false,
        watch_providers: false,
    };

    pub const ALL: DetailIncludes = DetailIncludes {
        credits: true,
        videos: true,
        watch_providers: true,
    };

    pub fn append_to_response(&self) -> Option<String> {
        let parts: Vec<&str> = [
            (self.credits, "credits"),
            (self.videos, "videos"),
            (self.watch_providers, "watch/providers"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        (!parts.is_empty()).then(|| parts.join(","))
    }
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_by_endpoint(
        &self,
        endpoint: &ListEndpoint,
        locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError>;

    async fn discover(
        &self,
        query: &DiscoverQuery,
        locale: &str,
    ) -> Result<Vec<RawCatalogItem>, ApiError>;

    /// Full item detail. `locale == None` asks for the catalog default.
    async fn item_detail(
        &self,
        id: &str,
        media_type: MediaType,
        locale: Option<&str>,
        includes: DetailIncludes,
    ) -> Result<RawCatalogItem, ApiError>;

    /// The translation matching the client's configured locale, if any.
    async fn translation(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<Option<Translation>, ApiError>;

    async fn videos(
        &self,
        id: &str,
        media_type: MediaType,
        locale: Option<&str>,
    ) -> Result<Vec<Video>, ApiError>;

    /// Cast names in billing order.
    async fn credits(
        &self,
        id: &str,
        media_type: MediaType,
        locale: &str,
    ) -> Result<Vec<String>, ApiError>;

    async fn watch_providers(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<WatchProviderRegions, ApiError>;

    async fn search_multi(&self, query: &str, locale: &str)
        -> Result<Vec<RawCatalogItem>, ApiError>;

    async fn search_person(&self, name: &str, locale: &str) -> Result<Vec<PersonHit>, ApiError>;

    async fn genres(&self, media_type: MediaType, locale: &str) -> Result<Vec<Genre>, ApiError>;
}
