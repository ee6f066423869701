use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DOCUMENTARY_GENRE_ID: u64 = 99;
pub const ANIMATION_GENRE_ID: u64 = 16;

pub type MediaId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn path(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What a catalog item is, decided once by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Film,
    Series,
    Documentary,
}

impl ContentKind {
    /// Catalog path for an item whose source listing is unknown.
    /// Documentaries default to `/movie`, where the genre filter finds them.
    pub fn media_type(self) -> MediaType {
        match self {
            ContentKind::Series => MediaType::Tv,
            ContentKind::Film | ContentKind::Documentary => MediaType::Movie,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Film => write!(f, "Film"),
            ContentKind::Series => write!(f, "Series"),
            ContentKind::Documentary => write!(f, "Documentary"),
        }
    }
}

/// Grid category as offered by the filter menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Movie,
    Tv,
    Anime,
    Documentary,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Movie,
        Category::Tv,
        Category::Anime,
        Category::Documentary,
    ];

    /// The catalog section a category is served from.
    pub fn media_type(self) -> MediaType {
        match self {
            Category::Movie | Category::Documentary => MediaType::Movie,
            Category::Tv | Category::Anime => MediaType::Tv,
        }
    }

    /// Genre every discovery request for this category must carry.
    pub fn required_genre(self) -> Option<u64> {
        match self {
            Category::Anime => Some(ANIMATION_GENRE_ID),
            Category::Documentary => Some(DOCUMENTARY_GENRE_ID),
            Category::Movie | Category::Tv => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Movie => write!(f, "movie"),
            Category::Tv => write!(f, "tv"),
            Category::Anime => write!(f, "anime"),
            Category::Documentary => write!(f, "documentary"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(Category::Movie),
            "tv" | "series" => Ok(Category::Tv),
            "anime" => Ok(Category::Anime),
            "documentary" | "documentaries" => Ok(Category::Documentary),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreListResponse {
    pub genres: Vec<Genre>,
}

/// One catalog record exactly as the remote API returned it.
///
/// Nothing about its shape is trusted: every accessor checks presence and
/// JSON type, and `null` is treated the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCatalogItem(Map<String, Value>);

impl RawCatalogItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The value under `key`, or `None` when absent or `null`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// A non-empty string field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.field(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn id(&self) -> Option<MediaId> {
        self.field("id").and_then(parse_identifier)
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.text(key).and_then(parse_date)
    }

    /// The `media_type` tag carried by mixed listings such as multi search.
    pub fn media_type(&self) -> Option<MediaType> {
        match self.text("media_type")? {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }

    /// Genre ids from a listing (`genre_ids`) or from a detail payload
    /// (`genres[].id`).
    pub fn genre_ids(&self) -> Vec<u64> {
        if let Some(ids) = self.field("genre_ids").and_then(|v| v.as_array()) {
            return ids.iter().filter_map(|v| v.as_u64()).collect();
        }
        self.genres().into_iter().map(|g| g.id).collect()
    }

    pub fn genres(&self) -> Vec<Genre> {
        self.field("genres")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|g| {
                        Some(Genre {
                            id: g.get("id")?.as_u64()?,
                            name: g.get("name")?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn vote_average(&self) -> Option<f32> {
        self.field("vote_average")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
    }
}

impl From<Map<String, Value>> for RawCatalogItem {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Accepts non-negative integers and non-empty `[A-Za-z0-9_-]` strings.
pub fn parse_identifier(value: &Value) -> Option<MediaId> {
    match value {
        Value::Number(n) => n.as_u64().map(|id| id.to_string()),
        Value::String(s)
            if !s.is_empty()
                && s
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') =>
        {
            Some(s.clone())
        }
        _ => None,
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value.get(..10).unwrap_or(value), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub results: Vec<RawCatalogItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub title: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
}

impl Translation {
    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub fn overview(&self) -> Option<&str> {
        non_empty(self.overview.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationEntry {
    #[serde(default)]
    pub iso_639_1: String,
    #[serde(default)]
    pub iso_3166_1: String,
    #[serde(default)]
    pub data: Translation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationsResponse {
    #[serde(default)]
    pub translations: Vec<TranslationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub provider_name: String,
    #[serde(default)]
    pub provider_id: Option<u64>,
    #[serde(default)]
    pub logo_path: Option<String>,
}

/// Offers for one region, split by monetization tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchProviders {
    #[serde(default)]
    pub flatrate: Vec<Provider>,
    #[serde(default)]
    pub free: Vec<Provider>,
    #[serde(default)]
    pub ads: Vec<Provider>,
    #[serde(default)]
    pub rent: Vec<Provider>,
    #[serde(default)]
    pub buy: Vec<Provider>,
}

pub type WatchProviderRegions = HashMap<String, WatchProviders>;

#[derive(Debug, Clone, Deserialize)]
pub struct WatchProvidersResponse {
    #[serde(default)]
    pub results: WatchProviderRegions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditsResponse {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonHit {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonSearchResponse {
    #[serde(default)]
    pub results: Vec<PersonHit>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    #[serde(default)]
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestSeason {
    pub season_number: u32,
    pub air_date: NaiveDate,
}

/// Fields that only exist once a secondary fetch ran for the item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// `None` means the lookup ran and found nothing.
    pub trailer_key: Option<String>,
    pub cast: Vec<String>,
    pub streaming_platforms: BTreeSet<String>,
    pub latest_season: Option<LatestSeason>,
    pub has_new_episodes_this_year: bool,
    /// Every offer tier for the viewer's region, logos included.
    pub watch_providers: WatchProviders,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: MediaId,
    /// Catalog path the item was listed under; enrichment calls use it.
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub backdrop_path: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub kind: ContentKind,
    pub genre_ids: Vec<u64>,
    pub genres: Vec<Genre>,
    pub vote_average: Option<f32>,
    pub enrichment: Option<Enrichment>,
}

impl ContentItem {
    pub fn trailer_key(&self) -> Option<&str> {
        self.enrichment.as_ref()?.trailer_key.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("rate limit exceeded")]
    RateLimit,
    #[error("invalid API key")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
}
