//! Classification and normalization of raw catalog records.
//!
//! The banner accepts incomplete records and fills in defaults
//! ([`NormalizeMode::Lenient`]); the grid drops anything that does not pass
//! [`validate`] ([`NormalizeMode::Strict`]).

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::media::{
    ContentItem, ContentKind, Enrichment, LatestSeason, MediaType, RawCatalogItem, SeasonSummary,
    Translation, Video, WatchProviderRegions, WatchProviders, DOCUMENTARY_GENRE_ID,
};

pub const UNTITLED: &str = "Untitled";
pub const MAX_CAST: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    Lenient,
    Strict,
}

pub fn classify(item: &RawCatalogItem) -> ContentKind {
    if item.genre_ids().contains(&DOCUMENTARY_GENRE_ID) {
        ContentKind::Documentary
    } else if item.text("first_air_date").is_some() {
        ContentKind::Series
    } else {
        // Items carrying neither date are treated as films too.
        ContentKind::Film
    }
}

pub fn default_overview(kind: ContentKind, title: &str) -> String {
    match kind {
        ContentKind::Series => format!("New series: {}. More information soon.", title),
        ContentKind::Documentary => format!(
            "Documentary: {}. Explore this new documentary production.",
            title
        ),
        ContentKind::Film => format!("{}. More information soon.", title),
    }
}

/// The date used for temporal filtering.
pub fn effective_date(item: &RawCatalogItem, kind: ContentKind) -> Option<NaiveDate> {
    let (primary, secondary) = match kind {
        ContentKind::Series => ("first_air_date", "release_date"),
        ContentKind::Film | ContentKind::Documentary => ("release_date", "first_air_date"),
    };
    item.date(primary).or_else(|| item.date(secondary))
}

/// Grid admission check.
pub fn validate(item: &RawCatalogItem) -> bool {
    if item.id().is_none() {
        return false;
    }
    if item.text("title").is_none() && item.text("name").is_none() {
        return false;
    }
    if item.field("overview").is_some_and(|v| !v.is_string()) {
        return false;
    }
    if item.field("backdrop_path").is_some_and(|v| !v.is_string()) {
        return false;
    }
    true
}

/// Normalizes an item whose listing did not say where it came from. The
/// item's own `media_type` tag wins, then its classification.
pub fn normalize(item: &RawCatalogItem, mode: NormalizeMode) -> Option<ContentItem> {
    let source = item
        .media_type()
        .unwrap_or_else(|| classify(item).media_type());
    normalize_from(item, source, mode)
}

/// Normalizes an item listed under `source` (`/movie/*` or `/tv/*`).
pub fn normalize_from(
    item: &RawCatalogItem,
    source: MediaType,
    mode: NormalizeMode,
) -> Option<ContentItem> {
    if mode == NormalizeMode::Strict && !validate(item) {
        return None;
    }
    // Without an id nothing can be enriched or de-duplicated.
    let id = item.id()?;

    let kind = classify(item);
    let title = item
        .text("title")
        .or_else(|| item.text("name"))
        .unwrap_or(UNTITLED)
        .to_string();
    let overview = item
        .text("overview")
        .map(String::from)
        .unwrap_or_else(|| default_overview(kind, &title));

    Some(ContentItem {
        id,
        media_type: source,
        overview,
        backdrop_path: item.text("backdrop_path").map(String::from),
        poster_path: item.text("poster_path").map(String::from),
        release_date: effective_date(item, kind),
        kind,
        genre_ids: item.genre_ids(),
        genres: item.genres(),
        vote_average: item.vote_average(),
        enrichment: None,
        title,
    })
}

pub fn normalize_all(items: &[RawCatalogItem], mode: NormalizeMode) -> Vec<ContentItem> {
    items.iter().filter_map(|i| normalize(i, mode)).collect()
}

pub fn normalize_all_from(
    items: &[RawCatalogItem],
    source: MediaType,
    mode: NormalizeMode,
) -> Vec<ContentItem> {
    items
        .iter()
        .filter_map(|i| normalize_from(i, source, mode))
        .collect()
}

pub fn truncate_cast(names: Vec<String>) -> Vec<String> {
    names.into_iter().take(MAX_CAST).collect()
}

/// All offer tiers for `region`; empty when the region has none.
pub fn region_offers(mut regions: WatchProviderRegions, region: &str) -> WatchProviders {
    regions.remove(region).unwrap_or_default()
}

/// Provider names offered for free or by subscription.
pub fn streaming_platforms_for(providers: &WatchProviders) -> BTreeSet<String> {
    providers
        .flatrate
        .iter()
        .chain(&providers.free)
        .chain(&providers.ads)
        .map(|p| p.provider_name.clone())
        .collect()
}

pub fn select_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .find(|v| v.video_type == "Trailer" && v.site == "YouTube" && !v.key.is_empty())
}

/// Latest regular season with a known air date, and whether it aired in
/// `current_year`.
pub fn latest_season(seasons: &[SeasonSummary], current_year: i32) -> Option<(LatestSeason, bool)> {
    let latest = seasons
        .iter()
        .filter(|s| s.season_number > 0)
        .filter_map(|s| {
            let air_date = s.air_date.as_deref().and_then(crate::media::parse_date)?;
            Some(LatestSeason {
                season_number: s.season_number,
                air_date,
            })
        })
        .max_by_key(|s| s.air_date)?;
    Some((latest, latest.air_date.year() == current_year))
}

pub fn parse_seasons(item: &RawCatalogItem) -> Vec<SeasonSummary> {
    item.field("seasons")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| serde_json::from_value(s.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_cast(item: &RawCatalogItem) -> Vec<String> {
    item.field("credits")
        .and_then(|c| c.get("cast"))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|c| c.get("name")?.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_videos(item: &RawCatalogItem) -> Vec<Video> {
    item.field("videos")
        .and_then(|v| v.get("results"))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_watch_providers(item: &RawCatalogItem) -> WatchProviderRegions {
    item.field("watch/providers")
        .and_then(|v| v.get("results"))
        .cloned()
        .and_then(|v: Value| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Enrichment carried by a detail payload fetched with credits, videos and
/// watch providers appended.
pub fn detail_enrichment(detail: &RawCatalogItem, region: &str) -> Enrichment {
    let watch_providers = region_offers(parse_watch_providers(detail), region);
    Enrichment {
        trailer_key: select_trailer(&parse_videos(detail)).map(|v| v.key.clone()),
        cast: truncate_cast(parse_cast(detail)),
        streaming_platforms: streaming_platforms_for(&watch_providers),
        latest_season: None,
        has_new_episodes_this_year: false,
        watch_providers,
    }
}

/// Folds a detail payload and an optional translation onto a listing item.
///
/// Translated fields win over everything. Detail title and overview only
/// replace the listing's when a translation record exists, since the detail
/// call may come back in the catalog's default language.
pub fn merge_detail(
    item: &mut ContentItem,
    detail: Option<&RawCatalogItem>,
    translation: Option<&Translation>,
) {
    if let Some(translation) = translation {
        let detail_title = detail.and_then(|d| d.text("title").or_else(|| d.text("name")));
        if let Some(title) = translation
            .title()
            .or_else(|| translation.name())
            .or(detail_title)
        {
            item.title = title.to_string();
        }
        if let Some(overview) = translation
            .overview()
            .or_else(|| detail.and_then(|d| d.text("overview")))
        {
            item.overview = overview.to_string();
        }
    }

    let Some(detail) = detail else {
        return;
    };
    let genres = detail.genres();
    if !genres.is_empty() {
        item.genre_ids = genres.iter().map(|g| g.id).collect();
        item.genres = genres;
    }
    if item.backdrop_path.is_none() {
        item.backdrop_path = detail.text("backdrop_path").map(String::from);
    }
    if item.poster_path.is_none() {
        item.poster_path = detail.text("poster_path").map(String::from);
    }
    if let Some(vote) = detail.vote_average() {
        item.vote_average = Some(vote);
    }
}
