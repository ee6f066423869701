//! Secondary fetches that decorate a chosen item.
//!
//! Every helper here swallows its own failure: the item is still shown, just
//! without the missing decoration.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::catalog::{CatalogClient, DetailIncludes, Locale};
use crate::media::{ContentItem, ContentKind, Enrichment, LatestSeason, MediaType, WatchProviders};
use crate::normalize::{
    latest_season, parse_seasons, region_offers, select_trailer, streaming_platforms_for,
    truncate_cast,
};

/// First YouTube trailer in the viewer's language, retried once in the
/// fallback language when the first lookup comes back without one.
pub async fn fetch_trailer_key<C: CatalogClient + ?Sized>(
    client: &C,
    id: &str,
    media_type: MediaType,
    locale: &Locale,
) -> Option<String> {
    let primary = match client.videos(id, media_type, Some(&locale.language)).await {
        Ok(videos) => videos,
        Err(e) => {
            warn!(id, error = %e, "trailer lookup failed");
            return None;
        }
    };
    if let Some(trailer) = select_trailer(&primary) {
        return Some(trailer.key.clone());
    }
    fetch_fallback_trailer_key(client, id, media_type, locale).await
}

/// Trailer lookup in the fallback language only, for callers that already
/// searched the viewer's language.
pub async fn fetch_fallback_trailer_key<C: CatalogClient + ?Sized>(
    client: &C,
    id: &str,
    media_type: MediaType,
    locale: &Locale,
) -> Option<String> {
    if locale.fallback_language == locale.language {
        return None;
    }

    match client
        .videos(id, media_type, Some(&locale.fallback_language))
        .await
    {
        Ok(videos) => select_trailer(&videos).map(|v| v.key.clone()),
        Err(e) => {
            warn!(id, error = %e, "fallback trailer lookup failed");
            None
        }
    }
}

pub async fn fetch_cast<C: CatalogClient + ?Sized>(
    client: &C,
    id: &str,
    media_type: MediaType,
    locale: &Locale,
) -> Vec<String> {
    match client.credits(id, media_type, &locale.language).await {
        Ok(names) => truncate_cast(names),
        Err(e) => {
            warn!(id, error = %e, "credits lookup failed");
            Vec::new()
        }
    }
}

/// Every offer tier in the viewer's region.
pub async fn fetch_offers<C: CatalogClient + ?Sized>(
    client: &C,
    id: &str,
    media_type: MediaType,
    locale: &Locale,
) -> WatchProviders {
    match client.watch_providers(id, media_type).await {
        Ok(regions) => region_offers(regions, &locale.region),
        Err(e) => {
            warn!(id, error = %e, "watch provider lookup failed");
            WatchProviders::default()
        }
    }
}

pub async fn fetch_latest_season<C: CatalogClient + ?Sized>(
    client: &C,
    id: &str,
    locale: &Locale,
    today: NaiveDate,
) -> Option<(LatestSeason, bool)> {
    match client
        .item_detail(id, MediaType::Tv, Some(&locale.language), DetailIncludes::NONE)
        .await
    {
        Ok(detail) => latest_season(&parse_seasons(&detail), today.year()),
        Err(e) => {
            warn!(id, error = %e, "season lookup failed");
            None
        }
    }
}

/// Trailer, cast and providers concurrently; season data afterwards for
/// series only.
pub async fn enrich_item<C: CatalogClient + ?Sized>(
    client: &C,
    mut item: ContentItem,
    locale: &Locale,
    today: NaiveDate,
) -> ContentItem {
    let media_type = item.media_type;
    let (trailer_key, cast, watch_providers) = futures::join!(
        fetch_trailer_key(client, &item.id, media_type, locale),
        fetch_cast(client, &item.id, media_type, locale),
        fetch_offers(client, &item.id, media_type, locale),
    );

    let mut enrichment = Enrichment {
        trailer_key,
        cast,
        streaming_platforms: streaming_platforms_for(&watch_providers),
        watch_providers,
        ..Enrichment::default()
    };

    if item.kind == ContentKind::Series && media_type == MediaType::Tv {
        if let Some((season, new_this_year)) =
            fetch_latest_season(client, &item.id, locale, today).await
        {
            enrichment.latest_season = Some(season);
            enrichment.has_new_episodes_this_year = new_this_year;
        }
    }

    item.enrichment = Some(enrichment);
    item
}
