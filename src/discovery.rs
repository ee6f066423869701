//! Filterable content grid: one discover request, every item enriched.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogClient, DetailIncludes, DiscoverQuery, Locale};
use crate::media::{ApiError, Category, ContentItem, Genre, MediaType};
use crate::normalize::{detail_enrichment, merge_detail, normalize_all_from, NormalizeMode};

pub const REFRESH_ERROR: &str = "Error loading content. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoverFilters {
    pub genre: Option<u64>,
    pub year: Option<i32>,
}

/// Caller genre first, then the category's mandatory genre.
pub fn build_discover_query(category: Category, filters: DiscoverFilters) -> DiscoverQuery {
    let mut genres: Vec<u64> = filters.genre.into_iter().collect();
    if let Some(required) = category.required_genre() {
        if !genres.contains(&required) {
            genres.push(required);
        }
    }

    let mut query = DiscoverQuery::new(category.media_type());
    if !genres.is_empty() {
        let joined: Vec<String> = genres.iter().map(u64::to_string).collect();
        query.with_genres = Some(joined.join(","));
    }
    query.year = filters.year;
    query
}

/// Fetches detail and translation concurrently and folds them onto `item`.
///
/// A failed detail call leaves the item untouched; a failed translation
/// call only loses the translated fields.
pub async fn fetch_and_merge<C: CatalogClient + ?Sized>(
    client: &C,
    mut item: ContentItem,
    locale: &Locale,
) -> ContentItem {
    let media_type = item.media_type;
    let (detail, translation) = futures::join!(
        client.item_detail(
            &item.id,
            media_type,
            Some(&locale.language),
            DetailIncludes::ALL
        ),
        client.translation(&item.id, media_type),
    );

    let detail = match detail {
        Ok(detail) => detail,
        Err(e) => {
            warn!(id = %item.id, error = %e, "detail lookup failed");
            return item;
        }
    };
    let translation = translation.unwrap_or_else(|e| {
        warn!(id = %item.id, error = %e, "translation lookup failed");
        None
    });

    merge_detail(&mut item, Some(&detail), translation.as_ref());
    item.enrichment = Some(detail_enrichment(&detail, &locale.region));
    item
}

pub async fn aggregate<C: CatalogClient + ?Sized>(
    client: &C,
    category: Category,
    filters: DiscoverFilters,
    locale: &Locale,
) -> Result<Vec<ContentItem>, ApiError> {
    let query = build_discover_query(category, filters);
    debug!(%category, path = %query.path(), params = ?query.params(), "discover");
    let raw = client.discover(&query, &locale.language).await?;

    let items = normalize_all_from(&raw, category.media_type(), NormalizeMode::Strict);
    if items.len() < raw.len() {
        debug!(dropped = raw.len() - items.len(), "dropped invalid grid items");
    }

    let enriched = join_all(
        items
            .into_iter()
            .map(|item| fetch_and_merge(client, item, locale)),
    )
    .await;
    Ok(enriched)
}

pub async fn genres_for<C: CatalogClient + ?Sized>(
    client: &C,
    category: Category,
    locale: &Locale,
) -> Result<Vec<Genre>, ApiError> {
    client.genres(category.media_type(), &locale.language).await
}

/// Grid state for one viewer. Every filter change refreshes the content.
pub struct DiscoveryGrid<C: ?Sized> {
    client: Arc<C>,
    locale: Locale,
    category: Category,
    filters: DiscoverFilters,
    items: Vec<ContentItem>,
    genres: Vec<Genre>,
    loading: bool,
    error_message: Option<String>,
}

impl<C: CatalogClient + ?Sized> DiscoveryGrid<C> {
    pub fn new(client: Arc<C>, locale: Locale) -> Self {
        Self {
            client,
            locale,
            category: Category::default(),
            filters: DiscoverFilters::default(),
            items: Vec::new(),
            genres: Vec::new(),
            loading: false,
            error_message: None,
        }
    }

    /// Starting category and filters, without fetching anything.
    pub fn with_selection(mut self, category: Category, filters: DiscoverFilters) -> Self {
        self.category = category;
        self.filters = filters;
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn filters(&self) -> DiscoverFilters {
        self.filters
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Switches category, clearing genre and year, and reloads both the
    /// genre list and the grid.
    pub async fn set_category(&mut self, category: Category) -> Result<(), ApiError> {
        self.category = category;
        self.filters = DiscoverFilters::default();
        self.load_genres().await;
        self.refresh().await
    }

    pub async fn set_genre(&mut self, genre: Option<u64>) -> Result<(), ApiError> {
        self.filters.genre = genre;
        self.refresh().await
    }

    pub async fn set_year(&mut self, year: Option<i32>) -> Result<(), ApiError> {
        self.filters.year = year;
        self.refresh().await
    }

    pub async fn load_genres(&mut self) {
        match genres_for(self.client.as_ref(), self.category, &self.locale).await {
            Ok(genres) => self.genres = genres,
            Err(e) => warn!(category = %self.category, error = %e, "genre lookup failed"),
        }
    }

    /// Replaces the grid content. On failure the previous content stays and
    /// an error message is set.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        let result = aggregate(
            self.client.as_ref(),
            self.category,
            self.filters,
            &self.locale,
        )
        .await;
        self.loading = false;

        match result {
            Ok(items) => {
                info!(category = %self.category, count = items.len(), "grid refreshed");
                self.items = items;
                self.error_message = None;
                Ok(())
            }
            Err(e) => {
                warn!(category = %self.category, error = %e, "grid refresh failed");
                self.error_message = Some(REFRESH_ERROR.to_string());
                Err(e)
            }
        }
    }
}
