//! Detail modal for an item picked from the grid, search or banner.

use std::sync::Arc;

use tracing::debug;

use crate::banner::BannerHandle;
use crate::catalog::{CatalogClient, Locale};
use crate::discovery::fetch_and_merge;
use crate::enrich::fetch_fallback_trailer_key;
use crate::media::{ContentItem, Enrichment};

/// Detail and translation first, then the trailer.
///
/// The detail call already carries videos in the viewer's language, so a
/// missing trailer is only looked up in the fallback language. When the
/// detail call fails the listing item comes back as-is, with no enrichment
/// and therefore no trailer.
pub async fn load_detail<C: CatalogClient + ?Sized>(
    client: &C,
    item: ContentItem,
    locale: &Locale,
) -> ContentItem {
    let mut item = fetch_and_merge(client, item, locale).await;
    let Some(enrichment) = item.enrichment.as_mut() else {
        return item;
    };
    if enrichment.trailer_key.is_none() {
        enrichment.trailer_key =
            fetch_fallback_trailer_key(client, &item.id, item.media_type, locale).await;
    }
    item
}

pub struct DetailModal<C: ?Sized> {
    client: Arc<C>,
    locale: Locale,
    banner: Option<BannerHandle>,
    selected: Option<ContentItem>,
}

impl<C: CatalogClient + ?Sized> DetailModal<C> {
    pub fn new(client: Arc<C>, locale: Locale) -> Self {
        Self {
            client,
            locale,
            banner: None,
            selected: None,
        }
    }

    /// Pauses `banner` for as long as the modal is open.
    pub fn with_banner(mut self, banner: BannerHandle) -> Self {
        self.banner = Some(banner);
        self
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&ContentItem> {
        self.selected.as_ref()
    }

    pub fn trailer_key(&self) -> Option<&str> {
        self.selected
            .as_ref()
            .and_then(|item| item.enrichment.as_ref())
            .and_then(|e: &Enrichment| e.trailer_key.as_deref())
    }

    pub async fn open(&mut self, item: ContentItem) -> &ContentItem {
        if let Some(banner) = &self.banner {
            banner.pause();
        }
        debug!(id = %item.id, media_type = %item.media_type, "opening detail");
        let loaded = load_detail(self.client.as_ref(), item, &self.locale).await;
        self.selected.insert(loaded)
    }

    pub fn close(&mut self) {
        self.selected = None;
        if let Some(banner) = &self.banner {
            banner.resume();
        }
    }
}
